//! Lexer
//!
//! Second stage of the pipeline: classifies each raw token into a lexeme.
//!
//! Classification order per token (important for correctness):
//! 1. Exact lookup against the fixed keyword table
//! 2. The identifier pattern (letter or underscore, then letters, digits,
//!    underscores)
//! 3. The numeric value pattern (optional sign, optional integer/fraction,
//!    optional exponent)
//! 4. Everything else is `Lexeme::None`, which is not an error at lex time
//!
//! The keyword table is consulted first so that keywords never misclassify
//! as identifiers.
//!
//! After each source line's tokens, one synthetic `NewLine` token is
//! appended. Section and definition parsing lean on this sentinel for
//! comment skipping and implicit-default handling.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::tokenizing::TokenizedFile;

/// Lexical classification of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Lexeme {
    None,
    BeginMarker,
    EndMarker,
    Region,
    RegionType,
    TypeName,
    VarIdentifier,
    VarValue,
    Def,
    DefType,
    SingleComment,
    DoubleCommentBegin,
    DoubleCommentEnd,
    NewLine,
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lexeme::None => "NONE",
            Lexeme::BeginMarker => "BEGIN_MARKER",
            Lexeme::EndMarker => "END_MARKER",
            Lexeme::Region => "REGION",
            Lexeme::RegionType => "REGION_TYPE",
            Lexeme::TypeName => "TYPE_NAME",
            Lexeme::VarIdentifier => "VAR_IDENTIFIER",
            Lexeme::VarValue => "VAR_VALUE",
            Lexeme::Def => "DEF",
            Lexeme::DefType => "DEF_TYPE",
            Lexeme::SingleComment => "SINGLE_COMMENT",
            Lexeme::DoubleCommentBegin => "DOUBLE_COMMENT_BEGIN",
            Lexeme::DoubleCommentEnd => "DOUBLE_COMMENT_END",
            Lexeme::NewLine => "NEW_LINE",
        };
        f.write_str(name)
    }
}

/// A classified token with its raw text preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexedToken {
    pub lexeme: Lexeme,
    pub text: String,
}

/// Output of the lexer stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LexedFile {
    pub tokens: Vec<LexedToken>,
}

/// Keyword table. Region and definition keywords are closed sets; anything
/// outside this table falls through to the identifier/value patterns.
static KEYWORDS: Lazy<HashMap<&'static str, Lexeme>> = Lazy::new(|| {
    HashMap::from([
        ("begin", Lexeme::BeginMarker),
        ("end", Lexeme::EndMarker),
        ("filetype", Lexeme::Region),
        ("section", Lexeme::Region),
        ("build", Lexeme::RegionType),
        ("run", Lexeme::RegionType),
        ("connectivity", Lexeme::RegionType),
        ("activity", Lexeme::RegionType),
        ("trial_def", Lexeme::RegionType),
        ("mf_input", Lexeme::RegionType),
        ("trial_spec", Lexeme::RegionType),
        ("int", Lexeme::TypeName),
        ("float", Lexeme::TypeName),
        ("def", Lexeme::Def),
        ("trial", Lexeme::DefType),
        ("block", Lexeme::DefType),
        ("session", Lexeme::DefType),
        ("experiment", Lexeme::DefType),
        ("//", Lexeme::SingleComment),
        ("/*", Lexeme::DoubleCommentBegin),
        ("*/", Lexeme::DoubleCommentEnd),
    ])
});

// Classification is whole-token, hence the anchors.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]*[.])?[0-9]*([e][+-]?[0-9]+)?$").unwrap());

/// Classify one raw token.
pub fn classify(raw: &str) -> Lexeme {
    if let Some(lexeme) = KEYWORDS.get(raw) {
        return *lexeme;
    }
    if IDENTIFIER.is_match(raw) {
        Lexeme::VarIdentifier
    } else if VALUE.is_match(raw) {
        Lexeme::VarValue
    } else {
        Lexeme::None
    }
}

/// Lex a tokenized file, appending one `NewLine` sentinel per source line.
pub fn lex(t_file: &TokenizedFile) -> LexedFile {
    let mut tokens = Vec::new();
    for line in &t_file.lines {
        for raw in line {
            tokens.push(LexedToken {
                lexeme: classify(raw),
                text: raw.clone(),
            });
        }
        tokens.push(LexedToken {
            lexeme: Lexeme::NewLine,
            text: "\n".to_string(),
        });
    }
    tracing::trace!(tokens = tokens.len(), "lexed file");
    LexedFile { tokens }
}

impl fmt::Display for LexedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for token in &self.tokens {
            writeln!(f, "['{}', '{}'],", token.lexeme, token.text.escape_default())?;
        }
        writeln!(f, "]")
    }
}
