//! Tokenizer
//!
//! First stage of the pipeline: splits raw file text into lines of
//! whitespace-delimited string tokens. Blank lines are dropped entirely, so
//! later stages only ever see lines carrying at least one token. This stage
//! performs the only I/O in the crate.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// One source line as an ordered sequence of whitespace-delimited tokens.
pub type RawLine = Vec<String>;

/// Output of the tokenizer stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenizedFile {
    pub lines: Vec<RawLine>,
}

/// Read a file and tokenize its contents.
pub fn tokenize_file(path: impl AsRef<Path>) -> io::Result<TokenizedFile> {
    let source = fs::read_to_string(path.as_ref())?;
    Ok(tokenize_source(&source))
}

/// Split source text into tokenized lines. Blank lines produce no entry.
pub fn tokenize_source(source: &str) -> TokenizedFile {
    let mut lines = Vec::new();
    for line in source.lines() {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            continue;
        }
        lines.push(tokens);
    }
    tracing::trace!(lines = lines.len(), "tokenized source");
    TokenizedFile { lines }
}

impl fmt::Display for TokenizedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for line in &self.lines {
            for token in line {
                writeln!(f, "['{token}'],")?;
            }
        }
        writeln!(f, "]")
    }
}
