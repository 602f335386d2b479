//! Document-level parsing: the `filetype` header check and region dispatch.

use crate::document::{BuildDocument, ExperimentDocument, TrialHierarchy, VariableSection};
use crate::lexing::{LexedFile, Lexeme};

use std::collections::HashMap;

use super::cursor::TokenCursor;
use super::definition::parse_trial_section;
use super::section::parse_var_section;
use super::{Diagnostic, FormatError, ParseError};

/// The closed set of region types the dispatcher understands. Anything
/// else is a container and is scanned recursively for nested regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionKind {
    MfInput,
    Activity,
    TrialSpec,
    TrialDef,
    Connectivity,
    Container,
}

impl RegionKind {
    fn classify(raw: &str) -> Self {
        match raw {
            "mf_input" => RegionKind::MfInput,
            "activity" => RegionKind::Activity,
            "trial_spec" => RegionKind::TrialSpec,
            "trial_def" => RegionKind::TrialDef,
            "connectivity" => RegionKind::Connectivity,
            _ => RegionKind::Container,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Experiment,
    Build,
}

impl DocumentKind {
    fn filetype(self) -> &'static str {
        match self {
            DocumentKind::Experiment => "run",
            DocumentKind::Build => "build",
        }
    }
}

/// Parse a lexed experiment file. Returns the document together with the
/// grammar violations found along the way.
pub fn parse_experiment(
    l_file: &LexedFile,
) -> Result<(ExperimentDocument, Vec<Diagnostic>), ParseError> {
    let (builder, diagnostics) = parse_document(l_file, DocumentKind::Experiment)?;
    Ok((
        ExperimentDocument {
            sections: builder.sections,
            trial_info: builder.trial_info,
        },
        diagnostics,
    ))
}

/// Parse a lexed build file. Returns the document together with the grammar
/// violations found along the way.
pub fn parse_build(l_file: &LexedFile) -> Result<(BuildDocument, Vec<Diagnostic>), ParseError> {
    let (builder, diagnostics) = parse_document(l_file, DocumentKind::Build)?;
    Ok((
        BuildDocument {
            sections: builder.sections,
        },
        diagnostics,
    ))
}

struct DocumentBuilder {
    kind: DocumentKind,
    sections: HashMap<String, VariableSection>,
    trial_info: TrialHierarchy,
}

fn parse_document(
    l_file: &LexedFile,
    kind: DocumentKind,
) -> Result<(DocumentBuilder, Vec<Diagnostic>), ParseError> {
    let mut cursor = TokenCursor::new(l_file);

    // scan to the first `begin`; only comments and line breaks may precede it
    loop {
        match cursor.current() {
            None => return Err(FormatError::MissingFiletypeHeader.into()),
            Some(token) => match token.lexeme {
                Lexeme::BeginMarker => break,
                Lexeme::SingleComment => cursor.skip_line_comment(),
                Lexeme::DoubleCommentBegin => cursor.skip_block_comment(),
                Lexeme::NewLine => cursor.bump(),
                _ => {
                    return Err(FormatError::StrayToken {
                        text: token.text.clone(),
                    }
                    .into())
                }
            },
        }
    }

    // the first region must be `filetype` naming the expected document kind
    let region = cursor
        .peek(1)
        .filter(|t| t.lexeme == Lexeme::Region)
        .ok_or(FormatError::MissingFiletypeHeader)?;
    if region.text != "filetype" {
        return Err(FormatError::MissingFiletypeHeader.into());
    }
    let region_type = cursor
        .peek(2)
        .ok_or(FormatError::MissingFiletypeHeader)?;
    if region_type.text != kind.filetype() {
        return Err(FormatError::WrongFiletype {
            expected: kind.filetype(),
            found: region_type.text.clone(),
        }
        .into());
    }
    let filetype = region_type.text.clone();
    cursor.advance(3);

    tracing::debug!(filetype = %filetype, "parsing document body");

    let mut builder = DocumentBuilder {
        kind,
        sections: HashMap::new(),
        trial_info: TrialHierarchy::default(),
    };
    let mut diagnostics = Vec::new();
    builder.parse_region(&mut cursor, &filetype, &mut diagnostics);
    Ok((builder, diagnostics))
}

impl DocumentBuilder {
    /// Parse one region body, dispatching on its type. On entry the cursor
    /// sits on the first token after the region header; on exit it sits
    /// just past the matching `end`.
    fn parse_region(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        region_type: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let leaf = match (self.kind, RegionKind::classify(region_type)) {
            (
                DocumentKind::Experiment,
                RegionKind::MfInput | RegionKind::Activity | RegionKind::TrialSpec,
            ) => true,
            (DocumentKind::Experiment, RegionKind::TrialDef) => {
                parse_trial_section(cursor, &mut self.trial_info, diagnostics);
                return;
            }
            (DocumentKind::Build, RegionKind::Connectivity | RegionKind::Activity) => true,
            _ => false,
        };
        if leaf {
            let section = parse_var_section(cursor, region_type, diagnostics);
            self.sections.insert(region_type.to_string(), section);
        } else {
            self.parse_container(cursor, region_type, diagnostics);
        }
    }

    /// Scan a container region for nested `begin <region> <region-type>`
    /// headers, recursing into each.
    fn parse_container(
        &mut self,
        cursor: &mut TokenCursor<'_>,
        region_type: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        while let Some(token) = cursor.current() {
            match token.lexeme {
                Lexeme::EndMarker => {
                    cursor.bump();
                    return;
                }
                Lexeme::BeginMarker => {
                    let header = (cursor.peek(1), cursor.peek(2));
                    match header {
                        (Some(region), Some(inner_type))
                            if region.lexeme == Lexeme::Region
                                && inner_type.lexeme == Lexeme::RegionType =>
                        {
                            let inner_type = inner_type.text.clone();
                            cursor.advance(3);
                            self.parse_region(cursor, &inner_type, diagnostics);
                        }
                        _ => {
                            diagnostics.push(Diagnostic::MalformedRegionHeader {
                                found: cursor
                                    .peek(1)
                                    .map_or_else(String::new, |t| t.text.clone()),
                            });
                            cursor.bump();
                        }
                    }
                }
                Lexeme::SingleComment => cursor.skip_line_comment(),
                Lexeme::DoubleCommentBegin => cursor.skip_block_comment(),
                Lexeme::None => {
                    diagnostics.push(Diagnostic::UnknownToken {
                        context: region_type.to_string(),
                        text: token.text.clone(),
                    });
                    cursor.bump();
                }
                _ => cursor.bump(),
            }
        }
        diagnostics.push(Diagnostic::UnexpectedEof {
            context: region_type.to_string(),
        });
    }
}
