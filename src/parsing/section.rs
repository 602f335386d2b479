//! Variable-section parsing.
//!
//! A leaf region body is a flat sequence of `<type> <identifier> <value>`
//! declarations, matched with a fixed three-token lookahead.

use crate::document::{Variable, VariableSection};
use crate::lexing::Lexeme;

use super::cursor::TokenCursor;
use super::Diagnostic;

/// Parse the body of a leaf region into a `VariableSection`.
///
/// On entry the cursor sits on the first token after the region header; on
/// exit it sits just past the region's `end` marker. A later declaration of
/// the same identifier overwrites the earlier one.
pub(crate) fn parse_var_section(
    cursor: &mut TokenCursor<'_>,
    region_type: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> VariableSection {
    let mut section = VariableSection::default();
    while let Some(token) = cursor.current() {
        match token.lexeme {
            Lexeme::EndMarker => {
                cursor.bump();
                return section;
            }
            Lexeme::TypeName => match (cursor.peek(1), cursor.peek(2)) {
                (Some(ident), Some(value))
                    if ident.lexeme == Lexeme::VarIdentifier
                        && value.lexeme == Lexeme::VarValue =>
                {
                    section.params.insert(
                        ident.text.clone(),
                        Variable {
                            type_name: token.text.clone(),
                            identifier: ident.text.clone(),
                            value: value.text.clone(),
                        },
                    );
                    cursor.advance(3);
                }
                _ => {
                    diagnostics.push(Diagnostic::IncompleteDeclaration {
                        region: region_type.to_string(),
                        type_name: token.text.clone(),
                    });
                    cursor.bump();
                }
            },
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
    section
}
