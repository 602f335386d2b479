//! Definition parsing for `def <kind> <label>` blocks.
//!
//! Trial definitions hold `type ident value` triples. Block, session, and
//! experiment definitions hold `<label> [<count>]` pairs where a missing
//! count means 1: an identifier followed by another identifier (or by the
//! closing `end`) closes the pending pair with the default count. The
//! pending pair is parser-local state; the token stream itself is never
//! touched.

use std::mem;

use crate::document::{Pair, TrialHierarchy, TrialParams, Variable};
use crate::lexing::Lexeme;

use super::cursor::TokenCursor;
use super::Diagnostic;

/// The closed set of definition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefKind {
    Trial,
    Block,
    Session,
    Experiment,
}

impl DefKind {
    pub fn from_keyword(raw: &str) -> Option<Self> {
        match raw {
            "trial" => Some(DefKind::Trial),
            "block" => Some(DefKind::Block),
            "session" => Some(DefKind::Session),
            "experiment" => Some(DefKind::Experiment),
            _ => None,
        }
    }
}

/// Parse a `trial_def` region body: a sequence of `def` blocks.
///
/// On entry the cursor sits on the first token after the region header; on
/// exit it sits just past the region's `end` marker.
pub(crate) fn parse_trial_section(
    cursor: &mut TokenCursor<'_>,
    hierarchy: &mut TrialHierarchy,
    diagnostics: &mut Vec<Diagnostic>,
) {
    while let Some(token) = cursor.current() {
        match token.lexeme {
            Lexeme::EndMarker => {
                cursor.bump();
                return;
            }
            Lexeme::Def => {
                let kind = cursor
                    .peek(1)
                    .filter(|t| t.lexeme == Lexeme::DefType)
                    .and_then(|t| DefKind::from_keyword(&t.text));
                match kind {
                    // the experiment definition is the hierarchy root and
                    // carries no label; its body starts right after the kind
                    Some(DefKind::Experiment) => {
                        cursor.advance(2);
                        parse_def(cursor, DefKind::Experiment, "experiment", hierarchy, diagnostics);
                    }
                    Some(kind) => match cursor.peek(2) {
                        Some(label) if label.lexeme == Lexeme::VarIdentifier => {
                            let label = label.text.clone();
                            cursor.advance(3);
                            parse_def(cursor, kind, &label, hierarchy, diagnostics);
                        }
                        _ => {
                            diagnostics.push(Diagnostic::MalformedDefHeader {
                                found: token.text.clone(),
                            });
                            cursor.bump();
                        }
                    },
                    None => {
                        diagnostics.push(Diagnostic::MalformedDefHeader {
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
                    context: "trial_def".to_string(),
                    text: token.text.clone(),
                });
                cursor.bump();
            }
            _ => cursor.bump(),
        }
    }
    diagnostics.push(Diagnostic::UnexpectedEof {
        context: "trial_def".to_string(),
    });
}

/// Parse one definition body and insert it into the hierarchy.
///
/// On entry the cursor sits on the first token after the definition header;
/// on exit it sits just past the definition's `end` marker.
fn parse_def(
    cursor: &mut TokenCursor<'_>,
    kind: DefKind,
    label: &str,
    hierarchy: &mut TrialHierarchy,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut trial_params = TrialParams::new();
    let mut pairs: Vec<Pair> = Vec::new();
    // identifier still waiting for its count
    let mut pending_label: Option<String> = None;
    // type/identifier of the declaration being assembled (trial kind)
    let mut pending_var = Variable::default();
    let mut prev = Lexeme::None;
    let mut closed = false;

    while let Some(token) = cursor.current() {
        match token.lexeme {
            Lexeme::EndMarker => {
                cursor.bump();
                closed = true;
                break;
            }
            Lexeme::TypeName => {
                if kind == DefKind::Trial {
                    pending_var.type_name = token.text.clone();
                } else {
                    diagnostics.push(Diagnostic::TypeNameOutsideTrial {
                        def_label: label.to_string(),
                        type_name: token.text.clone(),
                    });
                }
                prev = token.lexeme;
                cursor.bump();
            }
            Lexeme::VarIdentifier => {
                if kind == DefKind::Trial {
                    if prev == Lexeme::TypeName {
                        pending_var.identifier = token.text.clone();
                    } else {
                        diagnostics.push(Diagnostic::MisplacedIdentifier {
                            def_label: label.to_string(),
                            identifier: token.text.clone(),
                        });
                    }
                } else {
                    if let Some(previous) = pending_label.take() {
                        pairs.push(Pair::new(previous, "1"));
                    }
                    pending_label = Some(token.text.clone());
                }
                prev = token.lexeme;
                cursor.bump();
            }
            Lexeme::VarValue => {
                if prev != Lexeme::VarIdentifier && prev != Lexeme::NewLine {
                    diagnostics.push(Diagnostic::OrphanValue {
                        context: label.to_string(),
                        value: token.text.clone(),
                    });
                } else if kind == DefKind::Trial {
                    if pending_var.identifier.is_empty() {
                        diagnostics.push(Diagnostic::OrphanValue {
                            context: label.to_string(),
                            value: token.text.clone(),
                        });
                    } else {
                        pending_var.value = token.text.clone();
                        trial_params
                            .insert(pending_var.identifier.clone(), mem::take(&mut pending_var));
                    }
                } else if let Some(pair_label) = pending_label.take() {
                    pairs.push(Pair::new(pair_label, token.text.clone()));
                } else {
                    diagnostics.push(Diagnostic::OrphanValue {
                        context: label.to_string(),
                        value: token.text.clone(),
                    });
                }
                prev = token.lexeme;
                cursor.bump();
            }
            Lexeme::SingleComment => cursor.skip_line_comment(),
            // block comments are transparent: they do not count as the
            // preceding token for the pair/triple patterns
            Lexeme::DoubleCommentBegin => cursor.skip_block_comment(),
            Lexeme::None => {
                diagnostics.push(Diagnostic::UnknownToken {
                    context: label.to_string(),
                    text: token.text.clone(),
                });
                cursor.bump();
            }
            _ => {
                prev = token.lexeme;
                cursor.bump();
            }
        }
    }
    if !closed {
        diagnostics.push(Diagnostic::UnexpectedEof {
            context: label.to_string(),
        });
    }
    // a final identifier with no count gets the default before close-out
    if let Some(previous) = pending_label.take() {
        pairs.push(Pair::new(previous, "1"));
    }

    match kind {
        DefKind::Trial => {
            hierarchy.trial_map.insert(label.to_string(), trial_params);
        }
        DefKind::Block => {
            hierarchy.block_map.insert(label.to_string(), pairs);
        }
        DefKind::Session => {
            hierarchy.session_map.insert(label.to_string(), pairs);
        }
        DefKind::Experiment => {
            hierarchy.experiment.extend(pairs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::lex;
    use crate::tokenizing::tokenize_source;

    fn parse(source: &str) -> (TrialHierarchy, Vec<Diagnostic>) {
        let lexed = lex(&tokenize_source(source));
        let mut cursor = TokenCursor::new(&lexed);
        let mut hierarchy = TrialHierarchy::default();
        let mut diagnostics = Vec::new();
        parse_trial_section(&mut cursor, &mut hierarchy, &mut diagnostics);
        (hierarchy, diagnostics)
    }

    #[test]
    fn test_trial_definition() {
        let (hierarchy, diagnostics) = parse(
            "def trial t1\n\
             int use_cs 1\n\
             int cs_onset 400\n\
             float cs_percent 100.0\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        let params = &hierarchy.trial_map["t1"];
        assert_eq!(params.len(), 3);
        assert_eq!(params["use_cs"].value, "1");
        assert_eq!(params["cs_onset"].value, "400");
        assert_eq!(params["cs_percent"].type_name, "float");
    }

    #[test]
    fn test_block_with_counts() {
        let (hierarchy, diagnostics) = parse(
            "def block acquisition\n\
             t1 10\n\
             t2 2\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            hierarchy.block_map["acquisition"],
            vec![Pair::new("t1", "10"), Pair::new("t2", "2")]
        );
    }

    #[test]
    fn test_missing_count_defaults_to_one() {
        // t1 has no count: the following identifier closes it with "1"
        let (hierarchy, diagnostics) = parse(
            "def block mixed\n\
             t1\n\
             t2 3\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            hierarchy.block_map["mixed"],
            vec![Pair::new("t1", "1"), Pair::new("t2", "3")]
        );
    }

    #[test]
    fn test_trailing_identifier_defaults_before_end() {
        let (hierarchy, diagnostics) = parse(
            "def session s1\n\
             blk 4\n\
             cooldown\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            hierarchy.session_map["s1"],
            vec![Pair::new("blk", "4"), Pair::new("cooldown", "1")]
        );
    }

    #[test]
    fn test_experiment_definition_has_no_label() {
        let (hierarchy, diagnostics) = parse(
            "def experiment\n\
             s1 2\n\
             probe\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            hierarchy.experiment,
            vec![Pair::new("s1", "2"), Pair::new("probe", "1")]
        );
    }

    #[test]
    fn test_inline_experiment_definition() {
        let (hierarchy, diagnostics) = parse("def experiment t1 5 end\nend");
        assert!(diagnostics.is_empty());
        assert_eq!(hierarchy.experiment, vec![Pair::new("t1", "5")]);
    }

    #[test]
    fn test_type_name_outside_trial_is_reported() {
        let (hierarchy, diagnostics) = parse(
            "def block b1\n\
             int t1 2\n\
             end\n\
             end",
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::TypeNameOutsideTrial {
                def_label: "b1".to_string(),
                type_name: "int".to_string(),
            }]
        );
        assert_eq!(hierarchy.block_map["b1"], vec![Pair::new("t1", "2")]);
    }

    #[test]
    fn test_orphan_value_is_reported() {
        let (hierarchy, diagnostics) = parse(
            "def block b1\n\
             t1 2 7\n\
             end\n\
             end",
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::OrphanValue {
                context: "b1".to_string(),
                value: "7".to_string(),
            }]
        );
        assert_eq!(hierarchy.block_map["b1"], vec![Pair::new("t1", "2")]);
    }

    #[test]
    fn test_comment_inside_definition() {
        let (hierarchy, diagnostics) = parse(
            "def trial t1\n\
             int use_cs 1 // conditioned stimulus on\n\
             int use_us 0\n\
             end\n\
             end",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(hierarchy.trial_map["t1"].len(), 2);
    }

    #[test]
    fn test_identifier_without_type_in_trial() {
        let (hierarchy, diagnostics) = parse(
            "def trial t1\n\
             use_cs 1\n\
             end\n\
             end",
        );
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::MisplacedIdentifier {
                    def_label: "t1".to_string(),
                    identifier: "use_cs".to_string(),
                },
                Diagnostic::OrphanValue {
                    context: "t1".to_string(),
                    value: "1".to_string(),
                },
            ]
        );
        assert!(hierarchy.trial_map["t1"].is_empty());
    }
}
