//! # exptfile
//!
//! A parser for cerebellar simulation experiment and build files.
//!
//! The crate is a staged pipeline:
//!
//! 1. [`tokenizing`] splits raw file text into lines of whitespace-delimited
//!    tokens, dropping blank lines
//! 2. [`lexing`] classifies each token against a fixed keyword table, falling
//!    back to identifier/value patterns, and appends one `NewLine` sentinel
//!    per line
//! 3. [`parsing`] runs recursive descent over
//!    `begin <region> <region-type> ... end` blocks to build an experiment or
//!    build document
//! 4. [`resolve`] expands the trial/block/session/experiment hierarchy into a
//!    flat per-trial table for the simulation engine
//!
//! Data flows strictly forward; each stage owns its output until it hands it
//! to the next.
//!
//! Document grammar (whitespace-delimited, case-sensitive keywords, `//` and
//! `/* ... */` comments):
//!
//! ```text
//! begin filetype run
//!     begin section mf_input
//!         int rate 40
//!     end
//!     begin section trial_def
//!         def trial t1
//!             int use_cs 1
//!             int cs_onset 400
//!             ...
//!         end
//!         def block acquisition
//!             t1 10
//!         end
//!         def experiment
//!             acquisition 5
//!         end
//!     end
//! end
//! ```
//!
//! Build files open with `begin filetype build` and hold `connectivity` and
//! `activity` sections instead of a trial hierarchy.

pub mod document;
pub mod lexing;
pub mod parsing;
pub mod resolve;
pub mod tokenizing;

pub use document::{
    BuildDocument, ExperimentDocument, Pair, TrialHierarchy, TrialParams, Variable,
    VariableSection,
};
pub use lexing::{classify, lex, LexedFile, LexedToken, Lexeme};
pub use parsing::{Diagnostic, FormatError, ParseError};
pub use resolve::{calculate_num_trials, expand_trials, resolve_trials, ResolveError, TrialTable};
pub use tokenizing::{tokenize_file, tokenize_source, RawLine, TokenizedFile};

use std::path::Path;

/// Parse an experiment (`filetype run`) file from disk.
///
/// Returns the document together with any recoverable grammar violations;
/// unreadable files and wrong-filetype headers fail with `ParseError`.
pub fn parse_experiment_file(
    path: impl AsRef<Path>,
) -> Result<(ExperimentDocument, Vec<Diagnostic>), ParseError> {
    tracing::debug!(path = %path.as_ref().display(), "parsing experiment file");
    let tokenized = tokenize_file(path)?;
    parsing::parse_experiment(&lex(&tokenized))
}

/// Parse an experiment document from already-loaded source text.
pub fn parse_experiment_source(
    source: &str,
) -> Result<(ExperimentDocument, Vec<Diagnostic>), ParseError> {
    parsing::parse_experiment(&lex(&tokenize_source(source)))
}

/// Parse a build (`filetype build`) file from disk.
pub fn parse_build_file(
    path: impl AsRef<Path>,
) -> Result<(BuildDocument, Vec<Diagnostic>), ParseError> {
    tracing::debug!(path = %path.as_ref().display(), "parsing build file");
    let tokenized = tokenize_file(path)?;
    parsing::parse_build(&lex(&tokenized))
}

/// Parse a build document from already-loaded source text.
pub fn parse_build_source(source: &str) -> Result<(BuildDocument, Vec<Diagnostic>), ParseError> {
    parsing::parse_build(&lex(&tokenize_source(source)))
}
