//! Forward-only token cursor with fixed lookahead.

use crate::lexing::{LexedFile, LexedToken, Lexeme};

pub(crate) struct TokenCursor<'a> {
    tokens: &'a [LexedToken],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(file: &'a LexedFile) -> Self {
        Self {
            tokens: &file.tokens,
            pos: 0,
        }
    }

    pub fn current(&self) -> Option<&'a LexedToken> {
        self.tokens.get(self.pos)
    }

    pub fn peek(&self, n: usize) -> Option<&'a LexedToken> {
        self.tokens.get(self.pos + n)
    }

    pub fn bump(&mut self) {
        self.pos += 1;
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Advance to the current line's `NewLine` sentinel, leaving the cursor
    /// on it.
    pub fn skip_line_comment(&mut self) {
        while let Some(token) = self.current() {
            if token.lexeme == Lexeme::NewLine {
                break;
            }
            self.pos += 1;
        }
    }

    /// Advance past the closing `*/` marker. An unterminated block comment
    /// consumes the rest of the stream.
    pub fn skip_block_comment(&mut self) {
        while let Some(token) = self.current() {
            self.pos += 1;
            if token.lexeme == Lexeme::DoubleCommentEnd {
                break;
            }
        }
    }
}
