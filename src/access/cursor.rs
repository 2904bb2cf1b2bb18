//! Position-tracked character buffer
//!
//! [`EncodedAcl`] is the cursor every decoder reads through and every encoder
//! writes into. Strings are length prefixed so the format needs no schema:
//!
//! ```text
//! N                 absent string
//! 0<len> <chars>    present string, <len> decimal, counted in chars
//! ```

use crate::error::{AccessError, AccessResult, ErrorContext};
use std::fmt;

/// Marker for an absent string
pub const NULL_MARKER: char = 'N';

/// Marker for a length prefixed string
pub const STRING_MARKER: char = '0';

/// Separator between the length and the raw characters
pub const LENGTH_SEPARATOR: char = ' ';

/// Characters shown either side of the cursor in diagnostics
const CONTEXT_WIDTH: usize = 8;

/// Character buffer with a read position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedAcl {
    chars: Vec<char>,
    pos: usize,
}

impl EncodedAcl {
    /// Create an empty buffer for encoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer positioned at the start of `chars`
    pub fn from_chars(chars: &[char]) -> Self {
        Self {
            chars: chars.to_vec(),
            pos: 0,
        }
    }

    /// Append one character
    pub fn add_char(&mut self, c: char) {
        self.chars.push(c);
    }

    /// Read the current character and advance
    pub fn get_char(&mut self) -> AccessResult<char> {
        match self.chars.get(self.pos) {
            Some(&c) => {
                self.pos += 1;
                Ok(c)
            }
            None => Err(AccessError::Truncated {
                context: self.error_info(),
            }),
        }
    }

    /// Look at the current character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Step the read position back by one
    pub fn back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Number of unread characters
    pub fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the read position back to the start
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Total number of characters held
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Append an optional string in length prefixed form
    pub fn encode_string(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            self.add_char(NULL_MARKER);
            return;
        };

        self.add_char(STRING_MARKER);
        self.chars.extend(value.chars().count().to_string().chars());
        self.add_char(LENGTH_SEPARATOR);
        self.chars.extend(value.chars());
    }

    /// Read a string written by [`encode_string`](Self::encode_string)
    pub fn decode_string(&mut self) -> AccessResult<Option<String>> {
        let marker = self
            .get_char()
            .map_err(|_| AccessError::malformed("expected string marker", self.error_info()))?;

        if marker == NULL_MARKER {
            return Ok(None);
        }

        if marker != STRING_MARKER {
            return Err(AccessError::malformed(
                format!("bad string marker '{}'", marker),
                self.error_info(),
            ));
        }

        let mut len: usize = 0;
        let mut digits = 0;
        loop {
            let c = self.get_char().map_err(|_| {
                AccessError::malformed("missing separator after string length", self.error_info())
            })?;

            if c == LENGTH_SEPARATOR {
                break;
            }

            let Some(digit) = c.to_digit(10) else {
                return Err(AccessError::malformed(
                    format!("bad character '{}' in string length", c),
                    self.error_info(),
                ));
            };

            len = len
                .checked_mul(10)
                .and_then(|l| l.checked_add(digit as usize))
                .ok_or_else(|| AccessError::malformed("string length overflow", self.error_info()))?;
            digits += 1;
        }

        if digits == 0 {
            return Err(AccessError::malformed(
                "missing string length",
                self.error_info(),
            ));
        }

        if self.remaining() < len {
            return Err(AccessError::malformed(
                format!(
                    "string length {} exceeds {} remaining characters",
                    len,
                    self.remaining()
                ),
                self.error_info(),
            ));
        }

        let value: String = self.chars[self.pos..self.pos + len].iter().collect();
        self.pos += len;

        Ok(Some(value))
    }

    /// Diagnostic snippet around the read position
    pub fn error_info(&self) -> ErrorContext {
        let start = self.pos.saturating_sub(CONTEXT_WIDTH);
        let end = (self.pos + CONTEXT_WIDTH).min(self.chars.len());

        ErrorContext {
            position: self.pos,
            snippet: self.chars[start..end].iter().collect(),
        }
    }
}

impl From<&str> for EncodedAcl {
    fn from(value: &str) -> Self {
        Self {
            chars: value.chars().collect(),
            pos: 0,
        }
    }
}

impl fmt::Display for EncodedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{}", c))
    }
}
