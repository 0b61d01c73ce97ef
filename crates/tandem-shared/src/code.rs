use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{CODE_ALPHABET, CODE_LENGTH};

/// A 6-character invite code identifying a heart.
///
/// Codes are drawn uniformly from `[A-Z0-9]` and are immutable once a heart
/// record exists under them. Parsing normalises lowercase input so codes can
/// be typed on either device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct HeartCode(String);

impl HeartCode {
    /// Draw a fresh random code.
    ///
    /// Uniqueness is not guaranteed here; the registry inserts with
    /// insert-if-absent semantics and redraws on collision.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse user input into a code, uppercasing and trimming whitespace.
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        let code = input.trim().to_ascii_uppercase();

        if code.len() != CODE_LENGTH {
            return Err(CodeError::WrongLength { got: code.len() });
        }

        if let Some(bad) = code.chars().find(|c| !matches!(c, 'A'..='Z' | '0'..='9')) {
            return Err(CodeError::InvalidChar(bad));
        }

        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HeartCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for HeartCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HeartCode {
    type Error = CodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<HeartCode> for String {
    fn from(code: HeartCode) -> Self {
        code.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("Invite code must be 6 characters, got {got}")]
    WrongLength { got: usize },

    #[error("Invite code contains invalid character '{0}'")]
    InvalidChar(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        for _ in 0..100 {
            let code = HeartCode::generate();
            assert_eq!(code.as_str().len(), CODE_LENGTH);
            assert!(code
                .as_str()
                .bytes()
                .all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_parse_normalises() {
        let code = HeartCode::parse("  a1b2c3\n").expect("should parse");
        assert_eq!(code.as_str(), "A1B2C3");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            HeartCode::parse("ABC"),
            Err(CodeError::WrongLength { got: 3 })
        );
        assert_eq!(
            HeartCode::parse("A1B2C?"),
            Err(CodeError::InvalidChar('?'))
        );
    }

    #[test]
    fn test_generated_code_roundtrips_through_parse() {
        let code = HeartCode::generate();
        let parsed = HeartCode::parse(code.as_str()).expect("should parse");
        assert_eq!(code, parsed);
    }
}
