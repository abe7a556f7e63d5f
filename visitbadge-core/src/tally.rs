//! Decimal digit tally.
//!
//! Cached counts are kept as ASCII decimal byte sequences rather than integers,
//! so a cache hit can be served by incrementing the text in place without a
//! parse/format round trip. This module provides:
//!
//! - [`tally`] - increment a digit sequence by exactly one
//! - [`compare`] - numeric ordering of two digit sequences
//! - [`Digits`] - a validated count string handed out to callers
//!
//! ```
//! use visitbadge_core::tally::tally;
//!
//! assert_eq!(tally(b"9").unwrap(), b"10");
//! assert_eq!(tally(b"199").unwrap(), b"200");
//! assert!(tally(b"").is_err());
//! ```

use std::cmp::Ordering;
use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

/// A counter value that is not a canonical decimal byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCounter {
    /// The sequence has no digits at all.
    #[error("counter is empty")]
    Empty,
    /// A byte outside `'0'..='9'`.
    #[error("counter contains non-digit byte {byte:#04x} at offset {offset}")]
    NonDigit {
        /// Offending byte.
        byte: u8,
        /// Position of the byte in the sequence.
        offset: usize,
    },
    /// More than one digit with a leading `'0'`, such as `"007"`.
    #[error("counter has a leading zero")]
    LeadingZero,
}

fn validate(digits: &[u8]) -> Result<(), MalformedCounter> {
    if digits.is_empty() {
        return Err(MalformedCounter::Empty);
    }
    match digits.iter().position(|b| !b.is_ascii_digit()) {
        Some(offset) => Err(MalformedCounter::NonDigit {
            byte: digits[offset],
            offset,
        }),
        None if digits.len() > 1 && digits[0] == b'0' => Err(MalformedCounter::LeadingZero),
        None => Ok(()),
    }
}

/// Increments a decimal digit sequence by one.
///
/// The carry walks left from the last digit, turning every `'9'` into `'0'`
/// until a digit can absorb it. If every digit was a `'9'` the result is one
/// byte longer and starts with `'1'`.
///
/// The input is left untouched; the returned vector is the new value.
pub fn tally(digits: &[u8]) -> Result<Vec<u8>, MalformedCounter> {
    validate(digits)?;

    let mut next = digits.to_vec();
    for digit in next.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return Ok(next);
        }
    }

    // Carry ran off the front: 9 -> 10, 999 -> 1000.
    next.insert(0, b'1');
    Ok(next)
}

/// Numeric ordering of two digit sequences.
///
/// Leading zeros are ignored, so `"010"` and `"10"` compare equal.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    let (a, b) = (significant(a), significant(b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn significant(digits: &[u8]) -> &[u8] {
    let start = digits.iter().position(|b| *b != b'0').unwrap_or(digits.len());
    &digits[start..]
}

/// A validated decimal count.
///
/// Wraps a [`SmolStr`] so counts up to 23 digits are stored inline and
/// cloning never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digits(SmolStr);

impl Digits {
    /// The count of a key that has never been incremented.
    pub const ZERO: &'static str = "0";

    /// Validates `bytes` as a decimal digit sequence.
    pub fn parse(bytes: &[u8]) -> Result<Self, MalformedCounter> {
        validate(bytes)?;
        // All bytes are ASCII digits, so the conversion is lossless.
        Ok(Self(SmolStr::new(String::from_utf8_lossy(bytes))))
    }

    /// Returns the count incremented by one.
    pub fn tally(&self) -> Result<Self, MalformedCounter> {
        let next = tally(self.0.as_bytes())?;
        Self::parse(&next)
    }

    /// Returns the count as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the count as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the last digit is `'0'`.
    pub fn ends_with_zero(&self) -> bool {
        self.0.as_bytes().last() == Some(&b'0')
    }
}

impl From<u64> for Digits {
    fn from(value: u64) -> Self {
        Self(SmolStr::new(value.to_string()))
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digits {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
