//! Hierarchical store keys and their byte encoding.
//!
//! Each segment is written with `0x00` escaped as `0x00 0xFF` and closed by
//! the terminator `0x00 0x01`. The encoding sorts the same way as the segment
//! lists themselves, and an encoded prefix only matches keys whose leading
//! segments are equal, never keys that merely share leading bytes.

use std::fmt;

use thiserror::Error;

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key bytes end inside a segment")]
    Truncated,

    #[error("Invalid escape sequence 0x00 0x{0:02x}")]
    InvalidEscape(u8),

    #[error("Key segment is not valid UTF-8")]
    NotUtf8,
}

/// An ordered list of string segments addressing one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Vec<String>);

/// Byte bounds covering every key strictly below a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Exclusive lower bound (the encoded prefix itself)
    pub start: Vec<u8>,
    /// Exclusive upper bound, `None` when the prefix is the root
    pub end: Option<Vec<u8>>,
}

impl Key {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty key, prefix of every other key
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Extend the key by one segment
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.iter().map(|s| s.len() + 2).sum());
        for segment in &self.0 {
            for &byte in segment.as_bytes() {
                if byte == ESCAPE {
                    out.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
                } else {
                    out.push(byte);
                }
            }
            out.extend_from_slice(&[ESCAPE, TERMINATOR]);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KeyError> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        let mut iter = bytes.iter().copied();

        while let Some(byte) = iter.next() {
            if byte != ESCAPE {
                current.push(byte);
                continue;
            }
            match iter.next() {
                Some(ESCAPED_NUL) => current.push(ESCAPE),
                Some(TERMINATOR) => {
                    let segment =
                        String::from_utf8(std::mem::take(&mut current)).map_err(|_| KeyError::NotUtf8)?;
                    segments.push(segment);
                }
                Some(other) => return Err(KeyError::InvalidEscape(other)),
                None => return Err(KeyError::Truncated),
            }
        }

        if !current.is_empty() {
            return Err(KeyError::Truncated);
        }

        Ok(Self(segments))
    }

    /// Byte range matching all keys that have `self` as a strict prefix
    pub fn range(&self) -> KeyRange {
        let start = self.encode();
        let end = start.split_last().map(|(last, head)| {
            let mut end = head.to_vec();
            end.push(last + 1);
            end
        });
        KeyRange { start, end }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl KeyRange {
    pub fn contains(&self, encoded: &[u8]) -> bool {
        encoded > self.start.as_slice() && self.end.as_deref().is_none_or(|end| encoded < end)
    }
}
