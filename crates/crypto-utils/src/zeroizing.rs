use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A `Vec<u8>` wrapper that is zeroed when dropped.
///
/// Use this for any sensitive byte data (seeds, derived key material) that
/// must not linger in memory after use. `Debug` is redacted so a seed can
/// never leak through diagnostic output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingBytes(Vec<u8>);

impl ZeroizingBytes {
    /// Creates a new `ZeroizingBytes` from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Returns the length of the inner byte slice.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the inner byte slice is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ZeroizingBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ZeroizingBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ZeroizingBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl fmt::Debug for ZeroizingBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZeroizingBytes({} bytes, redacted)", self.0.len())
    }
}

/// A `String` wrapper that is zeroed when dropped.
///
/// Use this for sensitive string data (mnemonic phrases, passphrases) that
/// must not linger in memory after use.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingString(String);

impl ZeroizingString {
    /// Creates a new `ZeroizingString` from a `String`.
    pub fn new(data: String) -> Self {
        Self(data)
    }

    /// Returns the length of the inner string in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the inner string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ZeroizingString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ZeroizingString {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for ZeroizingString {
    fn from(data: &str) -> Self {
        Self::new(data.to_owned())
    }
}

impl fmt::Debug for ZeroizingString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZeroizingString(redacted)")
    }
}
