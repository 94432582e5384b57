use std::fmt;
use std::str;

/// A bounded identifier for chunks and blocks.
///
/// Names are stored inline as at most [`Name::MAX_LEN`] bytes of
/// UTF-8. Longer input is truncated to the longest prefix that still
/// ends on a character boundary; the stored prefix is what every
/// later lookup and dump record sees. Uniqueness is not enforced:
/// duplicate names are legal, and name-based operations resolve to
/// the first match in list order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Name {
    bytes: [u8; Name::MAX_LEN],
    len: u8,
}

impl Name {
    /// Maximum stored length, in bytes.
    pub const MAX_LEN: usize = 32;

    /// Build a name from a string, truncating it if needed.
    pub fn new(name: &str) -> Self {
        // Cut the input down to the capacity, then walk back until
        // the cut lands on a character boundary, so that a
        // multi-byte character is dropped whole rather than sliced.
        let mut len = name.len().min(Self::MAX_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        let mut bytes = [0; Self::MAX_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);

        Self {
            bytes,
            len: len as u8,
        }
    }

    /// The stored name.
    pub fn as_str(&self) -> &str {
        // The stored bytes are a prefix of valid UTF-8 cut on a
        // character boundary, so they are valid UTF-8 themselves.
        str::from_utf8(&self.bytes[..self.len as usize])
            .expect("stored name is valid UTF-8")
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
