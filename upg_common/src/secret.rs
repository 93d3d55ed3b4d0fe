use std::{
    fmt,
    fmt::{Debug, Display},
};

use sha2::{Digest, Sha256};

#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default + AsRef<[u8]>> Secret<T> {
    /// Compares `candidate` against the secret without leaking where the two differ.
    ///
    /// Both sides are hashed first so that the comparison always runs over 32 bytes, whatever the input lengths.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        let expected = Sha256::digest(self.value.as_ref());
        let actual = Sha256::digest(candidate);
        constant_time_eq(expected.as_slice(), actual.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_empty()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
