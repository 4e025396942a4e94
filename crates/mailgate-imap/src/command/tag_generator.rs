//! Per-connection command tags.

/// Hands out `A0001`, `A0002`, ... for one connection.
///
/// Past `A9999` the number simply grows wider; after `u32::MAX` commands it
/// wraps, which no gateway session comes close to.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    last: u32,
}

impl TagGenerator {
    /// Starts a sequence with `prefix`.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, last: 0 }
    }

    /// Returns the next unused tag.
    pub fn next(&mut self) -> String {
        self.last = self.last.wrapping_add(1);
        format!("{}{:04}", self.prefix, self.last)
    }

    /// Number of tags handed out so far.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.last
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}
