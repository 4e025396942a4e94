//! Wire encoding of command arguments.

use std::fmt::Display;

/// A command line under construction.
pub(super) struct Line(Vec<u8>);

impl Line {
    pub(super) fn start(tag: &str) -> Self {
        let mut line = Self(Vec::with_capacity(64));
        line.raw(tag).raw(" ");
        line
    }

    /// Appends text verbatim.
    pub(super) fn raw(&mut self, text: &str) -> &mut Self {
        self.0.extend_from_slice(text.as_bytes());
        self
    }

    /// Appends a space then `value`'s display form.
    pub(super) fn arg(&mut self, value: impl Display) -> &mut Self {
        self.0.extend_from_slice(format!(" {value}").as_bytes());
        self
    }

    /// Appends a space then an astring: bare when it is a valid atom,
    /// quoted with `\` escapes otherwise.
    pub(super) fn astring(&mut self, text: &str) -> &mut Self {
        self.0.push(b' ');
        if !text.is_empty() && text.bytes().all(is_atom_byte) {
            return self.raw(text);
        }
        self.0.push(b'"');
        for byte in text.bytes() {
            if matches!(byte, b'"' | b'\\') {
                self.0.push(b'\\');
            }
            self.0.push(byte);
        }
        self.0.push(b'"');
        self
    }

    /// Appends a space then `( a b c )` without the inner padding.
    pub(super) fn list<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let joined = items
            .into_iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.raw(" (").raw(&joined).raw(")")
    }

    pub(super) fn finish(mut self) -> Vec<u8> {
        self.0.extend_from_slice(b"\r\n");
        self.0
    }
}

/// Bytes allowed unquoted. `]` is excluded too since some servers reject it
/// in an astring.
const fn is_atom_byte(b: u8) -> bool {
    b > b' ' && b < 0x7F && !matches!(b, b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']')
}
