//! Byte-string views and the small set of free functions the table needs.
//!
//! A `ByteStr` never owns memory. It is either a borrowed span of bytes or
//! the null string, which every table operation rejects. Zero-length spans
//! are valid keys and are distinct from the null string.

use core::fmt;

/// Non-owning view over a run of bytes, or the null string.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ByteStr<'a> {
    data: Option<&'a [u8]>,
}

impl<'a> ByteStr<'a> {
    /// The null string. Also what `ByteStr::default()` produces.
    pub const NULL: ByteStr<'static> = ByteStr { data: None };

    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { data: Some(bytes) }
    }

    /// Number of bytes in the view; 0 for the null string.
    pub fn len(&self) -> usize {
        self.data.map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    /// The viewed bytes, or `None` for the null string.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        self.data
    }
}

impl<'a> From<&'a [u8]> for ByteStr<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteStr<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a str> for ByteStr<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Debug for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            None => f.write_str("NULL"),
            Some(bytes) => write!(f, "\"{}\"", bytes.escape_ascii()),
        }
    }
}

/// Result of splitting a string on the first occurrence of a delimiter.
///
/// `head` and `tail` are only meaningful when `found` is true; otherwise
/// both are [`ByteStr::NULL`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Cut<'a> {
    pub head: ByteStr<'a>,
    pub tail: ByteStr<'a>,
    pub found: bool,
}

impl<'a> Cut<'a> {
    pub fn into_option(self) -> Option<(ByteStr<'a>, ByteStr<'a>)> {
        self.found.then_some((self.head, self.tail))
    }
}

/// Borrowed view over `buf[start..end]`.
///
/// The caller guarantees `start <= end <= buf.len()`; out-of-range bounds
/// panic like any other slice index.
pub fn slice(buf: &[u8], start: usize, end: usize) -> ByteStr<'_> {
    debug_assert!(start <= end, "slice start {start} past end {end}");
    ByteStr::new(&buf[start..end])
}

/// Splits `s` on the first `delimiter` byte. Allocation-free.
pub fn cut(s: ByteStr<'_>, delimiter: u8) -> Cut<'_> {
    let Some(bytes) = s.as_bytes() else {
        return Cut::default();
    };
    match bytes.iter().position(|&b| b == delimiter) {
        Some(at) => Cut {
            head: ByteStr::new(&bytes[..at]),
            tail: ByteStr::new(&bytes[at + 1..]),
            found: true,
        },
        None => Cut::default(),
    }
}

/// Byte equality. The null string is only equal to itself; two valid
/// zero-length strings are equal.
pub fn are_equal(a: ByteStr<'_>, b: ByteStr<'_>) -> bool {
    match (a.as_bytes(), b.as_bytes()) {
        (Some(x), Some(y)) => x.len() == y.len() && x == y,
        (None, None) => true,
        _ => false,
    }
}

pub fn is_valid_str(a: ByteStr<'_>) -> bool {
    a.is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn slice_spans_half_open_range() {
        let buf = b"Hamburg;12.0";
        let s = slice(buf, 0, 7);
        assert_eq!(s.as_bytes(), Some(&b"Hamburg"[..]));
        assert_eq!(s.len(), 7);

        let empty = slice(buf, 3, 3);
        assert!(empty.is_valid());
        assert!(empty.is_empty());
    }

    #[test]
    fn cut_splits_on_first_delimiter() {
        let c = cut(ByteStr::from("Abha;-23.0;x"), b';');
        assert!(c.found);
        assert!(are_equal(c.head, "Abha".into()));
        assert!(are_equal(c.tail, "-23.0;x".into()));
    }

    #[test]
    fn cut_at_edges_yields_empty_valid_parts() {
        let c = cut(ByteStr::from(";tail"), b';');
        assert!(c.found);
        assert!(c.head.is_valid() && c.head.is_empty());
        assert!(are_equal(c.tail, "tail".into()));

        let c = cut(ByteStr::from("head;"), b';');
        assert!(c.found);
        assert!(c.tail.is_valid() && c.tail.is_empty());
    }

    #[test]
    fn cut_without_delimiter_reports_not_found() {
        let c = cut(ByteStr::from("no delimiter here"), b';');
        assert!(!c.found);
        assert_eq!(c.into_option(), None);

        let c = cut(ByteStr::NULL, b';');
        assert!(!c.found);
    }

    #[test]
    fn equality_is_by_length_and_bytes() {
        let owned = String::from("new key");
        assert!(are_equal("new key".into(), owned.as_str().into()));
        assert!(!are_equal("new key".into(), "new ke".into()));
        assert!(!are_equal("new key".into(), "new kez".into()));
        assert!(are_equal(b"".into(), "".into()));
    }

    #[test]
    fn null_string_is_invalid_and_only_equals_itself() {
        assert!(!is_valid_str(ByteStr::NULL));
        assert!(!is_valid_str(ByteStr::default()));
        assert!(is_valid_str(ByteStr::from("")));
        assert!(are_equal(ByteStr::NULL, ByteStr::default()));
        assert!(!are_equal(ByteStr::NULL, ByteStr::from("")));
    }

    #[test]
    fn debug_escapes_bytes() {
        assert_eq!(format!("{:?}", ByteStr::from(&b"a\n\xff"[..])), "\"a\\n\\xff\"");
        assert_eq!(format!("{:?}", ByteStr::NULL), "NULL");
    }
}
