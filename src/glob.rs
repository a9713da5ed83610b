use std::ffi::CString;

use libc::c_int;

/// A shell wildcard pattern, matched with the C library's `fnmatch(3)`.
///
/// Like the C string API underneath, a pattern or a candidate value is only
/// considered up to its first NUL byte.
///
/// ```
/// let glob = factoid_cdb::Glob::new(b"bar*");
/// assert!(glob.matches(b"bar1"));
/// assert!(!glob.matches(b"foo"));
/// ```
#[derive(Clone, Debug)]
pub struct Glob {
    pattern: CString,
}

fn c_string(bytes: &[u8]) -> CString {
    let end = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    // Cannot fail: the slice stops before the first NUL.
    CString::new(&bytes[..end]).unwrap_or_default()
}

impl Glob {
    pub fn new(pattern: &[u8]) -> Glob {
        Glob {
            pattern: c_string(pattern),
        }
    }

    /// Whether `value` matches the whole pattern, with no `fnmatch` flags.
    pub fn matches(&self, value: &[u8]) -> bool {
        let value = c_string(value);
        let flags: c_int = 0;
        // SAFETY: both pointers are valid NUL-terminated strings that
        // outlive the call, and fnmatch does not retain them.
        unsafe { libc::fnmatch(self.pattern.as_ptr(), value.as_ptr(), flags) == 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal() {
        let g = Glob::new(b"bar1");
        assert!(g.matches(b"bar1"));
        assert!(!g.matches(b"bar2"));
        assert!(!g.matches(b"bar10"));
    }

    #[test]
    fn wildcards() {
        assert!(Glob::new(b"*").matches(b""));
        assert!(Glob::new(b"*").matches(b"anything at all"));
        assert!(Glob::new(b"b?r*").matches(b"bar2"));
        assert!(Glob::new(b"[ab]ar").matches(b"aar"));
        assert!(!Glob::new(b"[ab]ar").matches(b"car"));
        assert!(Glob::new(b"*.example.org").matches(b"www.example.org"));
    }

    #[test]
    fn stops_at_nul() {
        assert!(Glob::new(b"abc").matches(b"abc\0def"));
        assert!(Glob::new(b"abc\0xyz").matches(b"abc"));
    }

    #[test]
    fn slash_is_ordinary() {
        assert!(Glob::new(b"a*c").matches(b"a/b/c"));
    }
}
