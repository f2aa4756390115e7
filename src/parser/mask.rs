//! Comment and string-literal masking.
//!
//! Declarations are matched against a copy of the source in which every byte
//! of a comment or string literal body is replaced by a space. Newlines are
//! kept, so byte offsets and line numbers line up with the original text.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
}

/// Return `source` with comments and string bodies blanked out.
pub fn mask(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'/')) => {
                    state = State::LineComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = State::BlockComment;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'"' | b'\'', _) => {
                    state = State::Str(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { b' ' });
            }
            State::Str(quote) => {
                if b == b'\\' && next.is_some() {
                    out.push(b' ');
                    out.push(if next == Some(b'\n') { b'\n' } else { b' ' });
                    i += 2;
                    continue;
                }
                if b == quote {
                    state = State::Code;
                    out.push(b);
                } else if b == b'\n' {
                    // Unterminated literal; resume scanning code on the next line
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
        }
        i += 1;
    }

    // Only ASCII bytes are ever written in place of masked bytes, and unmasked
    // bytes are copied whole, so multi-byte characters outside comments survive.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Brace depth before each byte of `masked`.
pub fn brace_depths(masked: &str) -> Vec<usize> {
    let mut depths = Vec::with_capacity(masked.len() + 1);
    let mut depth = 0usize;
    for b in masked.bytes() {
        depths.push(depth);
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depths.push(depth);
    depths
}

/// Offset of the delimiter closing the `{`, `(` or `[` at `open`, if balanced.
pub fn matching(masked: &str, open: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    let (opener, closer) = match bytes.get(open)? {
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_comments_keeping_offsets() {
        let src = "uint a; // function f()\n/* struct S {} */ uint b;";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert!(!masked.contains("function"));
        assert!(!masked.contains("struct"));
        assert!(masked.contains("uint b;"));
        assert_eq!(masked.find('\n'), src.find('\n'));
    }

    #[test]
    fn masks_string_bodies() {
        let masked = mask(r#"string s = "enum E { A }"; string t = 'x\'y';"#);
        assert!(!masked.contains("enum"));
        assert!(masked.contains("string t = '"));
    }

    #[test]
    fn multibyte_in_comment() {
        let src = "// caf\u{e9}\nuint x;";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert!(masked.ends_with("uint x;"));
    }

    #[test]
    fn depths_and_matching() {
        let src = "contract C { struct S { uint a; } }";
        let depths = brace_depths(src);
        let open = src.find('{').unwrap();
        assert_eq!(depths[open], 0);
        assert_eq!(depths[open + 1], 1);
        assert_eq!(matching(src, open), Some(src.len() - 1));
        assert_eq!(matching("{ {", 0), None);
        assert_eq!(matching("f(a, (b))", 1), Some(8));
        assert_eq!(matching("abc", 0), None);
    }
}
