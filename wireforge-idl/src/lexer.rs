//! Character classification and whitespace/comment skipping shared by the
//! recursive-descent parser in [`crate::parser`].
//!
//! Scans over [`wireforge_core::cursor::Cursor`] so that every parse
//! failure carries the same "160 bytes before, marker, 80 bytes after"
//! diagnostic context the wire codecs use for malformed bytes.

use wireforge_core::cursor::Cursor;
use wireforge_core::error::{bail, ensure, Result};

pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

pub fn is_first_identifier(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_identifier(b: u8) -> bool {
    is_first_identifier(b) || is_digit(b)
}

/// Skip runs of whitespace, `// ...` line comments, and `/* ... */` block
/// comments (no nesting: the first `*/` closes the comment).
pub fn skip_ws_and_comments(cur: &mut Cursor) -> Result<()> {
    loop {
        if cur.at_end() {
            return Ok(());
        }
        let b = cur.peek()?;
        if is_whitespace(b) {
            cur.advance(1)?;
            continue;
        }
        if b == b'/' && cur.remaining() >= 2 {
            let mut probe = *cur;
            probe.advance(1)?;
            let next = probe.peek()?;
            if next == b'/' {
                cur.advance(2)?;
                while !cur.at_end() && cur.peek()? != b'\n' {
                    cur.advance(1)?;
                }
                continue;
            }
            if next == b'*' {
                cur.advance(2)?;
                loop {
                    ensure!(!cur.at_end(), BadNamespace, "unterminated block comment\n{}", cur.diagnostic());
                    let c = cur.peek()?;
                    cur.advance(1)?;
                    if c == b'*' && !cur.at_end() && cur.peek()? == b'/' {
                        cur.advance(1)?;
                        break;
                    }
                }
                continue;
            }
        }
        break;
    }
    Ok(())
}

pub fn expect_byte(cur: &mut Cursor, want: u8) -> Result<()> {
    skip_ws_and_comments(cur)?;
    let got = cur.read_byte()?;
    ensure!(
        got == want,
        BadClass,
        "expected '{}', found '{}'\n{}",
        want as char,
        got as char,
        cur.diagnostic()
    );
    Ok(())
}

pub fn peek_byte(cur: &mut Cursor) -> Result<u8> {
    skip_ws_and_comments(cur)?;
    cur.peek()
}

/// `Ident := [A-Za-z_][A-Za-z0-9_]*`
pub fn parse_identifier(cur: &mut Cursor) -> Result<String> {
    skip_ws_and_comments(cur)?;
    let first = cur.peek()?;
    ensure!(
        is_first_identifier(first),
        BadIdentifier,
        "identifier cannot start with '{}'\n{}",
        first as char,
        cur.diagnostic()
    );
    let mut name = String::new();
    name.push(first as char);
    cur.advance(1)?;
    while !cur.at_end() && is_identifier(cur.peek()?) {
        name.push(cur.peek()? as char);
        cur.advance(1)?;
    }
    Ok(name)
}

/// `HQID := Ident ('::' Ident)*`
pub fn parse_hierarchical_identifier(cur: &mut Cursor) -> Result<String> {
    let mut name = parse_identifier(cur)?;
    loop {
        if cur.remaining() < 2 {
            break;
        }
        let mut probe = *cur;
        if probe.peek()? != b':' {
            break;
        }
        probe.advance(1)?;
        if probe.peek()? != b':' {
            bail!(
                BadIdentifier,
                "namespace and identifier must be separated by '::', a single ':' is unsupported\n{}",
                cur.diagnostic()
            );
        }
        cur.advance(2)?;
        name.push_str("::");
        name.push_str(&parse_identifier(cur)?);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_and_hierarchical_identifier() {
        let data = b"foo::bar_baz";
        let mut cur = Cursor::new(data);
        assert_eq!(parse_hierarchical_identifier(&mut cur).unwrap(), "foo::bar_baz");
        assert!(cur.at_end());
    }

    #[test]
    fn skips_line_and_block_comments() {
        let data = b"  // a comment\n/* block */  x";
        let mut cur = Cursor::new(data);
        skip_ws_and_comments(&mut cur).unwrap();
        assert_eq!(cur.peek().unwrap(), b'x');
    }

    #[test]
    fn block_comment_closes_on_first_terminator_no_nesting() {
        // The inner `/*` does not nest; the comment closes at the first `*/`,
        // leaving ` nested */ after` in the source.
        let data = b"/* outer /* nested */ after */";
        let mut cur = Cursor::new(data);
        skip_ws_and_comments(&mut cur).unwrap();
        // Not at 'a' of "after" because the first `*/` already closed it,
        // and what follows (" after */") is plain source text, not
        // whitespace, so skip_ws_and_comments stops right there.
        assert_eq!(cur.peek().unwrap(), b'a');
    }

    #[test]
    fn identifier_cannot_start_with_digit() {
        let data = b"9abc";
        let mut cur = Cursor::new(data);
        assert!(parse_identifier(&mut cur).is_err());
    }
}
