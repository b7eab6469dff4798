//! Bundle minification for production builds
//!
//! Two-stage text minifier: strip comments, then collapse whitespace.
//! String and template literals are never rewritten, word-boundary
//! spaces are preserved, and adjacent `+`/`-` operators keep a
//! separating space so `a + ++b` never merges into `a+++b`. Newlines
//! that carry meaning under automatic semicolon insertion survive the
//! collapse: after `return`/`break`/`continue`/`throw`, and before a
//! `++` or `--` operator.
//!
//! Unlike the rest of the pipeline, which degrades to a not-found
//! outcome, invalid input here is a hard error: by the time source
//! reaches the minifier it has been resolved and injected, so a syntax
//! problem means an upstream stage produced bad output.

use crate::error::{PressroomError, PressroomResult};

fn is_word_char(ch: u8) -> bool {
    // Non-ASCII bytes may belong to unicode identifiers; keep their
    // separating spaces
    ch >= 0x80 || ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

/// Remove `/* ... */` and `// ...` comments, leaving string and template
/// literal contents untouched.
fn strip_comments(source: &str) -> PressroomResult<String> {
    let bytes = source.as_bytes();
    // Only whole ASCII-delimited comments are removed, so the output
    // stays valid UTF-8.
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];

        match ch {
            b'"' | b'\'' | b'`' => {
                let start = i;
                out.push(ch);
                i += 1;
                let mut escaped = false;
                let mut closed = false;
                while i < bytes.len() {
                    let sc = bytes[i];
                    out.push(sc);
                    i += 1;
                    if escaped {
                        escaped = false;
                    } else if sc == b'\\' {
                        escaped = true;
                    } else if sc == ch {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(PressroomError::minify(format!(
                        "unterminated string literal starting at byte {start}"
                    )));
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                let start = i;
                i += 2;
                loop {
                    if i + 1 >= bytes.len() {
                        return Err(PressroomError::minify(format!(
                            "unterminated block comment starting at byte {start}"
                        )));
                    }
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// True when a space must separate `prev` and `next` to keep token
/// boundaries intact.
fn needs_space(prev: u8, next: u8) -> bool {
    if is_word_char(prev) && is_word_char(next) {
        return true;
    }
    // a + ++b must not become a+++b (same for minus)
    (prev == b'+' && next == b'+') || (prev == b'-' && next == b'-')
}

/// Keywords whose trailing newline triggers automatic semicolon
/// insertion: `return\n1` means `return; 1`.
const ASI_RESTRICTED: [&[u8]; 4] = [b"return", b"break", b"continue", b"throw"];

/// Collapse runs of whitespace outside string literals, keeping a single
/// space only where the grammar requires one. A run containing a
/// newline is collapsed to a newline instead when dropping it would
/// change what automatic semicolon insertion sees.
fn collapse_whitespace(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut pending_space = false;
    let mut pending_newline = false;
    // The word token most recently written to `out`
    let mut word: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];

        if ch.is_ascii_whitespace() {
            pending_space = true;
            pending_newline |= ch == b'\n' || ch == b'\r';
            i += 1;
            continue;
        }

        if pending_space {
            if let Some(&prev) = out.last() {
                let asi_hazard = pending_newline
                    && (ASI_RESTRICTED.contains(&word.as_slice())
                        || (ch == b'+' && bytes.get(i + 1) == Some(&b'+'))
                        || (ch == b'-' && bytes.get(i + 1) == Some(&b'-')));
                if asi_hazard {
                    out.push(b'\n');
                } else if needs_space(prev, ch) {
                    out.push(b' ');
                }
            }
            pending_space = false;
            pending_newline = false;
            if is_word_char(ch) {
                word.clear();
            }
        }

        if is_word_char(ch) {
            word.push(ch);
        } else {
            word.clear();
        }

        if ch == b'"' || ch == b'\'' || ch == b'`' {
            out.push(ch);
            i += 1;
            let mut escaped = false;
            while i < bytes.len() {
                let sc = bytes[i];
                out.push(sc);
                i += 1;
                if escaped {
                    escaped = false;
                } else if sc == b'\\' {
                    escaped = true;
                } else if sc == ch {
                    break;
                }
            }
            continue;
        }

        out.push(ch);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Minify a resolved, injected bundle.
pub fn minify(source: &str) -> PressroomResult<String> {
    let without_comments = strip_comments(source)?;
    Ok(collapse_whitespace(&without_comments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_comments() {
        let output = minify("var x = 1; // trailing note\nvar y = 2;").unwrap();
        assert!(!output.contains("trailing note"));
        assert!(output.contains("var y=2;"));
    }

    #[test]
    fn strips_block_comments() {
        let output = minify("/* header\n * comment\n */ var x = 1;").unwrap();
        assert!(!output.contains("header"));
        assert!(output.contains("var x=1;"));
    }

    #[test]
    fn collapses_structural_whitespace() {
        let output = minify("function add ( a , b ) {\n  return a + b ;\n}").unwrap();
        assert_eq!(output, "function add(a,b){return a+b;}");
    }

    #[test]
    fn preserves_string_contents() {
        let output = minify("const s = \"hello   world // not a comment\";").unwrap();
        assert!(output.contains("hello   world // not a comment"));
    }

    #[test]
    fn preserves_template_literal_contents() {
        let output = minify("const t = `a  /* keep */  b`;").unwrap();
        assert!(output.contains("a  /* keep */  b"));
    }

    #[test]
    fn keeps_word_boundaries() {
        let output = minify("return  value ;\nlet x = typeof y ;").unwrap();
        assert!(output.contains("return value;"));
        assert!(output.contains("typeof y;"));
    }

    #[test]
    fn avoids_merging_increment_operators() {
        let output = minify("const c = a + ++b;").unwrap();
        assert!(output.contains("a+ ++b"));
        assert!(!output.contains("a+++b"));
    }

    #[test]
    fn keeps_newline_after_bare_return() {
        let output = minify("function f() {\n  return\n  1;\n}").unwrap();
        assert_eq!(output, "function f(){return\n1;}");
    }

    #[test]
    fn keeps_newline_after_throw_and_continue() {
        let output = minify("throw\nnew Error('x');").unwrap();
        assert!(output.contains("throw\nnew"));

        let output = minify("while (x) { continue\n}").unwrap();
        assert!(output.contains("continue\n}"));
    }

    #[test]
    fn keeps_newline_before_increment_operator() {
        let output = minify("let a = b\n++c;").unwrap();
        assert!(output.contains("b\n++c;"));

        let output = minify("let a = b\n--c;").unwrap();
        assert!(output.contains("b\n--c;"));
    }

    #[test]
    fn same_line_return_collapses_normally() {
        let output = minify("function f() { return 1; }").unwrap();
        assert_eq!(output, "function f(){return 1;}");
    }

    #[test]
    fn identifier_ending_in_return_is_not_restricted() {
        let output = minify("doreturn\n(x);").unwrap();
        assert_eq!(output, "doreturn(x);");
    }

    #[test]
    fn division_is_not_a_comment() {
        let output = minify("const r = x / y;").unwrap();
        assert!(output.contains("x/y"));
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let output = minify("const q = 'it\\'s  fine';").unwrap();
        assert!(output.contains("it\\'s  fine"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = minify("const s = 'oops").unwrap_err();
        assert!(matches!(err, PressroomError::Minify { .. }));
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let err = minify("var x = 1; /* never closed").unwrap_err();
        assert!(matches!(err, PressroomError::Minify { .. }));
    }

    #[test]
    fn minification_is_deterministic() {
        let source = "/* c */ function f ( ) { return 1 ; }";
        assert_eq!(minify(source).unwrap(), minify(source).unwrap());
    }
}
