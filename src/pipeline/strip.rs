//! Debug-call stripping for production bundles
//!
//! Removes statement-position calls to a fixed allow-list of debug-only
//! functions (`console.log`, `assert.*`, `debug`, `alert`) plus inert
//! `debugger;` statements. Matching is textual but string-aware and
//! balanced-paren aware, and deliberately conservative: a listed call
//! appearing inside a larger expression is left untouched, and nothing
//! outside the allow-list is ever removed.

/// Call names removed from production bundles. `assert.` matches any
/// member call on `assert`.
const DEBUG_CALLS: &[&str] = &["console.log", "assert.", "debug", "alert"];

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

/// True when the last emitted significant character allows a statement
/// to begin here.
fn at_statement_position(last_significant: Option<u8>) -> bool {
    matches!(last_significant, None | Some(b';') | Some(b'{') | Some(b'}'))
}

/// Length of the allow-listed call name starting at `pos`, or None.
fn match_debug_name(bytes: &[u8], pos: usize) -> Option<usize> {
    for name in DEBUG_CALLS {
        let pat = name.as_bytes();
        if !bytes[pos..].starts_with(pat) {
            continue;
        }
        let mut end = pos + pat.len();
        if name.ends_with('.') {
            // assert.<member>: require at least one identifier character
            let member_start = end;
            while end < bytes.len() && is_ident_char(bytes[end]) {
                end += 1;
            }
            if end == member_start {
                continue;
            }
        } else if end < bytes.len() && (is_ident_char(bytes[end]) || bytes[end] == b'.') {
            // Longer identifier or member access (e.g. `debugLevel`,
            // `alert.history`) is not ours to remove
            continue;
        }
        return Some(end - pos);
    }
    None
}

/// Length of the full call span `name(...)[;]` starting at `pos`, with
/// `name_len` already matched. None when no balanced call follows.
fn match_call_span(bytes: &[u8], pos: usize, name_len: usize) -> Option<usize> {
    let mut i = pos + name_len;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'(' {
        return None;
    }

    let mut depth = 0usize;
    let mut string_quote: Option<u8> = None;
    let mut escaped = false;
    while i < bytes.len() {
        let ch = bytes[i];
        i += 1;
        if let Some(quote) = string_quote {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == quote {
                string_quote = None;
            }
            continue;
        }
        match ch {
            b'"' | b'\'' | b'`' => string_quote = Some(ch),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    // Consume a trailing semicolon and the dead line it ends
                    let mut end = i;
                    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
                        end += 1;
                    }
                    if end < bytes.len() && bytes[end] == b';' {
                        return Some(end + 1 - pos);
                    }
                    return Some(i - pos);
                }
            }
            _ => {}
        }
    }
    // Unbalanced parens; leave the source alone
    None
}

/// Length of a `debugger[;]` statement starting at `pos`, or None.
fn match_debugger(bytes: &[u8], pos: usize) -> Option<usize> {
    let pat = b"debugger";
    if !bytes[pos..].starts_with(pat) {
        return None;
    }
    let mut end = pos + pat.len();
    if end < bytes.len() && is_ident_char(bytes[end]) {
        return None;
    }
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b';' {
        end += 1;
    }
    Some(end - pos)
}

/// Remove allow-listed debug calls and `debugger` statements.
///
/// Only statement-position occurrences are removed, so expressions like
/// `const x = debug(1)` keep their semantics.
pub fn strip_debug_calls(source: &str) -> String {
    let bytes = source.as_bytes();
    // Spans are only ever removed whole, so the output stays valid UTF-8.
    let mut out: Vec<u8> = Vec::with_capacity(source.len());
    let mut last_significant: Option<u8> = None;
    let mut string_quote: Option<u8> = None;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];

        if let Some(quote) = string_quote {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == quote {
                string_quote = None;
            }
            i += 1;
            continue;
        }

        match ch {
            b'"' | b'\'' | b'`' => {
                string_quote = Some(ch);
                last_significant = Some(ch);
            }
            _ if ch.is_ascii_whitespace() => {}
            _ => {
                let boundary = i == 0 || !is_ident_char(bytes[i - 1]);
                if boundary && at_statement_position(last_significant) {
                    if let Some(len) = match_debugger(bytes, i) {
                        i += len;
                        continue;
                    }
                    if let Some(span) = match_debug_name(bytes, i)
                        .and_then(|name_len| match_call_span(bytes, i, name_len))
                    {
                        i += span;
                        continue;
                    }
                }
                last_significant = Some(ch);
            }
        }

        out.push(ch);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_console_log_statement() {
        let source = "console.log('x');\nconst a = 1;";
        let output = strip_debug_calls(source);
        assert!(!output.contains("console.log"));
        assert!(output.contains("const a = 1;"));
    }

    #[test]
    fn removes_alert_debug_and_assert_members() {
        let source = "alert('hi');\nassert.equal(a, b);\ndebug(state);\nrun();";
        let output = strip_debug_calls(source);
        assert!(!output.contains("alert"));
        assert!(!output.contains("assert.equal"));
        assert!(!output.contains("debug(state)"));
        assert!(output.contains("run();"));
    }

    #[test]
    fn removes_debugger_statement() {
        let source = "debugger;\nconst a = 1;";
        let output = strip_debug_calls(source);
        assert!(!output.contains("debugger"));
        assert!(output.contains("const a = 1;"));
    }

    #[test]
    fn keeps_calls_inside_expressions() {
        let source = "const x = debug(1);\nif (alert('y')) {}";
        let output = strip_debug_calls(source);
        assert!(output.contains("const x = debug(1);"));
        assert!(output.contains("alert('y')"));
    }

    #[test]
    fn keeps_console_error_and_longer_names() {
        let source = "console.error('boom');\ndebugLevel(2);\nalerts.push(1);";
        let output = strip_debug_calls(source);
        assert!(output.contains("console.error('boom');"));
        assert!(output.contains("debugLevel(2);"));
        assert!(output.contains("alerts.push(1);"));
    }

    #[test]
    fn parens_inside_string_arguments_do_not_confuse_matching() {
        let source = "console.log('a ) tricky ( string');\nwork();";
        let output = strip_debug_calls(source);
        assert!(!output.contains("tricky"));
        assert!(output.contains("work();"));
    }

    #[test]
    fn listed_name_inside_string_is_kept() {
        let source = "const s = 'call console.log(x) please';";
        assert_eq!(strip_debug_calls(source), source);
    }

    #[test]
    fn nested_call_arguments_are_consumed() {
        let source = "console.log(fmt(a, g(b)));\nnext();";
        let output = strip_debug_calls(source);
        assert!(!output.contains("fmt"));
        assert!(output.contains("next();"));
    }

    #[test]
    fn statement_after_block_is_removed() {
        let source = "if (ready) { go(); }\nconsole.log('after block');";
        let output = strip_debug_calls(source);
        assert!(!output.contains("after block"));
        assert!(output.contains("go();"));
    }
}
