//! Secret injection into resolved bundle source
//!
//! A resolved bundle may reference the reserved placeholder identifier
//! `__clientSecret__`; injection substitutes every whole-token occurrence
//! with the session's secret value, verbatim. This runs after resolution
//! (so the placeholder is present in the concatenated output) and before
//! stripping/minification (so the injected literal is treated like any
//! other code downstream).
//!
//! This is a narrowly-scoped substitution of a single reserved token,
//! not a templating engine.

/// Reserved placeholder replaced with the session secret.
pub const SECRET_PLACEHOLDER: &str = "__clientSecret__";

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

/// Replace every whole-token occurrence of `placeholder` in `source`
/// with `value`. Occurrences embedded in a longer identifier are left
/// alone. A source without the placeholder passes through unchanged;
/// that is not an error, since not every bundle references it.
pub fn inject_token(source: &str, placeholder: &str, value: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;

    while let Some(found) = source[pos..].find(placeholder) {
        let start = pos + found;
        let end = start + placeholder.len();

        let bounded_left = start == 0 || !is_ident_char(bytes[start - 1]);
        let bounded_right = end == bytes.len() || !is_ident_char(bytes[end]);

        if bounded_left && bounded_right {
            out.push_str(&source[pos..start]);
            out.push_str(value);
        } else {
            out.push_str(&source[pos..end]);
        }
        pos = end;
    }

    out.push_str(&source[pos..]);
    out
}

/// Substitute the reserved secret placeholder with `secret`.
pub fn inject_secret(source: &str, secret: &str) -> String {
    inject_token(source, SECRET_PLACEHOLDER, secret)
}
