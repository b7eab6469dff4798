//! Stylesheet resolution
//!
//! Single-stage sibling of the JS pipeline: resolves a stylesheet and
//! its `@import` chain into one blob, dependency-first, one inclusion
//! per unique resolved path. No secret injection and no minification.

use crate::error::{PressroomError, PressroomResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

static CSS_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*@import\s+(?:url\(\s*)?['"]([^'"]+)['"]\s*\)?\s*;?\s*$"#).unwrap()
});

/// Concatenate `entry` and its transitive `@import`s.
pub fn resolve_css(entry: &Path) -> PressroomResult<String> {
    let mut seen = HashSet::new();
    let mut out = String::new();
    let entry = fs::canonicalize(entry)
        .map_err(|e| PressroomError::io(format!("canonicalizing {}", entry.display()), e))?;
    inline_sheet(&entry, &mut seen, &mut out)?;
    Ok(out)
}

fn inline_sheet(
    path: &Path,
    seen: &mut HashSet<PathBuf>,
    out: &mut String,
) -> PressroomResult<()> {
    if !seen.insert(path.to_path_buf()) {
        return Ok(());
    }

    let source = fs::read_to_string(path)
        .map_err(|e| PressroomError::io(format!("reading stylesheet {}", path.display()), e))?;

    for line in source.lines() {
        if let Some(caps) = CSS_IMPORT.captures(line) {
            let spec = &caps[1];
            let base = path
                .parent()
                .ok_or_else(|| PressroomError::resolution(spec, "importer has no parent dir"))?;
            let target = base.join(spec);
            let target = fs::canonicalize(&target).map_err(|_| {
                PressroomError::resolution(
                    spec,
                    format!("stylesheet not found relative to {}", path.display()),
                )
            })?;
            inline_sheet(&target, seen, out)?;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    Ok(())
}
