//! Module graph resolution and bundling
//!
//! Resolves an entry file and its transitive imports into one
//! self-executing script: every module record is hoisted as an empty
//! object ahead of all module bodies, each body runs in its own
//! function scope and populates its record in place, and importers bind
//! names out of the dependency's record. Bodies are emitted
//! dependencies first. The output embeds directly as a `<script>`
//! payload with no runtime loader and no source map.
//!
//! Supported module syntax is a deliberate line-oriented subset of ES
//! modules, one statement per line:
//!
//! - `import name from 'spec';`
//! - `import { a, b as c } from 'spec';`
//! - `import name, { a } from 'spec';`
//! - `import 'spec';`
//! - `export default <expression>;`
//! - `export const|let|var|function|class name ...`
//! - `export { a, b as c };`
//!
//! Relative specifiers resolve against the importing file (exact path,
//! `.js` completion, `/index.js` completion). Bare specifiers resolve
//! against the configured packages root, honoring a package.json
//! `module` or `main` field and falling back to `index.js`. Diamond
//! dependencies are inlined once per unique resolved path. Import
//! cycles link and terminate: the hoisted records mean a back edge
//! always reads an existing object, whose fields fill in once the
//! dependency's own body has run.

use crate::error::{PressroomError, PressroomResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

static IMPORT_SIDE_EFFECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]\s*;?\s*$"#).unwrap());

static IMPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*import\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+from\s+['"]([^'"]+)['"]\s*;?\s*$"#)
        .unwrap()
});

static IMPORT_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*import\s*\{([^}]*)\}\s*from\s+['"]([^'"]+)['"]\s*;?\s*$"#).unwrap()
});

static IMPORT_DEFAULT_AND_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*import\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*,\s*\{([^}]*)\}\s*from\s+['"]([^'"]+)['"]\s*;?\s*$"#,
    )
    .unwrap()
});

static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)export\s+((?:const|let|var|function|class)\s+([A-Za-z_$][A-Za-z0-9_$]*).*)$")
        .unwrap()
});

static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*export\s*\{([^}]*)\}\s*;?\s*$").unwrap());

static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)export\s+default\s").unwrap());

static EXPORT_UNSUPPORTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*export\s*(\*|\{[^}]*\}\s*from)").unwrap());

/// Local binding name holding a module's default export inside its
/// wrapper scope.
const DEFAULT_BINDING: &str = "__default";

/// Resolves and links a module graph into a single bundle.
pub struct BundleResolver {
    packages_root: PathBuf,
}

impl BundleResolver {
    pub fn new(packages_root: impl Into<PathBuf>) -> Self {
        Self {
            packages_root: packages_root.into(),
        }
    }

    /// Bundle `entry` and everything it transitively imports.
    pub fn resolve(&self, entry: &Path) -> PressroomResult<String> {
        let mut bundler = GraphWalk {
            resolver: self,
            ids: HashMap::new(),
            emitted: Vec::new(),
        };
        let entry = canonical(entry)?;
        bundler.visit(&entry)?;

        debug!(modules = bundler.emitted.len(), "Resolved module graph");

        let mut out = String::from("(function () {\n");
        for id in 0..bundler.ids.len() {
            out.push_str("var ");
            out.push_str(&module_binding(id));
            out.push_str(" = {};\n");
        }
        for module in &bundler.emitted {
            out.push_str(module);
            out.push('\n');
        }
        out.push_str("})();\n");
        Ok(out)
    }

    /// Resolve an import specifier from the directory of the importing
    /// file to an existing file on disk.
    fn resolve_specifier(&self, spec: &str, importer: &Path) -> PressroomResult<PathBuf> {
        if spec.starts_with("./") || spec.starts_with("../") {
            let base = importer
                .parent()
                .ok_or_else(|| PressroomError::resolution(spec, "importer has no parent dir"))?;
            return find_module_file(&base.join(spec)).ok_or_else(|| {
                PressroomError::resolution(
                    spec,
                    format!("not found relative to {}", importer.display()),
                )
            });
        }

        if spec.starts_with('/') {
            return Err(PressroomError::resolution(
                spec,
                "absolute import specifiers are not supported",
            ));
        }

        self.resolve_package(spec)
    }

    /// Resolve a bare specifier against the packages root.
    fn resolve_package(&self, spec: &str) -> PressroomResult<PathBuf> {
        let root = self.packages_root.join(spec);

        // Subpath imports (`pkg/lib/util`) behave like relative files
        if spec.contains('/') {
            return find_module_file(&root).ok_or_else(|| {
                PressroomError::resolution(
                    spec,
                    format!("not found under {}", self.packages_root.display()),
                )
            });
        }

        let manifest = root.join("package.json");
        if manifest.is_file() {
            let text = fs::read_to_string(&manifest)
                .map_err(|e| PressroomError::io(format!("reading {}", manifest.display()), e))?;
            let parsed: serde_json::Value = serde_json::from_str(&text)?;
            for field in ["module", "main"] {
                if let Some(rel) = parsed.get(field).and_then(|v| v.as_str()) {
                    if let Some(found) = find_module_file(&root.join(rel)) {
                        return Ok(found);
                    }
                }
            }
        }

        find_module_file(&root).ok_or_else(|| {
            PressroomError::resolution(
                spec,
                format!("package not found under {}", self.packages_root.display()),
            )
        })
    }
}

/// One bundling pass: assigns ids on first visit, emits module wrappers
/// in dependency-first completion order.
struct GraphWalk<'a> {
    resolver: &'a BundleResolver,
    ids: HashMap<PathBuf, usize>,
    emitted: Vec<String>,
}

impl GraphWalk<'_> {
    /// Visit a module by canonical path, returning its id. Re-visits
    /// (diamonds, cycles) return the already-assigned id without
    /// rereading the file.
    fn visit(&mut self, path: &Path) -> PressroomResult<usize> {
        if let Some(&id) = self.ids.get(path) {
            return Ok(id);
        }
        let id = self.ids.len();
        self.ids.insert(path.to_path_buf(), id);
        trace!(module = %path.display(), id, "Linking module");

        let source = fs::read_to_string(path)
            .map_err(|e| PressroomError::io(format!("reading module {}", path.display()), e))?;
        let code = self.link_module(&source, path, id)?;
        self.emitted.push(code);
        Ok(id)
    }

    /// Rewrite one module into its wrapper: imports become bindings out
    /// of dependency records, exports become assignments onto the
    /// module's hoisted record.
    fn link_module(&mut self, source: &str, path: &Path, id: usize) -> PressroomResult<String> {
        let mut body = String::with_capacity(source.len());
        // (exported name, local binding)
        let mut exports: Vec<(String, String)> = Vec::new();
        let mut has_default = false;

        for line in source.lines() {
            if let Some(caps) = IMPORT_SIDE_EFFECT.captures(line) {
                self.import_dep(&caps[1], path)?;
                continue;
            }
            if let Some(caps) = IMPORT_DEFAULT_AND_NAMED.captures(line) {
                let dep = self.import_dep(&caps[3], path)?;
                body.push_str(&default_binding(&caps[1], dep));
                bind_named(&mut body, &caps[2], dep);
                continue;
            }
            if let Some(caps) = IMPORT_DEFAULT.captures(line) {
                let dep = self.import_dep(&caps[2], path)?;
                body.push_str(&default_binding(&caps[1], dep));
                continue;
            }
            if let Some(caps) = IMPORT_NAMED.captures(line) {
                let dep = self.import_dep(&caps[2], path)?;
                bind_named(&mut body, &caps[1], dep);
                continue;
            }
            if EXPORT_UNSUPPORTED.is_match(line) {
                return Err(PressroomError::resolution(
                    path.display().to_string(),
                    format!("unsupported export form: {}", line.trim()),
                ));
            }
            if let Some(caps) = EXPORT_DEFAULT.captures(line) {
                let rest = &line[caps.get(0).map(|m| m.end()).unwrap_or(0)..];
                body.push_str(&caps[1]);
                body.push_str("const ");
                body.push_str(DEFAULT_BINDING);
                body.push_str(" = ");
                body.push_str(rest);
                body.push('\n');
                has_default = true;
                continue;
            }
            if let Some(caps) = EXPORT_DECL.captures(line) {
                exports.push((caps[3].to_string(), caps[3].to_string()));
                body.push_str(&caps[1]);
                body.push_str(&caps[2]);
                body.push('\n');
                continue;
            }
            if let Some(caps) = EXPORT_LIST.captures(line) {
                for item in caps[1].split(',') {
                    let item = item.trim();
                    if item.is_empty() {
                        continue;
                    }
                    match item.split_once(" as ") {
                        Some((local, exported)) => {
                            exports.push((exported.trim().to_string(), local.trim().to_string()));
                        }
                        None => exports.push((item.to_string(), item.to_string())),
                    }
                }
                continue;
            }
            body.push_str(line);
            body.push('\n');
        }

        let binding = module_binding(id);
        let mut record = String::new();
        if has_default {
            record.push_str(&format!("{binding}.default = {DEFAULT_BINDING};\n"));
        }
        for (exported, local) in &exports {
            record.push_str(&format!("{binding}.{exported} = {local};\n"));
        }

        Ok(format!("(function () {{\n{body}{record}}})();"))
    }

    fn import_dep(&mut self, spec: &str, importer: &Path) -> PressroomResult<usize> {
        let resolved = self.resolver.resolve_specifier(spec, importer)?;
        let resolved = canonical(&resolved)?;
        self.visit(&resolved)
    }
}

fn module_binding(id: usize) -> String {
    format!("__mod_{id}")
}

fn default_binding(local: &str, dep: usize) -> String {
    format!("const {local} = {}.default;\n", module_binding(dep))
}

/// Emit bindings for a named-import list (`a, b as c`).
fn bind_named(body: &mut String, list: &str, dep: usize) {
    for item in list.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (source, local) = match item.split_once(" as ") {
            Some((source, local)) => (source.trim(), local.trim()),
            None => (item, item),
        };
        body.push_str(&format!(
            "const {local} = {}.{source};\n",
            module_binding(dep)
        ));
    }
}

/// Try a specifier path as-is, with `.js` appended, and as a directory
/// with `index.js`.
fn find_module_file(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let with_ext = PathBuf::from(format!("{}.js", candidate.display()));
    if with_ext.is_file() {
        return Some(with_ext);
    }
    let index = candidate.join("index.js");
    if index.is_file() {
        return Some(index);
    }
    None
}

fn canonical(path: &Path) -> PressroomResult<PathBuf> {
    fs::canonicalize(path)
        .map_err(|e| PressroomError::io(format!("canonicalizing {}", path.display()), e))
}
