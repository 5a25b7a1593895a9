//! The text being read aloud
//!
//! Holds the editor contents: typed lines, pasted clipboard text and files
//! dropped onto (or loaded into) the reader.

use crate::Result;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// A drop payload item: `{path with spaces}` or a bare token
static DROP_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}|(\S+)").expect("drop regex is valid"));

/// Editor buffer
#[derive(Debug, Default, Clone)]
pub struct Document {
    text: String,
}

/// A file read from a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub name: String,
    pub text: String,
}

/// Result of loading dropped paths
#[derive(Debug, Default)]
pub struct DropReport {
    pub loaded: Vec<LoadedFile>,
    pub errors: Vec<String>,
}

impl DropReport {
    /// Total characters loaded
    pub fn total_chars(&self) -> usize {
        self.loaded.iter().map(|f| f.text.chars().count()).sum()
    }

    /// Status line describing the drop
    pub fn status(&self) -> String {
        if self.loaded.is_empty() {
            let reason = self
                .errors
                .first()
                .map(String::as_str)
                .unwrap_or("no readable files");
            return format!("Drop failed: {}", reason);
        }

        let names: Vec<&str> = self.loaded.iter().map(|f| f.name.as_str()).collect();
        format!(
            "Loaded: {}  ({} chars)  — press Speak",
            names.join(", "),
            group_thousands(self.total_chars())
        )
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append typed text as a new line
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Insert text at the end, as the editor's paste does
    pub fn insert(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Paste the clipboard contents
    pub fn paste_clipboard(&mut self) -> Result<usize> {
        let text = crate::clipboard::get_from_clipboard()?;
        self.insert(&text);
        Ok(text.chars().count())
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Contents with surrounding whitespace removed
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text().chars().count()
    }

    /// Load dropped files, replacing the contents if any could be read
    ///
    /// When nothing is readable the current contents are kept.
    pub fn load_drop(&mut self, payload: &str) -> DropReport {
        self.load_paths(&parse_drop_payload(payload))
    }

    /// Load files given as paths, replacing the contents if any could be read
    pub fn load_paths(&mut self, paths: &[PathBuf]) -> DropReport {
        let report = read_paths(paths);

        if !report.loaded.is_empty() {
            self.text = report.loaded.iter().map(|f| f.text.as_str()).collect();
            info!(
                "Loaded {} file(s), {} chars",
                report.loaded.len(),
                report.total_chars()
            );
        }

        report
    }
}

/// Split a drop payload into paths
///
/// Paths containing spaces arrive wrapped in braces; `file://` URIs are
/// accepted too.
pub fn parse_drop_payload(payload: &str) -> Vec<PathBuf> {
    DROP_ITEM
        .captures_iter(payload.trim())
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| drop_item_path(m.as_str()))
        .collect()
}

/// Turn one drop item into a path, resolving `file://` URIs
fn drop_item_path(raw: &str) -> PathBuf {
    if !raw.starts_with("file:") {
        return PathBuf::from(raw);
    }
    match Url::parse(raw).map(|url| url.to_file_path()) {
        Ok(Ok(path)) => path,
        _ => {
            warn!("Not a local file URI: {}", raw);
            PathBuf::from(raw)
        }
    }
}

/// Read each path as text, collecting failures
pub fn read_paths(paths: &[PathBuf]) -> DropReport {
    let mut report = DropReport::default();

    for path in paths {
        let name = file_name(path);
        if !path.exists() {
            report.errors.push(format!("Not found: {}", name));
            continue;
        }
        match fs::read(path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {:?}", bytes.len(), path);
                report.loaded.push(LoadedFile {
                    name,
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(e) => report.errors.push(format!("Cannot read {}: {}", name, e)),
        }
    }

    report
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 12345 -> "12,345"
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_braced_and_bare_paths() {
        let paths = parse_drop_payload("{/tmp/my notes.txt} /tmp/other.txt");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/my notes.txt"),
                PathBuf::from("/tmp/other.txt")
            ]
        );
    }

    #[test]
    fn test_parse_file_uri() {
        let paths = parse_drop_payload("file:///home/me/a%20b.txt");
        assert_eq!(paths, vec![PathBuf::from("/home/me/a b.txt")]);
    }

    #[test]
    fn test_parse_localhost_uri() {
        let paths = parse_drop_payload("file://localhost/tmp/a.txt {file:///tmp/x%7Dy.txt}");
        assert_eq!(
            paths,
            vec![PathBuf::from("/tmp/a.txt"), PathBuf::from("/tmp/x}y.txt")]
        );
    }

    #[test]
    fn test_bare_paths_are_not_decoded() {
        let paths = parse_drop_payload("/tmp/100%25.txt");
        assert_eq!(paths, vec![PathBuf::from("/tmp/100%25.txt")]);
    }

    #[test]
    fn test_remote_uri_kept_as_given() {
        let paths = parse_drop_payload("file://server/share/a.txt");
        assert_eq!(paths, vec![PathBuf::from("file://server/share/a.txt")]);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1234), "1,234");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_failed_drop_keeps_text() {
        let mut doc = Document::new();
        doc.set_text("keep me");
        let report = doc.load_drop("/definitely/not/here.txt");
        assert_eq!(doc.text(), "keep me");
        assert_eq!(report.status(), "Drop failed: Not found: here.txt");
    }

    #[test]
    fn test_load_paths_keeps_braces_in_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd}name{.txt");
        fs::write(&path, "Braced.").unwrap();

        let mut doc = Document::new();
        let report = doc.load_paths(&[path]);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(doc.text(), "Braced.");
        assert_eq!(report.loaded[0].name, "odd}name{.txt");
    }

    #[test]
    fn test_typed_lines() {
        let mut doc = Document::new();
        doc.push_line("Hello there.");
        doc.push_line("  ");
        assert_eq!(doc.text(), "Hello there.");
        doc.clear();
        assert!(doc.is_empty());
    }
}
