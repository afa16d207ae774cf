use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;
use crate::index::{DocId, DocSet};

/// Document id → content location. Its key set is the search universe.
///
/// Kept independent from the index's own document set: a document may be
/// registered without having been indexed, and the other way round.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    paths: HashMap<DocId, PathBuf>,
}

impl DocumentRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn register<P: Into<PathBuf>>(&mut self, doc_id: impl Into<DocId>, path: P) {
        self.paths.insert(doc_id.into(), path.into());
    }

    /// Register every regular file directly inside `dir` under its file stem.
    /// Returns the registered (id, path) pairs in directory-walk order.
    pub fn scan_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<Vec<(DocId, PathBuf)>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() { continue; }
            let p = entry.path();
            let Some(stem) = p.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(path = %p.display(), "skipping file with non UTF-8 name");
                continue;
            };
            self.register(stem, p);
            found.push((stem.to_string(), p.to_path_buf()));
        }
        tracing::info!(dir = %dir.as_ref().display(), registered = found.len(), "scanned document directory");
        Ok(found)
    }

    /// The universe, built fresh for each caller.
    pub fn ids(&self) -> DocSet { self.paths.keys().cloned().collect() }

    pub fn path(&self, doc_id: &str) -> Option<&Path> { self.paths.get(doc_id).map(PathBuf::as_path) }

    pub fn contains(&self, doc_id: &str) -> bool { self.paths.contains_key(doc_id) }

    pub fn len(&self) -> usize { self.paths.len() }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    /// Full document text, decoded lossily.
    pub fn read_text(&self, doc_id: &str) -> Result<Option<String>> {
        self.path(doc_id).map(read_lossy).transpose()
    }

    /// At most `max_chars` characters of the document, with `...` appended when cut.
    pub fn excerpt(&self, doc_id: &str, max_chars: usize) -> Result<Option<String>> {
        self.path(doc_id).map(|p| excerpt_file(p, max_chars)).transpose()
    }
}

pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Excerpt straight from a file, for callers that resolved the path earlier.
pub fn excerpt_file(path: &Path, max_chars: usize) -> Result<String> {
    Ok(truncate_chars(&read_lossy(path)?, max_chars))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_registers_file_stems() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("101.txt"), "hello").unwrap();
        fs::write(dir.path().join("102.txt"), "world").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("103.txt"), "nested").unwrap();

        let mut reg = DocumentRegistry::new();
        let found = reg.scan_dir(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        let ids: Vec<_> = reg.ids().into_iter().collect();
        assert_eq!(ids, vec!["101".to_string(), "102".to_string()]);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "新闻内容很长").unwrap();
        let mut reg = DocumentRegistry::new();
        reg.register("a", &path);
        assert_eq!(reg.excerpt("a", 2).unwrap().as_deref(), Some("新闻..."));
        assert_eq!(reg.excerpt("a", 50).unwrap().as_deref(), Some("新闻内容很长"));
    }

    #[test]
    fn unknown_document_has_no_excerpt() {
        let reg = DocumentRegistry::new();
        assert!(reg.excerpt("missing", 10).unwrap().is_none());
    }
}
