use crate::error::{Result, SearchError};
use crate::InvertedIndex;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

impl SnapshotFormat {
    /// `.bin` selects bincode; anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("bin") => SnapshotFormat::Bincode,
            _ => SnapshotFormat::Json,
        }
    }
}

/// The `meta.json` sidecar that sits next to a snapshot file.
pub fn meta_path(snapshot: &Path) -> PathBuf {
    snapshot.with_file_name("meta.json")
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Write the whole index as a single snapshot.
pub fn save_snapshot(path: &Path, index: &InvertedIndex) -> Result<()> {
    ensure_parent(path)?;
    let f = File::create(path)?;
    let mut w = BufWriter::new(f);
    match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::to_writer(&mut w, index)?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut w, index)?,
    }
    w.flush()?;
    tracing::info!(path = %path.display(), num_docs = index.num_docs(), num_terms = index.num_terms(), "snapshot saved");
    Ok(())
}

/// Read and validate a snapshot. Nothing is returned unless the whole record is consistent.
pub fn load_snapshot(path: &Path) -> Result<InvertedIndex> {
    let f = File::open(path)?;
    let mut buf = Vec::new();
    BufReader::new(f).read_to_end(&mut buf)?;
    let index: InvertedIndex = match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::from_slice(&buf)?,
        SnapshotFormat::Bincode => bincode::deserialize(&buf)?,
    };
    index.validate().map_err(SearchError::Format)?;
    tracing::info!(path = %path.display(), num_docs = index.num_docs(), num_terms = index.num_terms(), "snapshot loaded");
    Ok(index)
}

pub fn save_meta(path: &Path, meta: &MetaFile) -> Result<()> {
    ensure_parent(path)?;
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(path: &Path) -> Result<MetaFile> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> InvertedIndex {
        let mut idx = InvertedIndex::new();
        for (term, doc) in [("搜索", "1"), ("engine", "1"), ("engine", "2"), ("engine", "2")] {
            idx.add_term(term, doc);
        }
        idx
    }

    #[test]
    fn json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iitable.json");
        let idx = sample();
        save_snapshot(&path, &idx).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), idx);
    }

    #[test]
    fn bincode_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("iitable.bin");
        let idx = sample();
        save_snapshot(&path, &idx).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), idx);
    }

    #[test]
    fn reads_original_dump_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iitable.json.dat");
        fs::write(
            &path,
            r#"{"docids": ["a", "b"], "table": {"x": {"freq": 3, "df": 2, "postings": {"a": {"tf": 2}, "b": {"tf": 1}}}}}"#,
        )
        .unwrap();
        let idx = load_snapshot(&path).unwrap();
        assert_eq!(idx.num_docs(), 2);
        assert_eq!(idx.term_info("x").postings["a"].term_frequency, 2);
    }

    #[test]
    fn missing_table_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"docids": ["a"]}"#).unwrap();
        assert!(matches!(load_snapshot(&path), Err(SearchError::Format(_))));
    }

    #[test]
    fn inconsistent_counts_are_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"docids": ["a"], "table": {"x": {"freq": 1, "df": 1, "postings": {"zzz": {"tf": 1}}}}}"#,
        )
        .unwrap();
        assert!(matches!(load_snapshot(&path), Err(SearchError::Format(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load_snapshot(&dir.path().join("none.json")), Err(SearchError::Io(_))));
    }

    #[test]
    fn meta_round_trip() {
        let dir = tempdir().unwrap();
        let path = meta_path(&dir.path().join("iitable.json"));
        let meta = MetaFile { num_docs: 2, num_terms: 5, created_at: "2024-01-01T00:00:00Z".into(), version: SNAPSHOT_VERSION };
        save_meta(&path, &meta).unwrap();
        let back = load_meta(&path).unwrap();
        assert_eq!(back.num_terms, 5);
        assert_eq!(back.created_at, meta.created_at);
    }
}
