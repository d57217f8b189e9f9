//! # Save Target
//!
//! Where a finished PDF goes. [`DirectoryTarget`] writes into a directory
//! through a temporary file in that same directory and renames it into
//! place once every byte is on disk, so readers never observe a partial
//! PDF and a failed save leaves nothing behind.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::ExportError;

/// Delivers named PDF bytes to the user.
pub trait SaveTarget {
    /// Store `bytes` as `filename`, returning where they ended up.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Saves into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(sanitize_filename(filename));
        let save_err = |source| ExportError::Save {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(save_err)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".quoteform-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(save_err)?;
        debug!(temp = %temp.path().display(), "writing PDF");

        temp.write_all(bytes).map_err(save_err)?;
        temp.flush().map_err(save_err)?;
        // Dropping the handle on the error paths above deletes the temp file.
        temp.persist(&path).map_err(|e| save_err(e.error))?;

        info!(path = %path.display(), bytes = bytes.len(), "saved PDF");
        Ok(path)
    }
}

/// Make `name` safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Quotation-QUO-1.pdf"), "Quotation-QUO-1.pdf");
        assert_eq!(sanitize_filename("Quotation-a/b.pdf"), "Quotation-a_b.pdf");
        assert_eq!(sanitize_filename("Quotation-..\\x.pdf"), "Quotation-.._x.pdf");
        assert_eq!(sanitize_filename("a\nb"), "a_b");
        assert_eq!(sanitize_filename(".."), "_");
        assert_eq!(sanitize_filename(""), "_");
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path());
        let path = target.save("Quotation-Q1.pdf", b"%PDF-1.7").unwrap();
        assert_eq!(path, dir.path().join("Quotation-Q1.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path());
        target.save("Quotation-Q1.pdf", b"data").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("Quotation-Q1.pdf")]);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path());
        target.save("q.pdf", b"first").unwrap();
        let path = target.save("q.pdf", b"second").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("pdfs");
        let path = DirectoryTarget::new(&nested).save("q.pdf", b"x").unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_target_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let err = DirectoryTarget::new(&blocker).save("q.pdf", b"x").unwrap_err();
        match err {
            ExportError::Save { path, .. } => assert_eq!(path, blocker.join("q.pdf")),
            other => panic!("expected Save error, got {:?}", other),
        }
    }
}
