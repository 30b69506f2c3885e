//! Bundles generated documents into a single zip.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mailmerge_fs::{atomic_write, AtomicWriteError};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<AtomicWriteError<ArchiveError>> for ArchiveError {
    fn from(err: AtomicWriteError<ArchiveError>) -> Self {
        match err {
            AtomicWriteError::Io(err) => ArchiveError::Io(err),
            AtomicWriteError::Writer(err) => err,
        }
    }
}

/// Write every existing file in `paths` into a zip at `dest`, named by its file name, in order.
///
/// Paths that no longer exist are skipped, as are later files whose name is already taken.
/// Entry timestamps are fixed so equal inputs give equal archives. Returns the number of entries.
pub fn write_archive(paths: &[PathBuf], dest: &Path) -> Result<usize, ArchiveError> {
    Ok(atomic_write(dest, |file| write_entries(file, paths))?)
}

fn write_entries(file: &mut File, paths: &[PathBuf]) -> Result<usize, ArchiveError> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut seen = HashSet::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            log::warn!("skipping {}: no file name", path.display());
            continue;
        };
        if !path.is_file() {
            log::warn!("skipping {}: not found", path.display());
            continue;
        }
        if !seen.insert(name.clone()) {
            log::warn!("skipping {}: duplicate entry {name}", path.display());
            continue;
        }
        let bytes = std::fs::read(path)?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;
    }
    zip.finish()?;
    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).unwrap();
                (file.name().to_string(), bytes)
            })
            .collect()
    }

    #[test]
    fn entries_are_basenames_in_order_and_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("Sheet1_output_1.docx");
        let b = dir.path().join("nested").join("Sheet2_output_1.docx");
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();
        let missing = dir.path().join("gone.docx");

        let dest = dir.path().join("output_documents.zip");
        let count = write_archive(&[b.clone(), missing, a.clone()], &dest).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            entries(&dest),
            vec![
                ("Sheet2_output_1.docx".to_string(), b"second".to_vec()),
                ("Sheet1_output_1.docx".to_string(), b"first".to_vec()),
            ]
        );
    }

    #[test]
    fn duplicate_names_keep_the_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("x").join("same.docx");
        let b = dir.path().join("y").join("same.docx");
        for (path, body) in [(&a, "a"), (&b, "b")] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        let dest = dir.path().join("out.zip");
        assert_eq!(write_archive(&[a, b], &dest).unwrap(), 1);
        assert_eq!(entries(&dest), vec![("same.docx".to_string(), b"a".to_vec())]);
    }

    #[test]
    fn archives_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.docx");
        std::fs::write(&a, b"payload").unwrap();
        let first = dir.path().join("1.zip");
        let second = dir.path().join("2.zip");
        write_archive(std::slice::from_ref(&a), &first).unwrap();
        write_archive(std::slice::from_ref(&a), &second).unwrap();
        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }
}
