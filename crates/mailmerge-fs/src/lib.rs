//! Filesystem helpers for persisting generated documents and archives.
//!
//! Every artifact is written through [`atomic_write`]:
//! - write to a temp file in the destination directory (avoids cross-device renames)
//! - flush + `sync_all`
//! - persist over the destination with replace semantics
//!
//! A failed write therefore never leaves a truncated document behind for the packaging step.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicWriteError<E> {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("write error: {0}")]
    Writer(#[source] E),
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` is `Some("")` for bare file names like `letter.docx`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Atomically write `dest` with the bytes produced by `write_fn`.
///
/// Parent directories are created as needed. If `write_fn` fails, `dest` is left untouched and
/// the temp file is removed.
pub fn atomic_write<T, E>(
    dest: impl AsRef<Path>,
    write_fn: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, AtomicWriteError<E>> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let out = write_fn(tmp.as_file_mut()).map_err(AtomicWriteError::Writer)?;

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| AtomicWriteError::Io(err.error))?;

    // Directory fsync is best-effort; the file is already in place.
    let _ = File::open(dir).and_then(|d| d.sync_all());

    Ok(out)
}

/// Atomically write a full byte slice to `dest`.
pub fn atomic_write_bytes(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write(dest, |file| file.write_all(bytes)).map_err(|err| match err {
        AtomicWriteError::Io(err) | AtomicWriteError::Writer(err) => err,
    })
}

/// Create `dir` (and its parents) if needed and check that it is a directory.
pub fn prepare_output_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn atomic_write_bytes_creates_missing_parent_dirs() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dest = tmp.path().join("out").join("Sheet1_output_1.docx");

        atomic_write_bytes(&dest, b"PK").expect("atomic write");
        assert_eq!(fs::read(&dest).expect("read"), b"PK");
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dest = tmp.path().join("a.docx");
        fs::write(&dest, b"old").expect("seed");

        atomic_write_bytes(&dest, b"new").expect("atomic write");
        assert_eq!(fs::read(&dest).expect("read"), b"new");
        assert_eq!(file_names(tmp.path()), vec!["a.docx".to_string()]);
    }

    #[test]
    fn atomic_write_does_not_clobber_existing_file_on_writer_error() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let dest = tmp.path().join("existing.docx");
        fs::write(&dest, b"sentinel").expect("seed");

        let err = atomic_write(&dest, |file| {
            file.write_all(b"partial").expect("write temp");
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "simulated failure"))
        })
        .expect_err("writer error should propagate");
        assert!(matches!(err, AtomicWriteError::Writer(_)));

        assert_eq!(fs::read(&dest).expect("read"), b"sentinel");
        assert_eq!(file_names(tmp.path()), vec!["existing.docx".to_string()]);
    }

    #[test]
    fn prepare_output_dir_rejects_regular_files() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, b"x").expect("seed");

        assert!(prepare_output_dir(&file).is_err());
        prepare_output_dir(tmp.path().join("nested").join("out")).expect("create nested");
        assert!(tmp.path().join("nested").join("out").is_dir());
    }
}
