//! Passphrase-based encryption of whole files.
//!
//! Encrypted files use the passphrase container layout from
//! [`crate::envelope`]. Decryption never creates the output file unless the
//! data authenticated.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::envelope::{open_with_passphrase, seal_with_passphrase, EnvelopeError};

/// Extension appended to encrypted files when no output path is given.
pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Number of random overwrite passes made by [`secure_delete`].
pub const WIPE_PASSES: usize = 3;

const WIPE_CHUNK_LEN: usize = 64 * 1024;

/// Errors produced by file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// Reading, writing or removing a file failed.
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output path names the input file, possibly through `..` or a
    /// symlink.
    #[error("output {path} resolves to the input file")]
    SameFile { path: PathBuf },

    /// Sealing or opening the file contents failed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Which way a file is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// Output path used when the caller does not supply one.
///
/// Encrypting appends `.enc` (`report.pdf` → `report.pdf.enc`); decrypting
/// drops the last extension (`report.pdf.enc` → `report.pdf`).
pub fn default_output_path(input: &Path, mode: Mode) -> PathBuf {
    match mode {
        Mode::Encrypt => {
            let mut name = input.as_os_str().to_owned();
            name.push(".");
            name.push(ENCRYPTED_EXTENSION);
            PathBuf::from(name)
        }
        Mode::Decrypt => input.with_extension(""),
    }
}

/// Whether `output` and `input` name the same file once resolved.
///
/// `input` must exist. `output` may not exist yet, in which case its parent
/// directory is resolved and joined with its file name. An output whose
/// parent cannot be resolved can never be the input.
///
/// # Errors
///
/// Returns [`FileError::Io`] if `input` cannot be resolved.
pub fn resolves_to_same_file(input: &Path, output: &Path) -> Result<bool, FileError> {
    let input = fs::canonicalize(input).map_err(|source| FileError::Io {
        op: "resolve",
        path: input.to_path_buf(),
        source,
    })?;

    if let Ok(resolved) = fs::canonicalize(output) {
        return Ok(resolved == input);
    }
    let Some(name) = output.file_name() else {
        return Ok(false);
    };
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok(fs::canonicalize(parent)
        .map(|dir| dir.join(name) == input)
        .unwrap_or(false))
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<(), FileError> {
    if resolves_to_same_file(input, output)? {
        return Err(FileError::SameFile {
            path: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Encrypt `input` into `output` under `passphrase`.
///
/// When `delete_original` is set the input is wiped with [`secure_delete`]
/// after the output has been written.
///
/// # Errors
///
/// Returns [`FileError::SameFile`] if `output` resolves to `input`, and
/// [`FileError::Io`] on any filesystem failure.
pub fn encrypt_file(
    input: &Path,
    output: &Path,
    passphrase: &[u8],
    delete_original: bool,
) -> Result<(), FileError> {
    ensure_distinct(input, output)?;
    let data = Zeroizing::new(read(input)?);
    let sealed = seal_with_passphrase(&data, passphrase)?;
    write(output, &sealed)?;
    info!(
        input_len = data.len(),
        output_len = sealed.len(),
        "file encrypted"
    );

    if delete_original {
        secure_delete(input)?;
    }
    Ok(())
}

/// Decrypt `input` into `output` using `passphrase`.
///
/// # Errors
///
/// Returns [`FileError::Envelope`] if the file is truncated, the passphrase is
/// wrong or the data was modified. The output file is not touched in that case.
/// Returns [`FileError::SameFile`] if `output` resolves to `input`.
pub fn decrypt_file(input: &Path, output: &Path, passphrase: &[u8]) -> Result<(), FileError> {
    ensure_distinct(input, output)?;
    let blob = read(input)?;
    let plaintext = Zeroizing::new(open_with_passphrase(&blob, passphrase)?);
    write(output, &plaintext)?;
    info!(
        input_len = blob.len(),
        output_len = plaintext.len(),
        "file decrypted"
    );
    Ok(())
}

/// Overwrite `path` with random bytes [`WIPE_PASSES`] times, syncing after
/// each pass, then remove it.
///
/// # Errors
///
/// Returns [`FileError::Io`] if the file cannot be opened, written or removed.
pub fn secure_delete(path: &Path) -> Result<(), FileError> {
    let io_err = |op: &'static str| {
        move |source| FileError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    };

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(io_err("open"))?;
    let len = file.metadata().map_err(io_err("stat"))?.len();

    let mut chunk = vec![0u8; WIPE_CHUNK_LEN];
    for pass in 0..WIPE_PASSES {
        file.seek(SeekFrom::Start(0)).map_err(io_err("seek"))?;
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(WIPE_CHUNK_LEN as u64) as usize;
            OsRng.fill_bytes(&mut chunk[..n]);
            file.write_all(&chunk[..n]).map_err(io_err("overwrite"))?;
            remaining -= n as u64;
        }
        file.sync_all().map_err(io_err("sync"))?;
        debug!(pass, len, "wipe pass complete");
    }
    drop(file);

    fs::remove_file(path).map_err(io_err("remove"))?;
    info!("original file wiped and removed");
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, FileError> {
    fs::read(path).map_err(|source| FileError::Io {
        op: "read",
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, data: &[u8]) -> Result<(), FileError> {
    fs::write(path, data).map_err(|source| FileError::Io {
        op: "write",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AeadError;
    use tempfile::TempDir;

    #[test]
    fn default_paths() {
        assert_eq!(
            default_output_path(Path::new("dir/report.pdf"), Mode::Encrypt),
            PathBuf::from("dir/report.pdf.enc")
        );
        assert_eq!(
            default_output_path(Path::new("dir/report.pdf.enc"), Mode::Decrypt),
            PathBuf::from("dir/report.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("notes"), Mode::Encrypt),
            PathBuf::from("notes.enc")
        );
    }

    #[test]
    fn aliased_output_with_delete_is_refused() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let input = dir.path().join("a.txt");
        let alias = dir.path().join("sub").join("..").join("a.txt");
        fs::write(&input, b"keep me").unwrap();

        let err = encrypt_file(&input, &alias, b"pw", true).unwrap_err();
        assert!(matches!(err, FileError::SameFile { .. }));
        assert_eq!(fs::read(&input).unwrap(), b"keep me");
    }

    #[test]
    fn aliased_output_on_decrypt_is_refused() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.enc");
        fs::write(&input, b"whatever").unwrap();
        let alias = dir.path().join(".").join("a.enc");

        let err = decrypt_file(&input, &alias, b"pw").unwrap_err();
        assert!(matches!(err, FileError::SameFile { .. }));
        assert_eq!(fs::read(&input).unwrap(), b"whatever");
    }

    #[test]
    fn same_file_resolution() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.txt");
        fs::write(&input, b"x").unwrap();

        assert!(resolves_to_same_file(&input, &input).unwrap());
        assert!(!resolves_to_same_file(&input, &dir.path().join("a.txt.enc")).unwrap());
        assert!(!resolves_to_same_file(&input, &dir.path().join("missing/a.txt")).unwrap());
        assert!(resolves_to_same_file(&dir.path().join("missing"), &input).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_output_is_same_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.txt");
        let link = dir.path().join("link.txt");
        fs::write(&input, b"x").unwrap();
        std::os::unix::fs::symlink(&input, &link).unwrap();

        assert!(resolves_to_same_file(&input, &link).unwrap());
    }

    #[test]
    fn encrypt_then_decrypt_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("plain.txt");
        let sealed = dir.path().join("plain.txt.enc");
        let restored = dir.path().join("restored.txt");
        fs::write(&input, b"the quick brown fox").unwrap();

        encrypt_file(&input, &sealed, b"pw", false).unwrap();
        assert!(input.exists());
        assert_ne!(fs::read(&sealed).unwrap(), b"the quick brown fox");

        decrypt_file(&sealed, &restored, b"pw").unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"the quick brown fox");
    }

    #[test]
    fn wrong_passphrase_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a");
        let sealed = dir.path().join("a.enc");
        let restored = dir.path().join("a.out");
        fs::write(&input, b"data").unwrap();
        encrypt_file(&input, &sealed, b"right", false).unwrap();

        let err = decrypt_file(&sealed, &restored, b"wrong").unwrap_err();
        assert!(matches!(
            err,
            FileError::Envelope(EnvelopeError::Aead(AeadError::AuthenticationFailed))
        ));
        assert!(!restored.exists());
    }

    #[test]
    fn delete_original_removes_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("secret.txt");
        let sealed = dir.path().join("secret.txt.enc");
        fs::write(&input, vec![7u8; 100_000]).unwrap();

        encrypt_file(&input, &sealed, b"pw", true).unwrap();
        assert!(!input.exists());
        assert!(sealed.exists());
    }

    #[test]
    fn secure_delete_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = secure_delete(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, FileError::Io { op: "open", .. }));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = encrypt_file(
            &dir.path().join("missing"),
            &dir.path().join("out"),
            b"pw",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, FileError::Io { op: "resolve", .. }));
    }
}
