//! File-backed persistence for a ledger.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::bank::{
    Ledger,
    codec::{self, CodecError},
};

/// Errors raised while saving or loading the ledger file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Ledger file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Ledger file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

impl PersistenceError {
    fn from_codec(path: &Path, error: CodecError) -> Self {
        match error {
            CodecError::Io(source) => PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            },
            CodecError::Malformed(reason) => PersistenceError::Malformed {
                path: path.to_path_buf(),
                reason,
            },
        }
    }

    /// Whether the file was readable but failed validation.
    pub fn is_malformed(&self) -> bool {
        matches!(self, PersistenceError::Malformed { .. })
    }
}

/// The single durable location of a ledger.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Binds a storage to `path`. Nothing is touched until `save` or `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Storage { path: path.into() }
    }

    /// Gets the location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the ledger file with the current state.
    pub fn save(&self, ledger: &Ledger) -> Result<(), PersistenceError> {
        let file = fs::File::create(&self.path)
            .map_err(|source| self.io_error(source))?;
        codec::write_to(ledger, file)
            .map_err(|error| self.codec_error(error))?;
        info!(path = %self.path.display(), accounts = ledger.len(), "ledger saved");
        Ok(())
    }

    /// Reads the ledger file. A missing file means there is no prior state.
    pub fn load(&self) -> Result<Option<Ledger>, PersistenceError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no ledger file, starting empty");
                return Ok(None);
            }
            Err(source) => return Err(self.io_error(source)),
        };
        let ledger = codec::read_from(file)
            .map_err(|error| self.codec_error(error))?;
        info!(path = %self.path.display(), accounts = ledger.len(), "ledger loaded");
        Ok(Some(ledger))
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn codec_error(&self, error: CodecError) -> PersistenceError {
        PersistenceError::from_codec(&self.path, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{AccountType, types::FIRST_ACCOUNT_ID};

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("bank.dat"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("bank.dat"));
        let mut ledger = Ledger::new();
        let id = ledger.create("Alice", 800.0, AccountType::Savings).unwrap();
        storage.save(&ledger).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.find(id).unwrap().name(), "Alice");
        assert_eq!(loaded.next_id(), FIRST_ACCOUNT_ID + 1);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("bank.dat"));
        let mut ledger = Ledger::new();
        ledger.create("Alice", 800.0, AccountType::Savings).unwrap();
        ledger.create("Bob", 10.0, AccountType::Checking).unwrap();
        storage.save(&ledger).unwrap();

        storage.save(&Ledger::new()).unwrap();
        assert!(storage.load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.dat");
        fs::write(&path, [3, 0, 0, 0, 0xe9, 0x03, 0, 0]).unwrap();
        let error = Storage::new(&path).load().unwrap_err();
        assert!(error.is_malformed());
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing").join("bank.dat"));
        assert!(matches!(
            storage.save(&Ledger::new()),
            Err(PersistenceError::Io { .. })
        ));
    }
}
