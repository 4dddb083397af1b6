//! Wallet persistence layer
//!
//! Saves and restores a snapshot in a single file. The file starts with a hex
//! SHA-256 checksum line followed by the pretty-printed JSON state, so a torn
//! or edited file is rejected on load. Anything that must change together
//! belongs in one [`Snapshot`], since each save is one atomic rename.

use crate::multisig::WalletState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Checksum mismatch: snapshot is corrupted")]
    Corrupted,
}

/// State that can be saved as one checksummed file
pub trait Snapshot: Serialize + DeserializeOwned {
    /// Re-derive the invariants a loaded snapshot must satisfy
    fn check_invariants(&self) -> Result<(), String>;
}

impl Snapshot for WalletState {
    fn check_invariants(&self) -> Result<(), String> {
        WalletState::check_invariants(self)
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            state_file: "wallet.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Wallet storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save a snapshot to disk
    pub fn save<T: Snapshot>(&self, state: &T) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        let body = serde_json::to_vec_pretty(state)?;
        let checksum = hex::encode(Sha256::digest(&body));

        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.state_file));
        {
            let file = fs::File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{}", checksum)?;
            writer.write_all(&body)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::info!("Saved snapshot ({} bytes) to {:?}", body.len(), path);
        Ok(())
    }

    /// Load a snapshot from disk
    pub fn load<T: Snapshot>(&self) -> Result<T, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Wallet state file not found".to_string(),
            ));
        }

        let state = read_snapshot(&path)?;
        log::info!("Loaded snapshot from {:?}", path);
        Ok(state)
    }

    /// Check if a saved wallet exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved wallet
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        if self.config.max_backups == 0 {
            return Ok(());
        }

        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup<T: Snapshot>(&self, backup_index: usize) -> Result<T, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_snapshot(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|&i| self.backup_path(i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.state_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Read and verify a snapshot file
fn read_snapshot<T: Snapshot>(path: &Path) -> Result<T, StorageError> {
    let contents = fs::read(path)?;
    let split = contents
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| StorageError::InvalidData("missing checksum header".to_string()))?;
    let (header, body) = (&contents[..split], &contents[split + 1..]);

    let expected = std::str::from_utf8(header)
        .map_err(|_| StorageError::InvalidData("checksum header is not UTF-8".to_string()))?
        .trim();
    if hex::encode(Sha256::digest(body)) != expected {
        return Err(StorageError::Corrupted);
    }

    let state: T = serde_json::from_slice(body)?;
    state.check_invariants().map_err(StorageError::InvalidData)?;
    Ok(state)
}

/// Export the wallet state to a specific file path
pub fn save_to_file(state: &WalletState, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, state)?;
    Ok(())
}

/// Import a wallet state from a specific file path
pub fn load_from_file(path: &Path) -> Result<WalletState, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let state: WalletState = serde_json::from_reader(reader)?;
    state.check_invariants().map_err(StorageError::InvalidData)?;
    Ok(state)
}
