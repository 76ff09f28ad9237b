//! Storage layout for taskgraph
//!
//! All persistent state lives under `.taskgraph/` at the workspace root:
//!
//! ```text
//! .taskgraph.toml               # Configuration (optional)
//! .taskgraph/
//!   tasks.json                  # Task registry snapshot
//!   relationships.jsonl         # One edge record per line
//!   rules.json                  # Priority rule registry
//!   activity.jsonl              # Append-only activity log
//!   notifications.jsonl         # Append-only notification records
//! ```
//!
//! Every graph computation reconstructs its input from these files at call
//! time; there is no shared in-memory graph. Edge reads are point-in-time
//! snapshots of `relationships.jsonl`.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Name of the data directory
pub const DATA_DIR: &str = ".taskgraph";

/// Name of the configuration file at the workspace root
pub const CONFIG_FILE: &str = ".taskgraph.toml";

/// Storage manager for taskgraph state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Workspace root (where `.taskgraph/` lives)
    root: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at the given workspace directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open storage for an already-initialized workspace
    ///
    /// Fails with `Error::NotInitialized` when `.taskgraph/` is absent.
    pub fn open(root: PathBuf) -> Result<Self> {
        let storage = Self::new(root);
        if !storage.is_initialized() {
            return Err(Error::NotInitialized(storage.root.clone()));
        }
        Ok(storage)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.taskgraph/` data directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path to the task registry
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join("tasks.json")
    }

    /// Path to the relationships file (JSONL format)
    pub fn relationships_file(&self) -> PathBuf {
        self.data_dir().join("relationships.jsonl")
    }

    /// Path to the priority rule registry
    pub fn rules_file(&self) -> PathBuf {
        self.data_dir().join("rules.json")
    }

    /// Path to the activity log (JSONL format)
    pub fn activity_file(&self) -> PathBuf {
        self.data_dir().join("activity.jsonl")
    }

    /// Path to the notifications file (JSONL format)
    pub fn notifications_file(&self) -> PathBuf {
        self.data_dir().join("notifications.jsonl")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the data directory and seed empty state files
    pub fn init_all(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir())?;

        for path in [self.relationships_file(), self.activity_file(), self.notifications_file()] {
            if !path.exists() {
                File::create(&path)?;
            }
        }

        Ok(())
    }

    /// Check whether the data directory exists
    pub fn is_initialized(&self) -> bool {
        self.data_dir().exists()
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON data atomically (temp file + rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Append a record to a JSONL file while holding its lock
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        let lock_path = lock_path_for(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;
        self.append_jsonl_unlocked(path, record)
    }

    /// Append a record to a JSONL file (caller holds the lock)
    pub fn append_jsonl_unlocked<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;

        Ok(())
    }

    /// Read all records from a JSONL file; a missing file is an empty list
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Rewrite a JSONL file with the given records while holding its lock
    pub fn write_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let lock_path = lock_path_for(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut buffer = Vec::new();
        for record in records {
            let json = serde_json::to_string(record)?;
            buffer.extend_from_slice(json.as_bytes());
            buffer.push(b'\n');
        }
        lock::write_atomic(path, &buffer)
    }

    /// Read, mutate, and atomically rewrite a JSON registry under its lock
    ///
    /// The registry is default-constructed when the file does not exist yet.
    pub fn update_registry<T, R, F>(&self, path: &Path, f: F) -> Result<R>
    where
        T: Default + Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let lock_path = lock_path_for(path);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut registry: T = if path.exists() {
            self.read_json(path)?
        } else {
            T::default()
        };

        let result = f(&mut registry)?;

        let json = serde_json::to_string_pretty(&registry)?;
        lock::write_atomic(path, json.as_bytes())?;

        Ok(result)
    }

    /// Read a JSON registry without taking the lock (point-in-time snapshot)
    pub fn read_registry<T: Default + DeserializeOwned>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        self.read_json(path)
    }
}

/// Lock file path for a data file
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}
