//! Transaction counter persisted as a small text file
//!
//! The file holds the next id to hand out as decimal text. It is read when the
//! counter is opened and written once, by `commit`, after a successful run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::ports::IdAllocator;

#[derive(Debug)]
pub struct CounterFile {
    path: PathBuf,
    start: u64,
    next: u64,
}

impl CounterFile {
    /// Read the counter; a missing file starts at 0
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let start = read_counter(&path)?;
        debug!(path = %path.display(), start, "opened transaction counter");
        Ok(Self {
            path,
            start,
            next: start,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value the counter had when opened
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Persist the next id
    pub fn commit(self) -> Result<u64> {
        write_counter(&self.path, self.next)?;
        debug!(path = %self.path.display(), next = self.next, "committed transaction counter");
        Ok(self.next)
    }

    /// Overwrite the stored counter
    pub fn set(path: &Path, next: u64) -> Result<()> {
        write_counter(path, next)
    }
}

impl IdAllocator for CounterFile {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    fn peek(&self) -> u64 {
        self.next
    }
}

fn read_counter(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read counter file {}", path.display()))?;
    content
        .trim()
        .parse()
        .with_context(|| format!("Counter file {} does not hold a number", path.display()))
}

fn write_counter(path: &Path, next: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    // replace atomically
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, format!("{}\n", next))
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace counter file {}", path.display()))?;
    Ok(())
}
