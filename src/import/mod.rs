//! Import of pasted spreadsheet text into entries
//!
//! Both rosters arrive as tab-separated text copied from a spreadsheet, with
//! one header row.

pub mod parser;

pub use parser::*;

use serde::{Deserialize, Serialize};

/// Default number of bank rows built between progress reports
pub const DEFAULT_CHUNK_SIZE: usize = 80;

/// How incomplete registration rows are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Drop rows without a name, a positive amount or tail digits
    #[default]
    Strict,
    /// Keep every row, defaulting missing fields; such rows never match
    Loose,
}

/// Import settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub mode: ImportMode,
    /// Bank rows per chunk during bulk import
    pub chunk_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            mode: ImportMode::Strict,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Zero is treated as one
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Bulk import progress, reported after each chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
}

impl ImportProgress {
    /// Whole percent done, 100 when there is nothing to do
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100 + self.total / 2) / self.total) as u8
    }
}
