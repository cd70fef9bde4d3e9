//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Projects recognised in corpus paths, used to label documents
pub const DEFAULT_KNOWN_PROJECTS: &[&str] = &[
    "amaranth",
    "Icarus_verilog",
    "klayout",
    "qflow",
    "OpenROAD",
    "OpenSTA",
    "OpenROAD_flow_script",
    "verilator",
    "yosys_hq",
];

/// What to do with a segment whose validation retries ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedPolicy {
    /// Drop the segment; nothing is written
    #[default]
    Skip,
    /// Write one record with every required field set to null
    Placeholder,
    /// Stop the run after the current segment
    Abort,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum segment size (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by adjacent segments
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Attempts per segment before a validation failure is final
    #[serde(default = "default_max_validation_retries")]
    pub max_validation_retries: u32,

    /// Path substrings that identify a document's source project
    #[serde(default = "default_known_projects")]
    pub known_projects: Vec<String>,

    /// Directory receiving the JSONL output files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Seed for the segment shuffle; random when unset
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Segments processed at the same time (1 = strictly sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Policy for segments that exhaust their validation retries
    #[serde(default)]
    pub on_exhausted: ExhaustedPolicy,
}

fn default_chunk_size() -> usize {
    4096
}

fn default_chunk_overlap() -> usize {
    512
}

fn default_max_validation_retries() -> u32 {
    3
}

fn default_known_projects() -> Vec<String> {
    DEFAULT_KNOWN_PROJECTS.iter().map(|s| s.to_string()).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./dataset")
}

fn default_workers() -> usize {
    1
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.max_validation_retries == 0 {
            return Err("max_validation_retries must be greater than 0".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.known_projects.iter().any(|p| p.is_empty()) {
            return Err("known_projects must not contain empty names".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    /// 4096-character segments, 512 overlap, 3 attempts, sequential, skip on exhaustion
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_validation_retries: default_max_validation_retries(),
            known_projects: default_known_projects(),
            output_dir: default_output_dir(),
            shuffle_seed: None,
            workers: default_workers(),
            on_exhausted: ExhaustedPolicy::default(),
        }
    }
}
