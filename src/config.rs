//! Configuration for workspaces and the emulator bootstrap.
//!
//! Provides serde-backed configuration structs with sensible defaults that
//! can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::disasm::registry::BackendKind;
use crate::error::{LancelotError, Result};

/// Default stack pointer installed by the emulator bootstrap.
pub const DEFAULT_STACK_ADDRESS: u64 = 0x6969_0000;

/// Default size of the emulator stack region.
pub const DEFAULT_STACK_SIZE: u64 = 0x40000;

/// Master configuration for a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Architecture name ("x86").
    pub arch: String,
    /// Mode name ("32" or "64").
    pub mode: String,
    /// Decode engine to use.
    pub backend: BackendKind,
    /// Rendering options for disassembly listings.
    pub display: DisplayOptions,
    /// Emulator bootstrap options.
    pub emulator: EmulatorConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            arch: "x86".to_string(),
            mode: "32".to_string(),
            backend: BackendKind::default(),
            display: DisplayOptions::default(),
            emulator: EmulatorConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Configuration for the given arch/mode names with all other options defaulted.
    pub fn new(arch: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            mode: mode.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from a JSON document. Missing fields take defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| LancelotError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to a pretty JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LancelotError::Config(e.to_string()))
    }
}

/// Rendering options for disassembly listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Number of opcode bytes shown before eliding.
    pub num_opcode_bytes: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            num_opcode_bytes: 8,
        }
    }
}

/// Emulator bootstrap options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Initial stack pointer; the stack region is centered on it.
    pub stack_address: u64,
    /// Size of the stack region in bytes.
    pub stack_size: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            stack_address: DEFAULT_STACK_ADDRESS,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}
