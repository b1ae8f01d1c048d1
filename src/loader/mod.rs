//! Loaders that populate a `Workspace` from input files.

use std::path::Path;

use tracing::info;

use crate::core::module::LoadedModule;
use crate::error::Result;
use crate::workspace::Workspace;

pub mod pe;
pub mod shellcode;

pub use pe::{load_pe, pe_mode};
pub use shellcode::load_shellcode;

/// Read the PE file at `path` and load it into `ws`.
///
/// The module is named after the file name.
pub fn load_file<P: AsRef<Path>>(ws: &mut Workspace, path: P) -> Result<LoadedModule> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let module = load_pe(ws, &name, &data)?;
    info!(module = %module, "loaded");
    Ok(module)
}
