//! Raw shellcode loader.

use tracing::debug;

use crate::core::address::VA;
use crate::core::address_space::AddressSpace;
use crate::core::module::LoadedModule;
use crate::error::{LancelotError, Result};
use crate::workspace::Workspace;

/// Name of the single region created for a shellcode blob.
pub const RAW_REGION_NAME: &str = "raw";

/// Map `data` verbatim at `base` and register it as a module entered at `base`.
pub fn load_shellcode(ws: &mut Workspace, name: &str, base: VA, data: &[u8]) -> Result<LoadedModule> {
    if data.is_empty() {
        return Err(LancelotError::InvalidLength { address: base });
    }
    debug!(name, base = %base, length = data.len(), "shellcode: load");
    ws.map(base, data.len() as u64, RAW_REGION_NAME)?;
    ws.write(base, data)?;

    let module = LoadedModule::new(name, base, base);
    ws.add_loaded_module(module.clone());
    Ok(module)
}
