//! The Workspace: aggregate root of an analysis session.
//!
//! A workspace owns one address space, the list of regions mapped into it,
//! the loaded module registry, the architecture/mode tags and the decode
//! engine. Loaders populate it through the `AddressSpace` methods and
//! `add_loaded_module`; analyses read from it and decode through it.

use std::fmt;
use tracing::{debug, trace};

use crate::config::{DisplayOptions, WorkspaceConfig};
use crate::core::address::{RVA, VA};
use crate::core::address_space::{AddressSpace, MemoryRegion, SimpleAddressSpace};
use crate::core::disassembler::{Arch, Disassembler, Mode};
use crate::core::instruction::Instruction;
use crate::core::module::LoadedModule;
use crate::disasm::registry;
use crate::emu::{self, Emulator};
use crate::error::{LancelotError, Result};

/// Number of bytes fetched for a single decode.
pub const MAX_INSN_SIZE: u64 = 0x10;

pub struct Workspace {
    address_space: SimpleAddressSpace,
    arch: Arch,
    mode: Mode,
    loaded_modules: Vec<LoadedModule>,
    memory_regions: Vec<MemoryRegion>,
    disassembler: Box<dyn Disassembler>,
    config: WorkspaceConfig,
}

impl Workspace {
    /// Create an empty workspace decoding with the default backend.
    pub fn new(arch: Arch, mode: Mode) -> Result<Self> {
        Self::from_config(&WorkspaceConfig::new(arch.to_string(), mode.to_string()))
    }

    /// Create an empty workspace from configuration.
    ///
    /// Fails with `InvalidArch`/`InvalidMode` if the names are not supported.
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        let arch: Arch = config.arch.parse()?;
        let mode: Mode = config.mode.parse()?;
        let backend = registry::for_arch_with(arch, mode, Some(config.backend))
            .map_err(|e| LancelotError::InvalidArch(format!("{} ({})", arch, e)))?;
        let mut ws = Self::with_disassembler(arch, mode, Box::new(backend))?;
        ws.config = config.clone();
        Ok(ws)
    }

    /// Create an empty workspace around an explicitly provided decode engine.
    ///
    /// The engine must decode the requested arch and mode.
    pub fn with_disassembler(
        arch: Arch,
        mode: Mode,
        disassembler: Box<dyn Disassembler>,
    ) -> Result<Self> {
        if disassembler.arch() != arch {
            return Err(LancelotError::InvalidArch(format!(
                "{} requested but {} decodes {}",
                arch,
                disassembler.name(),
                disassembler.arch()
            )));
        }
        if disassembler.mode() != mode {
            return Err(LancelotError::InvalidMode(format!(
                "{} requested but {} decodes {}",
                mode,
                disassembler.name(),
                disassembler.mode()
            )));
        }
        debug!(%arch, %mode, engine = disassembler.name(), "workspace created");

        Ok(Self {
            address_space: SimpleAddressSpace::new(),
            arch,
            mode,
            loaded_modules: Vec::new(),
            memory_regions: Vec::new(),
            disassembler,
            config: WorkspaceConfig::new(arch.to_string(), mode.to_string()),
        })
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn display_options(&self) -> &DisplayOptions {
        &self.config.display
    }

    pub fn disassembler(&self) -> &dyn Disassembler {
        self.disassembler.as_ref()
    }

    /// Register a module. Mapping its memory is the loader's job.
    pub fn add_loaded_module(&mut self, module: LoadedModule) {
        debug!(module = %module, "module loaded");
        self.loaded_modules.push(module);
    }

    /// Loaded modules in load order.
    pub fn modules(&self) -> &[LoadedModule] {
        &self.loaded_modules
    }

    pub fn module_by_name(&self, name: &str) -> Option<&LoadedModule> {
        self.loaded_modules.iter().find(|m| m.name == name)
    }

    /// Read bytes relative to a module's base.
    pub fn read_relative(&self, module: &LoadedModule, rva: RVA, length: u64) -> Result<Vec<u8>> {
        self.read(module.va(rva)?, length)
    }

    /// Write bytes relative to a module's base.
    pub fn write_relative(&mut self, module: &LoadedModule, rva: RVA, data: &[u8]) -> Result<()> {
        let va = module.va(rva)?;
        self.write(va, data)
    }

    /// Read a machine-word-sized little-endian pointer at `va`.
    pub fn read_pointer(&self, va: VA) -> Result<VA> {
        match self.mode {
            Mode::Bits32 => Ok(VA(self.read_u32(va)? as u64)),
            Mode::Bits64 => Ok(VA(self.read_u64(va)?)),
        }
    }

    /// Read a machine-word-sized pointer at `module.base + rva`.
    pub fn read_pointer_relative(&self, module: &LoadedModule, rva: RVA) -> Result<VA> {
        self.read_pointer(module.va(rva)?)
    }

    /// Decode exactly one instruction anchored at `va`.
    ///
    /// The fetch is clamped to the end of the containing region, so an
    /// instruction running past the region boundary fails to decode.
    pub fn decode_one(&self, va: VA) -> Result<Instruction> {
        let region = self
            .address_space
            .find_region(va)
            .ok_or_else(|| LancelotError::Decode {
                address: va,
                reason: "address is not mapped".to_string(),
            })?;
        let length = MAX_INSN_SIZE.min(region.end() - va.0);
        let buf = self.read(va, length).map_err(|e| LancelotError::Decode {
            address: va,
            reason: e.to_string(),
        })?;

        self.disassembler
            .disassemble_instruction(va, &buf)
            .map_err(|e| LancelotError::Decode {
                address: va,
                reason: e.to_string(),
            })
    }

    /// Length in bytes of the instruction at `va`.
    pub fn instruction_length(&self, va: VA) -> Result<u64> {
        Ok(self.decode_one(va)?.length as u64)
    }

    /// Linearly disassemble the byte window `[va, va+length)`.
    ///
    /// Stops early at the first undecodable instruction.
    pub fn disassemble(&self, va: VA, length: u64) -> Result<Vec<Instruction>> {
        let buf = self.read(va, length)?;
        Ok(self.disassembler.disassemble(va, &buf, usize::MAX))
    }

    /// Log the memory map at debug level.
    pub fn dump_memory_regions(&self) {
        debug!("=== memory map ===");
        for region in &self.memory_regions {
            debug!(
                name = %region.name,
                address = %region.address,
                length = region.length,
                "region"
            );
        }
    }

    /// Build an emulator mirroring this workspace's memory, using the configured stack.
    pub fn get_emulator(&self) -> Result<Emulator> {
        emu::bootstrap(
            self,
            Emulator::new(self.arch, self.mode),
            &self.config.emulator,
        )
    }
}

impl AddressSpace for Workspace {
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()> {
        self.address_space.map(address, length, name)?;
        trace!(name, address = %address, length, "workspace map");
        self.memory_regions
            .push(MemoryRegion::new(name, address, length));
        Ok(())
    }

    fn unmap(&mut self, address: VA, length: u64) -> Result<()> {
        self.address_space.unmap(address, length)?;
        self.memory_regions
            .retain(|r| !(r.address == address && r.length == length));
        Ok(())
    }

    fn read(&self, address: VA, length: u64) -> Result<Vec<u8>> {
        self.address_space.read(address, length)
    }

    fn write(&mut self, address: VA, data: &[u8]) -> Result<()> {
        self.address_space.write(address, data)
    }

    fn list_regions(&self) -> Vec<MemoryRegion> {
        self.memory_regions.clone()
    }

    fn find_region(&self, address: VA) -> Option<MemoryRegion> {
        self.address_space.find_region(address)
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("arch", &self.arch)
            .field("mode", &self.mode)
            .field("engine", &self.disassembler.name())
            .field("modules", &self.loaded_modules)
            .field("regions", &self.memory_regions)
            .finish()
    }
}
