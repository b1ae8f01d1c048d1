//! Execution sandbox bootstrap.
//!
//! An `Emulator` is an independently owned execution context: its own copy of
//! the workspace memory plus a register file. `bootstrap` replays every
//! workspace region into a fresh context and installs a stack, returning the
//! context only once every step has succeeded.

use tracing::debug;

use crate::config::EmulatorConfig;
use crate::core::address::VA;
use crate::core::address_space::{AddressSpace, MemoryRegion, SimpleAddressSpace};
use crate::core::disassembler::{Arch, Mode};
use crate::error::{LancelotError, Result};
use crate::workspace::Workspace;

pub mod reg;

pub use reg::Registers;

/// Name of the region the bootstrap maps for the initial stack.
pub const STACK_REGION_NAME: &str = "stack";

/// Minimal capability set the bootstrap needs from an execution context.
pub trait ExecutionContext {
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()>;
    fn write(&mut self, address: VA, data: &[u8]) -> Result<()>;
    fn set_stack_pointer(&mut self, address: VA);
}

/// Execution context with private memory and registers.
#[derive(Debug, Clone)]
pub struct Emulator {
    arch: Arch,
    mode: Mode,
    mem: SimpleAddressSpace,
    pub reg: Registers,
}

impl Emulator {
    /// An empty context: no memory mapped, all registers zero.
    pub fn new(arch: Arch, mode: Mode) -> Self {
        Self {
            arch,
            mode,
            mem: SimpleAddressSpace::new(),
            reg: Registers::default(),
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn program_counter(&self) -> VA {
        VA(self.reg.pc(self.mode))
    }

    pub fn set_program_counter(&mut self, address: VA) {
        self.reg.set_pc(self.mode, address.0);
    }

    pub fn stack_pointer(&self) -> VA {
        VA(self.reg.sp(self.mode))
    }
}

impl AddressSpace for Emulator {
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()> {
        self.mem.map(address, length, name)
    }

    fn unmap(&mut self, address: VA, length: u64) -> Result<()> {
        self.mem.unmap(address, length)
    }

    fn read(&self, address: VA, length: u64) -> Result<Vec<u8>> {
        self.mem.read(address, length)
    }

    fn write(&mut self, address: VA, data: &[u8]) -> Result<()> {
        self.mem.write(address, data)
    }

    fn list_regions(&self) -> Vec<MemoryRegion> {
        self.mem.list_regions()
    }

    fn find_region(&self, address: VA) -> Option<MemoryRegion> {
        self.mem.find_region(address)
    }
}

impl ExecutionContext for Emulator {
    fn map(&mut self, address: VA, length: u64, name: &str) -> Result<()> {
        AddressSpace::map(self, address, length, name)
    }

    fn write(&mut self, address: VA, data: &[u8]) -> Result<()> {
        AddressSpace::write(self, address, data)
    }

    fn set_stack_pointer(&mut self, address: VA) {
        self.reg.set_sp(self.mode, address.0);
    }
}

/// Mirror `ws` into `ctx` and install the initial stack.
///
/// Every workspace region is mapped under the same name, address and length,
/// then filled with the workspace's current bytes. The stack region of
/// `config.stack_size` bytes is centered on `config.stack_address`, which
/// becomes the stack pointer. On any failure `ctx` is dropped and the error
/// is returned.
pub fn bootstrap<E: ExecutionContext>(ws: &Workspace, mut ctx: E, config: &EmulatorConfig) -> Result<E> {
    for region in ws.list_regions() {
        debug!(name = %region.name, address = %region.address, length = region.length, "emu: replicate region");
        ctx.map(region.address, region.length, &region.name)?;
        let data = ws.read(region.address, region.length)?;
        ctx.write(region.address, &data)?;
    }

    let stack_pointer = VA(config.stack_address);
    let stack_base = stack_pointer
        .checked_sub(config.stack_size / 2)
        .ok_or(LancelotError::AddressOverflow {
            address: stack_pointer,
            offset: config.stack_size / 2,
        })?;
    debug!(base = %stack_base, size = config.stack_size, sp = %stack_pointer, "emu: map stack");
    ctx.map(stack_base, config.stack_size, STACK_REGION_NAME)?;
    ctx.set_stack_pointer(stack_pointer);

    Ok(ctx)
}
