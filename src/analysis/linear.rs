//! Linear disassembly exploration.
//!
//! Starting from a single address, this pass discovers every instruction
//! reachable by fall-through and directly-encoded branch targets, without
//! executing code and without resolving indirect jumps or calls. Calls are
//! reported as edges but never followed. Each decoded instruction and each
//! discovered edge is reported to the registered trace handlers.
//!
//! The walk uses an explicit work stack and a visited set keyed by
//! instruction start address, so back-edges terminate and overlapping
//! decodes at different offsets are each explored once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};

use crate::core::address::VA;
use crate::core::instruction::Instruction;
use crate::error::{LancelotError, Result};
use crate::workspace::Workspace;

/// Kind of control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JumpKind {
    /// Unconditional direct jump
    Jump,
    /// Taken arm of a conditional branch
    ConditionalBranch,
    /// Direct call; recorded, never followed
    Call,
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpKind::Jump => write!(f, "jump"),
            JumpKind::ConditionalBranch => write!(f, "conditional-branch"),
            JumpKind::Call => write!(f, "call"),
        }
    }
}

/// An outgoing edge discovered during one exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JumpTarget {
    pub va: VA,
    pub kind: JumpKind,
}

/// Observer invoked once per newly decoded instruction.
pub trait InstructionTraceHandler {
    fn on_instruction(&mut self, va: VA, insn: &Instruction) -> anyhow::Result<()>;
}

/// Observer invoked once per discovered outgoing edge.
pub trait JumpTraceHandler {
    fn on_jump(&mut self, va: VA, insn: &Instruction, target: JumpTarget) -> anyhow::Result<()>;
}

impl<F> InstructionTraceHandler for F
where
    F: FnMut(VA, &Instruction) -> anyhow::Result<()>,
{
    fn on_instruction(&mut self, va: VA, insn: &Instruction) -> anyhow::Result<()> {
        self(va, insn)
    }
}

impl<F> JumpTraceHandler for F
where
    F: FnMut(VA, &Instruction, JumpTarget) -> anyhow::Result<()>,
{
    fn on_jump(&mut self, va: VA, insn: &Instruction, target: JumpTarget) -> anyhow::Result<()> {
        self(va, insn, target)
    }
}

/// Outcome of one exploration run.
#[derive(Debug)]
pub struct Exploration {
    /// Address the run started from
    pub start: VA,
    /// Start addresses of every decoded instruction
    pub visited: BTreeSet<VA>,
    /// Addresses that were reached but could not be explored, with the reason
    pub failures: BTreeMap<VA, LancelotError>,
    /// Number of edges reported to jump handlers
    pub edges: usize,
}

impl Exploration {
    fn new(start: VA) -> Self {
        Self {
            start,
            visited: BTreeSet::new(),
            failures: BTreeMap::new(),
            edges: 0,
        }
    }

    pub fn instruction_count(&self) -> usize {
        self.visited.len()
    }
}

/// Branch-following disassembler with ordered trace handler lists.
#[derive(Default)]
pub struct LinearDisassembler<'h> {
    instruction_handlers: Vec<Box<dyn InstructionTraceHandler + 'h>>,
    jump_handlers: Vec<Box<dyn JumpTraceHandler + 'h>>,
}

impl<'h> LinearDisassembler<'h> {
    pub fn new() -> Self {
        Self {
            instruction_handlers: Vec::new(),
            jump_handlers: Vec::new(),
        }
    }

    /// Register a closure invoked for every decoded instruction.
    pub fn register_instruction_trace_handler<F>(&mut self, handler: F)
    where
        F: FnMut(VA, &Instruction) -> anyhow::Result<()> + 'h,
    {
        self.instruction_handlers.push(Box::new(handler));
    }

    /// Register a closure invoked for every discovered edge.
    pub fn register_jump_trace_handler<F>(&mut self, handler: F)
    where
        F: FnMut(VA, &Instruction, JumpTarget) -> anyhow::Result<()> + 'h,
    {
        self.jump_handlers.push(Box::new(handler));
    }

    /// Register a handler object for instruction events.
    pub fn add_instruction_handler(&mut self, handler: Box<dyn InstructionTraceHandler + 'h>) {
        self.instruction_handlers.push(handler);
    }

    /// Register a handler object for edge events.
    pub fn add_jump_handler(&mut self, handler: Box<dyn JumpTraceHandler + 'h>) {
        self.jump_handlers.push(handler);
    }

    fn trace_instruction(&mut self, va: VA, insn: &Instruction) -> Result<()> {
        for handler in self.instruction_handlers.iter_mut() {
            handler
                .on_instruction(va, insn)
                .map_err(|source| LancelotError::Handler { va, source })?;
        }
        Ok(())
    }

    fn trace_jump(&mut self, va: VA, insn: &Instruction, target: JumpTarget) -> Result<()> {
        for handler in self.jump_handlers.iter_mut() {
            handler
                .on_jump(va, insn, target)
                .map_err(|source| LancelotError::Handler { va, source })?;
        }
        Ok(())
    }

    /// Explore the code reachable from `start`.
    ///
    /// Per-address decode failures are recorded in `Exploration::failures` and
    /// explored around. The run fails only if the start address itself cannot
    /// be decoded, or if a handler returns an error.
    pub fn explore_function(&mut self, ws: &Workspace, start: VA) -> Result<Exploration> {
        debug!(start = %start, "explore: begin");
        let mut exploration = Exploration::new(start);
        let mut queue: Vec<VA> = vec![start];

        while let Some(va) = queue.pop() {
            if exploration.visited.contains(&va) || exploration.failures.contains_key(&va) {
                continue;
            }

            let insn = match ws.decode_one(va) {
                Ok(insn) => insn,
                Err(e) if va == start && exploration.visited.is_empty() => {
                    debug!(address = %va, error = %e, "explore: start address undecodable");
                    return Err(e);
                }
                Err(e) => {
                    debug!(address = %va, error = %e, "explore: dead end");
                    exploration.failures.insert(va, e);
                    continue;
                }
            };

            exploration.visited.insert(va);
            trace!(address = %va, insn = %insn, "explore: insn");
            self.trace_instruction(va, &insn)?;

            if insn.is_call() || insn.is_jump() {
                let kind = if insn.is_call() {
                    JumpKind::Call
                } else if insn.is_conditional() {
                    JumpKind::ConditionalBranch
                } else {
                    JumpKind::Jump
                };
                for &target in insn.targets.iter() {
                    self.trace_jump(va, &insn, JumpTarget { va: target, kind })?;
                    exploration.edges += 1;
                    if kind != JumpKind::Call && !exploration.visited.contains(&target) {
                        queue.push(target);
                    }
                }
            }

            // pushed last so the straight-line path is walked first
            if insn.does_fallthrough() {
                match insn.fallthrough_address() {
                    Some(next) if !exploration.visited.contains(&next) => queue.push(next),
                    Some(_) => {}
                    None => {
                        exploration.failures.insert(
                            va,
                            LancelotError::AddressOverflow {
                                address: va,
                                offset: insn.length as u64,
                            },
                        );
                    }
                }
            }
        }

        debug!(
            start = %start,
            instructions = exploration.visited.len(),
            edges = exploration.edges,
            failures = exploration.failures.len(),
            "explore: done"
        );
        Ok(exploration)
    }
}
