//! Explore one function of a PE file by linear disassembly.
//!
//! Prints each discovered instruction, marks calls, and lists control-flow
//! edges as `from --> to`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use lancelot::analysis::{format_instruction, JumpKind, LinearDisassembler};
use lancelot::core::{Arch, VA};
use lancelot::loader;
use lancelot::logging;
use lancelot::workspace::Workspace;

/// Invoke the linear disassembler on a function of a PE file.
#[derive(Debug, Parser)]
#[command(name = "linear_disassembler", version, about, long_about = None)]
struct Cli {
    /// File to explore.
    #[arg(long = "input_file", value_name = "FILE")]
    input_file: PathBuf,

    /// Address of the function to explore (hex, `0x` prefix optional).
    #[arg(long = "fva", value_name = "HEX")]
    fva: String,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit the exploration result as JSON instead of a listing.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing_with_level(if cli.verbose { "debug" } else { "info" });

    if !cli.input_file.exists() {
        bail!("file {} must exist", cli.input_file.display());
    }
    let fva = VA::from_hex(&cli.fva).with_context(|| format!("invalid --fva: {}", cli.fva))?;

    let data = std::fs::read(&cli.input_file)
        .with_context(|| format!("failed to read {}", cli.input_file.display()))?;
    let mode = loader::pe_mode(&data)?;
    let mut ws = Workspace::new(Arch::X86, mode)?;
    let name = cli
        .input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let module = loader::load_pe(&mut ws, &name, &data)?;
    info!(module = %module, "loaded");
    ws.dump_memory_regions();

    let num_opcode_bytes = ws.display_options().num_opcode_bytes;
    let json_mode = cli.json;
    let mut listing = Vec::new();
    let mut edges = Vec::new();

    let exploration = {
        let mut ld = LinearDisassembler::new();
        ld.register_instruction_trace_handler(|_va, insn| {
            let line = format_instruction(insn, num_opcode_bytes);
            if json_mode {
                listing.push(line);
            } else {
                println!("{}", line);
            }
            Ok(())
        });
        ld.register_instruction_trace_handler(|_va, insn| {
            if !json_mode && insn.is_call() {
                println!("--> call");
            }
            Ok(())
        });
        ld.register_jump_trace_handler(|va, _insn, target| {
            if json_mode {
                edges.push(json!({
                    "from": va.to_string(),
                    "to": target.va.to_string(),
                    "kind": target.kind,
                }));
            } else if target.kind != JumpKind::Call {
                println!("{} --> {}", va, target.va);
            } else {
                println!("{} --> {} (call)", va, target.va);
            }
            Ok(())
        });
        ld.explore_function(&ws, fva)
            .with_context(|| format!("exploring function at {}", fva))?
    };

    for (va, err) in exploration.failures.iter() {
        warn!(address = %va, kind = err.kind(), error = %err, "unexplored address");
    }
    info!(
        start = %exploration.start,
        instructions = exploration.instruction_count(),
        edges = exploration.edges,
        failures = exploration.failures.len(),
        "exploration complete"
    );

    if json_mode {
        let failures: Vec<_> = exploration
            .failures
            .iter()
            .map(|(va, err)| {
                json!({
                    "address": va.to_string(),
                    "kind": err.kind(),
                    "error": err.to_string(),
                })
            })
            .collect();
        let report = json!({
            "module": module,
            "start": exploration.start.to_string(),
            "instructions": listing,
            "edges": edges,
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
