//! Command-line driver for the simulator: loads a microcode ROM, a jump
//! table, and a bytecode image (either a fixture from `jop-programs` or
//! a file on disk), then steps the cluster for a fixed number of cycles
//! and reports the final architectural state of core 0.

use std::path::PathBuf;

use clap::Parser;
use jop_core::config::{Config, LockFabric};
use jop_core::memory::MemTiming;
use jop_core::pipeline::rom_loader::{load_jump_table, load_microcode_rom};
use jop_core::smp::cluster::Cluster;

#[derive(Parser, Debug)]
#[command(name = "jop", about = "Cycle-level JOP pipeline and memory-hierarchy simulator")]
struct Cli {
    /// Path to a microcode ROM image (§6 "Microcode ROM image").
    #[arg(long)]
    rom: PathBuf,

    /// Path to a 256-entry jump table image (§6 "jump table image").
    #[arg(long = "jump-table")]
    jump_table: PathBuf,

    /// Name of a registered fixture from `jop-programs`, mutually
    /// exclusive with `--bytecode-file`.
    #[arg(long, conflicts_with = "bytecode_file")]
    fixture: Option<String>,

    /// Path to a raw bytecode image to run instead of a fixture.
    #[arg(long = "bytecode-file")]
    bytecode_file: Option<PathBuf>,

    /// Number of simulated cycles to run.
    #[arg(long, default_value_t = 1000)]
    cycles: u64,

    /// Number of cores in the cluster.
    #[arg(long, default_value_t = 1)]
    cores: usize,

    /// Use the individual hardware lock unit instead of CmpSync, with
    /// the given number of slots.
    #[arg(long = "ihlu-slots")]
    ihlu_slots: Option<usize>,

    /// Print a one-line trace of core 0's microcode PC and retirement
    /// flag every cycle.
    #[arg(long)]
    trace: bool,
}

fn main() {
    let cli = Cli::parse();

    let rom_bytes = std::fs::read(&cli.rom).unwrap_or_else(|e| {
        eprintln!("error: reading ROM image {}: {e}", cli.rom.display());
        std::process::exit(1);
    });
    let jt_bytes = std::fs::read(&cli.jump_table).unwrap_or_else(|e| {
        eprintln!("error: reading jump table image {}: {e}", cli.jump_table.display());
        std::process::exit(1);
    });

    let rom = load_microcode_rom(&rom_bytes).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let jump_table = load_jump_table(&jt_bytes, 0).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    let body = match (&cli.fixture, &cli.bytecode_file) {
        (Some(name), None) => match jop_programs::find(name) {
            Some(entry) => strip_loader_header((entry.build)()),
            None => {
                eprintln!("error: unknown fixture '{name}'");
                eprintln!("available fixtures:");
                for f in jop_programs::all() {
                    eprintln!("  {} - {}", f.name, f.description);
                }
                std::process::exit(1);
            }
        },
        (None, Some(path)) => {
            let image = std::fs::read(path).unwrap_or_else(|e| {
                eprintln!("error: reading bytecode file {}: {e}", path.display());
                std::process::exit(1);
            });
            strip_loader_header(image)
        }
        _ => {
            eprintln!("error: exactly one of --fixture or --bytecode-file is required");
            std::process::exit(1);
        }
    };

    let config = Config {
        num_cores: cli.cores,
        mem_timing: MemTiming::Bram,
        lock_fabric: match cli.ihlu_slots {
            Some(slots) => LockFabric::Ihlu { slots },
            None => LockFabric::CmpSync,
        },
        ..Config::default()
    };

    let mut cluster = Cluster::new(&config, rom, jump_table);
    let n = body.len().min(cluster.core(0).jbc.len());
    cluster.core_mut(0).jbc[..n].copy_from_slice(&body[..n]);

    for cycle in 0..cli.cycles {
        if cli.trace {
            eprintln!("cycle {cycle}: core0 pc={}", cluster.core(0).regs.pc);
        }
        cluster.step();
    }

    let regs = &cluster.core(0).regs;
    println!("final state: pc={} a={} b={} sp={}", regs.pc, regs.a, regs.b, regs.sp);
}

/// Fixtures and on-disk bytecode files both carry the loader's
/// `mem_start` header word ahead of the body; the CLI only needs the
/// body, since it copies bytes straight into a core's bytecode RAM
/// rather than through the class-image loader.
fn strip_loader_header(image: Vec<u8>) -> Vec<u8> {
    image.into_iter().skip(4).collect()
}
