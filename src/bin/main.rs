use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_num::maybe_hex;
use yanes6502::Cpu;
use yanes6502::Interrupt;
use yanes6502::InternalRam;
use yanes6502::InterruptLine;
use yanes6502::Memory;
use yanes6502::Ram;
use yanes6502::Rom;

/// Runs a raw program image on the NES CPU core
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Program image, mapped read-only from `--base` to the end of the
    /// address space
    image: PathBuf,
    /// Load address of the image
    #[arg(long, default_value = "0x8000", value_parser = maybe_hex::<u16>)]
    base: u16,
    /// Start here instead of at the reset vector
    #[arg(long, value_parser = maybe_hex::<u16>)]
    entry: Option<u16>,
    /// Instructions to execute
    #[arg(long, default_value_t = 100_000)]
    steps: u64,
    /// Raise an NMI every this many cycles, e.g. 29781 for NTSC frames
    #[arg(long, value_parser = maybe_hex::<u64>)]
    nmi_every: Option<u64>,
    /// Log every instruction in the nestest format
    #[arg(long)]
    trace: bool,
}

fn memory_map(image: Vec<u8>, base: u16) -> anyhow::Result<Memory> {
    anyhow::ensure!(base >= 0x2000, "the image would cover the internal RAM");

    let mut memory = Memory::new();
    memory.mount(InternalRam::new(), 0x0000, 0x1FFF)?;
    if base > 0x2000 {
        memory.mount(Ram::new(usize::from(base - 0x2000)), 0x2000, base - 1)?;
    }
    memory.mount(Rom::new(image), base, 0xFFFF)?;

    Ok(memory)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.nmi_every != Some(0), "the NMI period must be positive");

    let level = if args.trace { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let image = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    anyhow::ensure!(!image.is_empty(), "{} is empty", args.image.display());

    let memory = memory_map(image, args.base)?;
    let mut cpu = Cpu::new(memory);
    cpu.reset();
    match args.entry {
        Some(entry) => cpu.registers_mut().pc = entry,
        None => cpu
            .jump_to_reset_vector()
            .context("loading the reset vector")?,
    }
    log::info!("starting at {:?}", cpu.registers());

    let mut next_nmi = args.nmi_every;
    for _ in 0..args.steps {
        if let (Some(at), Some(every)) = (next_nmi, args.nmi_every) {
            if cpu.cycles() >= at {
                cpu.interrupt(Interrupt::Nmi);
                next_nmi = Some(at + every);
            }
        }

        cpu.step()?;
        if cpu.is_jammed() {
            break;
        }
    }

    println!("{:?} CYC:{}", cpu.registers(), cpu.cycles());

    Ok(())
}
