//! APE bring-up CLI.
//!
//! This binary drives the bring-up library against the simulated backend. It provides:
//! 1. **Run:** Build a simulated controller, start the mailbox executor, bind every bank through
//!    the mailbox, and run the full bring-up sequence.
//! 2. **Translate:** Decode raw NVRAM power budget entries into register values.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{fs, process, thread};
use tracing_subscriber::EnvFilter;

use apeboot_core::mailbox::{Executor, Mailbox, MailboxBackend};
use apeboot_core::regs::mii;
use apeboot_core::sim::{self, Board, DeviceBlock};
use apeboot_core::stats::MailboxStats;
use apeboot_core::{
    CancelToken, Chip, Config, NvramConfig, Result, Sequencer, translate_power_budget,
};

#[derive(Parser, Debug)]
#[command(
    name = "apeboot",
    author,
    version,
    about = "BCM5719 APE bring-up driver",
    long_about = "Run the APE bring-up sequence against a simulated controller reached through the \
                  shared-memory mailbox, or decode NVRAM power budget entries.\n\nExamples:\n  \
                  apeboot run\n  apeboot run --lom --function 2 --drop-selects 3\n  \
                  apeboot run --config apeboot.json --nvram talos.json\n  \
                  apeboot translate 0x2107 0x0000"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run bring-up against the simulated controller.
    Run {
        /// JSON configuration file (poll bounds, zero-fill).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON NVRAM record (MAC addresses, power fields).
        #[arg(short, long)]
        nvram: Option<PathBuf>,

        /// Strap the simulated board as LAN-on-motherboard instead of a NIC.
        #[arg(long)]
        lom: bool,

        /// PCI function number of the simulated port.
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..4))]
        function: u8,

        /// Drop this many block-select writes to 0x8610 to exercise the retry loop.
        #[arg(long, default_value_t = 0)]
        drop_selects: u32,

        /// Reads of the MDIO busy bit before each transaction completes.
        #[arg(long, default_value_t = 2)]
        mdio_latency: u32,

        /// Cancel bring-up if it has not finished after this many milliseconds.
        #[arg(long)]
        deadline_ms: Option<u64>,
    },

    /// Translate raw 16-bit power budget entries (hex with 0x, or decimal).
    Translate {
        /// Raw entries.
        #[arg(required = true, value_parser = parse_raw)]
        raw: Vec<u16>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            nvram,
            lom,
            function,
            drop_selects,
            mdio_latency,
            deadline_ms,
        } => {
            let board = Board {
                nic: !lom,
                function,
            };
            let device = DeviceBlock::new(board)
                .with_mdio_latency(mdio_latency)
                .with_dropped_selects(mii::BLOCK_8610, drop_selects);
            let deadline = deadline_ms.map(Duration::from_millis);
            if let Err(e) = cmd_run(config.as_deref(), nvram.as_deref(), device, deadline) {
                eprintln!("\n[!] BRING-UP FAILED: {e}");
                process::exit(1);
            }
        }
        Commands::Translate { raw } => {
            for value in raw {
                println!("{value:#06x} -> {:#010x}", translate_power_budget(value));
            }
        }
    }
}

/// Runs bring-up over the mailbox against a simulated DEVICE block.
///
/// The executor runs on its own thread for the duration of the run. Mailbox
/// statistics are printed whether or not bring-up succeeds; the report only
/// on success. With a `deadline`, a watchdog thread cancels the run, which
/// also abandons any mailbox or MDIO wait in progress.
fn cmd_run(
    config: Option<&Path>,
    nvram: Option<&Path>,
    device: DeviceBlock,
    deadline: Option<Duration>,
) -> Result<()> {
    let config = match config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            Config::from_json(&fs::read_to_string(path)?)?
        }
        None => Config::default(),
    };
    let nvram = match nvram {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading NVRAM record");
            NvramConfig::from_json(&fs::read_to_string(path)?)?
        }
        None => {
            tracing::warn!("no NVRAM record given; MAC and power fields will be zero");
            NvramConfig::default()
        }
    };

    let board = device.board();
    println!(
        "[*] Simulated BCM5719: {} strap, function {}",
        if board.nic { "NIC" } else { "LOM" },
        board.function
    );

    let mailbox = Arc::new(Mailbox::new());
    let stats = Arc::new(MailboxStats::new());
    let executor = Executor::new(
        Arc::clone(&mailbox),
        sim::build_bus(device),
        Arc::clone(&stats),
    )
    .spawn();

    let cancel = CancelToken::new();
    if let Some(deadline) = deadline {
        let watchdog = cancel.clone();
        let _ = thread::spawn(move || {
            thread::sleep(deadline);
            tracing::warn!(?deadline, "deadline reached, cancelling bring-up");
            watchdog.cancel();
        });
    }

    let backend =
        MailboxBackend::with_stats(mailbox, config.mailbox.poll.policy(), Arc::clone(&stats))
            .with_cancel(cancel.clone());
    let mut chip = Chip::new();
    chip.attach(&backend);

    let result = Sequencer::new(&mut chip, &nvram, config.sequence)
        .with_cancel(cancel)
        .run();
    drop(executor);

    if let Ok(report) = &result {
        report.print();
    }
    stats.snapshot().print();
    result.map(|_| ())
}

fn parse_raw(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid power budget entry {s:?}: {e}"))
}
