use core::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use flakeid::{DEFAULT_EPOCH, FlakeId, SystemClock, TimeSource};

/// Runtime configuration for the `flakeid` binary.
///
/// Generator settings are global so they may appear before or after the
/// subcommand. All of them can also be supplied through the environment or a
/// `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakeid",
    version,
    about = "Mint and inspect compact, sortable 64-bit flake IDs"
)]
pub struct CliArgs {
    /// Worker ID embedded in every minted ID (0..=1023).
    ///
    /// When absent, the worker ID is derived from this host's primary IPv4
    /// address (address as integer, modulo 1024). Two hosts whose addresses
    /// agree modulo 1024 would collide, so set this explicitly in any
    /// deployment where that can happen.
    ///
    /// Environment variable: `FLAKE_WORKER_ID`
    #[arg(long, global = true, env = "FLAKE_WORKER_ID")]
    pub worker_id: Option<u64>,

    /// Custom epoch in Unix milliseconds. `0` selects the library default.
    ///
    /// Environment variable: `FLAKE_EPOCH_MS`
    #[arg(long, global = true, env = "FLAKE_EPOCH_MS", default_value_t = 0)]
    pub epoch_ms: u64,

    /// Clock backing the generator.
    ///
    /// Environment variable: `FLAKE_CLOCK`
    #[arg(long, global = true, env = "FLAKE_CLOCK", value_enum, default_value_t = ClockKind::System)]
    pub clock: ClockKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mint one or more IDs, one per line.
    Generate {
        /// Number of IDs to mint.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Output form of each ID.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the fields of an ID as JSON.
    Decode {
        /// The ID, in URL-safe base64 text form unless `--int` is given.
        id: String,

        /// Parse the ID as a decimal integer.
        #[arg(long)]
        int: bool,
    },
    /// Print the worker ID this configuration resolves to.
    WorkerId,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Wall-clock time, read on every mint.
    System,
    /// Wall-clock anchored at startup, advanced by a background ticker.
    Monotonic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// URL-safe base64 of the big-endian bytes.
    Text,
    /// Decimal integer.
    Int,
    /// 16 lowercase hex digits.
    Hex,
}

/// Where the worker ID came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSource {
    Explicit(u64),
    LocalIp,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub worker: WorkerSource,
    pub epoch: Duration,
    pub clock: ClockKind,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_worker_id = FlakeId::max_worker_id();

        let worker = match args.worker_id {
            Some(worker_id) if worker_id > max_worker_id => bail!(
                "FLAKE_WORKER_ID ({}) exceeds available worker ID space (max = {})",
                worker_id,
                max_worker_id
            ),
            Some(worker_id) => WorkerSource::Explicit(worker_id),
            None => WorkerSource::LocalIp,
        };

        let now_ms = SystemClock.current_millis();
        if args.epoch_ms > now_ms {
            bail!(
                "FLAKE_EPOCH_MS ({}) is later than the current time ({})",
                args.epoch_ms,
                now_ms
            );
        }

        if let Command::Generate { count: 0, .. } = args.command {
            bail!("--count must be greater than 0");
        }

        // Decoding needs the concrete epoch, not the `0` placeholder.
        let epoch = match args.epoch_ms {
            0 => DEFAULT_EPOCH,
            ms => Duration::from_millis(ms),
        };

        Ok(Self {
            generator: GeneratorConfig {
                worker,
                epoch,
                clock: args.clock,
            },
            command: args.command,
        })
    }
}
