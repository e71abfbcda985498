use core::time::Duration;
use std::io::Write;
use std::net::Ipv4Addr;

use anyhow::Context;
use flakeid::{
    FlakeGenerator, FlakeId, MonotonicClock, SystemClock, TimeSource, local_ipv4,
    worker_id_from_ipv4,
};
use serde::Serialize;

use super::config::{AppConfig, ClockKind, Command, GeneratorConfig, OutputFormat, WorkerSource};

/// IDs minted per batch while streaming `generate` output.
const IDS_PER_CHUNK: usize = 4096;

/// Executes the configured subcommand, writing its output to `out`.
pub fn run<W: Write>(config: AppConfig, out: &mut W) -> anyhow::Result<()> {
    match config.command {
        Command::Generate { count, format } => {
            let worker_id = resolve_worker(config.generator.worker)?.worker_id;
            let GeneratorConfig { epoch, clock, .. } = config.generator;
            match clock {
                ClockKind::System => {
                    let generator = FlakeGenerator::with_time(worker_id, epoch, SystemClock)?;
                    generate(&generator, count, format, out)
                }
                ClockKind::Monotonic => {
                    let generator =
                        FlakeGenerator::with_time(worker_id, epoch, MonotonicClock::new())?;
                    generate(&generator, count, format, out)
                }
            }
        }
        Command::Decode { id, int } => {
            let decoded = decode(&id, int, config.generator.epoch)?;
            serde_json::to_writer_pretty(&mut *out, &decoded)?;
            writeln!(out)?;
            Ok(())
        }
        Command::WorkerId => {
            let resolved = resolve_worker(config.generator.worker)?;
            serde_json::to_writer_pretty(&mut *out, &resolved)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

/// Mints `count` IDs and writes them one per line.
///
/// IDs are minted in batches of at most 4096, so memory stays flat however
/// large `count` is and output starts immediately.
pub fn generate<T, W>(
    generator: &FlakeGenerator<T>,
    count: usize,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: TimeSource,
    W: Write,
{
    tracing::debug!(count, ?format, worker_id = generator.worker_id(), "minting");

    let mut buf = [0u8; FlakeId::TEXT_LEN];
    let mut remaining = count;
    while remaining > 0 {
        let chunk_size = remaining.min(IDS_PER_CHUNK);
        for bytes in generator.next_n(chunk_size).chunks_exact(FlakeId::BYTES_LEN) {
            let id = FlakeId::from_bytes(bytes)?;
            match format {
                OutputFormat::Text => writeln!(out, "{}", id.encode_to_buf(&mut buf))?,
                OutputFormat::Int => writeln!(out, "{}", id.to_raw())?,
                OutputFormat::Hex => writeln!(out, "{:016x}", id.to_raw())?,
            }
        }
        remaining -= chunk_size;
    }
    out.flush()?;
    Ok(())
}

/// The fields of a single ID.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Decoded {
    pub id: FlakeId,
    pub raw: u64,
    pub hex: String,
    /// Milliseconds since the epoch the ID was decoded against.
    pub timestamp: u64,
    pub unix_millis: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

/// Parses `input` as text (or a decimal integer when `int` is set) and
/// splits it into fields.
pub fn decode(input: &str, int: bool, epoch: Duration) -> anyhow::Result<Decoded> {
    let input = input.trim();
    let id = if int {
        let raw: u64 = input
            .parse()
            .with_context(|| format!("`{input}` is not a decimal u64"))?;
        FlakeId::from_raw(raw)
    } else {
        input.parse::<FlakeId>()?
    };

    Ok(Decoded {
        id,
        raw: id.to_raw(),
        hex: format!("{:016x}", id.to_raw()),
        timestamp: id.timestamp(),
        unix_millis: id.unix_millis(epoch),
        worker_id: id.worker_id(),
        sequence: id.sequence(),
    })
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ResolvedWorker {
    pub worker_id: u64,
    /// The address the ID was derived from, absent when configured
    /// explicitly.
    pub ip: Option<Ipv4Addr>,
}

fn resolve_worker(source: WorkerSource) -> anyhow::Result<ResolvedWorker> {
    match source {
        WorkerSource::Explicit(worker_id) => Ok(ResolvedWorker {
            worker_id,
            ip: None,
        }),
        WorkerSource::LocalIp => {
            let ip = local_ipv4().context("set FLAKE_WORKER_ID to bypass address discovery")?;
            let worker_id = worker_id_from_ipv4(ip);
            tracing::info!(%ip, worker_id, "derived worker id from local address");
            Ok(ResolvedWorker {
                worker_id,
                ip: Some(ip),
            })
        }
    }
}
