//! Log output for the `flakeid` binary.
//!
//! Events are written to stderr so stdout only carries IDs or JSON. The
//! filter is read from `RUST_LOG` and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=flakeid=trace flakeid generate -n 3
//! ```
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}
