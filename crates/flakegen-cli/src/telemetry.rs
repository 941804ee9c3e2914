//! Log output for the CLI.
//!
//! Events go to stderr so stdout carries nothing but IDs. The filter is read
//! from `RUST_LOG` and defaults to `info`, e.g.
//!
//! ```bash
//! RUST_LOG=flakegen=trace flakegen generate -n 3
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
