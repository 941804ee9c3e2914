use core::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use flakegen::{
    AtomicSnowflakeGenerator, DEFAULT_EPOCH, LockSnowflakeGenerator, MonotonicClock, NodeId,
    SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource,
};
use std::sync::Arc;

/// A generator shared by every caller in the process.
pub type SharedGenerator = Arc<dyn SnowflakeGenerator + Send + Sync>;

/// Command line interface of the `flakegen` binary.
///
/// Generator settings are parsed from CLI arguments or environment variables
/// (a `.env` file in the working directory is loaded first). Every process
/// minting IDs for the same keyspace must run with a distinct `NODE_ID`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakegen",
    version,
    about = "Mint and decode 64-bit Snowflake IDs"
)]
pub struct CliArgs {
    /// Node ID encoded into every generated ID (0..=1023).
    ///
    /// Must be unique among all processes generating IDs for the same
    /// keyspace. Nothing detects two processes sharing a node ID.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(
        long,
        env = "NODE_ID",
        default_value_t = 0,
        allow_negative_numbers = true,
        global = true
    )]
    pub node_id: i64,

    /// Epoch timestamps are counted from, in milliseconds since the Unix
    /// epoch. Must match between generation and decoding.
    ///
    /// Environment variable: `EPOCH_MS`
    #[arg(
        long,
        env = "EPOCH_MS",
        default_value_t = DEFAULT_EPOCH.as_millis() as u64,
        global = true
    )]
    pub epoch_ms: u64,

    /// Clock driving the generator.
    ///
    /// Environment variable: `CLOCK`
    #[arg(long, env = "CLOCK", value_enum, default_value_t = ClockKind::System, global = true)]
    pub clock: ClockKind,

    /// Use the lock-free generator instead of the lock-based one.
    ///
    /// Environment variable: `LOCK_FREE`
    #[arg(long, env = "LOCK_FREE", default_value_t = false, global = true)]
    pub lock_free: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// The configured epoch, unvalidated. Decoding accepts any epoch.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_ms)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mint new IDs and print them one per line.
    Generate {
        /// Number of IDs to mint.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Number of threads sharing the generator.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Print IDs zero-padded to 20 digits so they sort lexically.
        #[arg(long, default_value_t = false)]
        padded: bool,
    },
    /// Print the fields of existing IDs as JSON, one object per line.
    Decode {
        /// Raw IDs to decode.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

/// Time source selection.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Operating system wall clock; backwards jumps fail generation.
    System,
    /// Ticker anchored to the wall clock at startup; never goes backwards.
    Monotonic,
}

/// Validated generator settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub node_id: NodeId,
    pub epoch: Duration,
    pub clock: ClockKind,
    pub lock_free: bool,
}

impl TryFrom<&CliArgs> for GeneratorConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        let node_id = NodeId::new(args.node_id).context("NODE_ID is invalid")?;

        let now = SystemClock.current_millis();
        if args.epoch_ms > now {
            bail!(
                "EPOCH_MS ({}) is in the future (now = {})",
                args.epoch_ms,
                now
            );
        }
        if now - args.epoch_ms > SnowflakeId::max_timestamp() {
            bail!(
                "EPOCH_MS ({}) is too far in the past: the 41-bit timestamp window has run out",
                args.epoch_ms
            );
        }

        Ok(Self {
            node_id,
            epoch: args.epoch(),
            clock: args.clock,
            lock_free: args.lock_free,
        })
    }
}

impl GeneratorConfig {
    /// Builds the process-wide generator.
    pub fn build(&self) -> anyhow::Result<SharedGenerator> {
        let node_id = i64::from(self.node_id.get());
        let generator: SharedGenerator = match (self.clock, self.lock_free) {
            (ClockKind::System, false) => Arc::new(LockSnowflakeGenerator::with_epoch(
                node_id,
                self.epoch,
                SystemClock,
            )?),
            (ClockKind::System, true) => Arc::new(AtomicSnowflakeGenerator::with_epoch(
                node_id,
                self.epoch,
                SystemClock,
            )?),
            (ClockKind::Monotonic, false) => Arc::new(LockSnowflakeGenerator::with_epoch(
                node_id,
                self.epoch,
                MonotonicClock::new(),
            )?),
            (ClockKind::Monotonic, true) => Arc::new(AtomicSnowflakeGenerator::with_epoch(
                node_id,
                self.epoch,
                MonotonicClock::new(),
            )?),
        };
        Ok(generator)
    }
}
