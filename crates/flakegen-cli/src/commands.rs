use core::time::Duration;
use std::{io::Write, thread::scope};

use anyhow::Context;
use flakegen::decode;

use crate::config::{CliArgs, Command, GeneratorConfig, SharedGenerator};

/// Runs the parsed command, writing its output to `out`.
///
/// Generator settings are validated for `generate` only; `decode` just needs
/// the epoch.
pub fn run(args: &CliArgs, out: &mut impl Write) -> anyhow::Result<()> {
    match &args.command {
        Command::Generate {
            count,
            threads,
            padded,
        } => {
            let config = GeneratorConfig::try_from(args)?;
            log_startup_info(&config);
            let generator = config.build()?;
            generate(&generator, *count, *threads, *padded, out)
        }
        Command::Decode { ids } => decode_ids(args.epoch(), ids, out),
    }
}

fn log_startup_info(config: &GeneratorConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    }
    tracing::info!(
        node_id = config.node_id.get(),
        epoch_ms = config.epoch.as_millis() as u64,
        clock = ?config.clock,
        lock_free = config.lock_free,
        "flakegen configured"
    );
}

/// Mints `count` IDs from `generator`, spread over `threads` callers, and
/// writes them to `out` in ascending order.
pub fn generate(
    generator: &SharedGenerator,
    count: usize,
    threads: usize,
    padded: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let threads = threads.clamp(1, count.max(1));
    let per_thread = count / threads;
    let remainder = count % threads;

    let mut ids = scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let quota = per_thread + usize::from(i < remainder);
                s.spawn(move || {
                    (0..quota)
                        .map(|_| generator.next_id())
                        .collect::<flakegen::Result<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(ids) => ids.context("ID generation failed"),
                Err(_) => Err(anyhow::anyhow!("generator thread panicked")),
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    ids.sort_unstable();

    tracing::debug!(
        count = ids.len(),
        threads,
        node_id = generator.node_id().get(),
        "generated ids"
    );

    for id in ids {
        if padded {
            writeln!(out, "{}", id.to_padded_string())?;
        } else {
            writeln!(out, "{id}")?;
        }
    }
    Ok(())
}

/// Writes one JSON object per ID with its decoded fields.
pub fn decode_ids(epoch: Duration, ids: &[u64], out: &mut impl Write) -> anyhow::Result<()> {
    for &id in ids {
        let parts = decode(id, epoch);
        writeln!(out, "{}", serde_json::to_string(&parts)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use flakegen::{SystemClock, TimeSource};
    use std::collections::HashSet;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    fn config(args: &[&str]) -> GeneratorConfig {
        GeneratorConfig::try_from(&parse(args)).unwrap()
    }

    #[test]
    fn generates_sorted_unique_ids_across_threads() {
        let config = config(&["flakegen", "--node-id", "42", "generate"]);
        let generator = config.build().unwrap();

        let mut out = Vec::new();
        generate(&generator, 10_000, 4, false, &mut out).unwrap();

        let ids: Vec<u64> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect();
        assert_eq!(ids.len(), 10_000);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10_000);
        assert!(ids.iter().all(|&id| decode(id, config.epoch).node_id == 42));
    }

    #[test]
    fn pads_to_twenty_digits() {
        let config = config(&["flakegen", "--clock", "monotonic", "--lock-free", "generate"]);
        let generator = config.build().unwrap();

        let mut out = Vec::new();
        generate(&generator, 3, 8, true, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| l.len() == 20));
    }

    #[test]
    fn zero_count_prints_nothing() {
        let config = config(&["flakegen", "generate"]);
        let generator = config.build().unwrap();

        let mut out = Vec::new();
        generate(&generator, 0, 4, false, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn decodes_to_json() {
        let args = parse(&["flakegen", "decode", "1"]);
        let id = (5 << 22) | (9 << 12) | 3;

        let mut out = Vec::new();
        decode_ids(args.epoch(), &[id], &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["id"], id);
        assert_eq!(value["timestamp"], 1_704_067_200_005_u64);
        assert_eq!(value["node_id"], 9);
        assert_eq!(value["sequence"], 3);
    }

    #[test]
    fn decode_ignores_generator_settings() {
        let future = (SystemClock.current_millis() + 60_000).to_string();
        for args in [
            &["flakegen", "--node-id", "5000", "decode", "42"][..],
            &["flakegen", "--node-id", "-1", "decode", "42"][..],
            &["flakegen", "--epoch-ms", future.as_str(), "decode", "42"][..],
        ] {
            let args = parse(args);
            let mut out = Vec::new();
            run(&args, &mut out).unwrap();

            let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
            assert_eq!(value["id"], 42);
            assert_eq!(value["node_id"], 0);
            assert_eq!(value["sequence"], 42);
        }
    }

    #[test]
    fn generate_still_validates_settings() {
        let future = (SystemClock.current_millis() + 60_000).to_string();
        for args in [
            &["flakegen", "--node-id", "5000", "generate"][..],
            &["flakegen", "--epoch-ms", future.as_str(), "generate"][..],
        ] {
            let mut out = Vec::new();
            assert!(run(&parse(args), &mut out).is_err());
            assert!(out.is_empty());
        }
    }

    #[test]
    fn run_generates_for_valid_settings() {
        let args = parse(&["flakegen", "--node-id", "7", "generate", "-n", "2"]);
        let mut out = Vec::new();
        run(&args, &mut out).unwrap();

        let ids: Vec<u64> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|&id| decode(id, args.epoch()).node_id == 7));
    }
}
