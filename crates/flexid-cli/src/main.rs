#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use config::{BaselineConfig, BenchConfig, CliArgs, Command, FlexibleConfig, ParseConfig};
use flexid::{
    BaselineGenerator, FlexibleGenerator, GeneratorConfig, IdGenerator, ParsedBaselineId,
};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let command = Command::try_from(args)?;

    init_telemetry()?;

    match command {
        Command::Flexible(config) => run_flexible(config),
        Command::Baseline(config) => run_baseline(config),
        Command::Parse(config) => run_parse(config),
        Command::Bench(config) => run_bench(config),
    }
}

fn run_flexible(config: FlexibleConfig) -> anyhow::Result<()> {
    let generator = FlexibleGenerator::new(
        GeneratorConfig::new(config.preset, config.machine_id).with_prefix(config.prefix),
    )?;
    tracing::info!(
        machine_id = config.machine_id,
        timestamp_bits = generator.layout().timestamp_bits(),
        order = ?generator.layout().order(),
        "generating {} flexible ids",
        config.count
    );

    let ids = generator.try_next_ids(config.count)?;
    write_lines(&ids)?;

    if config.verify {
        if !generator.verify_increasing_sequence(&ids) {
            bail!("generated ids are not strictly increasing");
        }
        tracing::info!("verified {} ids are strictly increasing", ids.len());
    }
    Ok(())
}

fn run_baseline(config: BaselineConfig) -> anyhow::Result<()> {
    let generator = BaselineGenerator::new(&config.prefix, config.worker_id)?;
    tracing::info!(
        worker_id = config.worker_id,
        "generating {} baseline ids",
        config.count
    );
    write_lines(&generator.next_ids(config.count))
}

fn run_parse(config: ParseConfig) -> anyhow::Result<()> {
    let parsed = ParsedBaselineId::parse(&config.id, config.epoch_ms)
        .with_context(|| format!("failed to parse {:?}", config.id))?;

    let mut out = io::stdout().lock();
    if config.json {
        serde_json::to_writer_pretty(&mut out, &parsed)?;
        writeln!(out)?;
    } else {
        writeln!(out, "prefix:       {}", parsed.prefix)?;
        writeln!(out, "worker_id:    {}", parsed.worker_id)?;
        writeln!(out, "sequence:     {}", parsed.sequence)?;
        writeln!(out, "timestamp_ms: {}", parsed.timestamp_ms)?;
    }
    Ok(())
}

fn run_bench(config: BenchConfig) -> anyhow::Result<()> {
    let flexible = FlexibleGenerator::new(GeneratorConfig::new(config.preset, 0))?;
    let elapsed = time_ids(config.count, || flexible.try_next_id().map(drop))?;
    report("flexible", config.count, elapsed)?;

    let baseline = BaselineGenerator::new("BN", 0)?;
    let elapsed = time_ids(config.count, || {
        std::hint::black_box(baseline.next_id());
        Ok(())
    })?;
    report("baseline", config.count, elapsed)
}

fn time_ids(
    count: usize,
    mut next: impl FnMut() -> Result<(), flexid::Error>,
) -> anyhow::Result<f64> {
    let start = Instant::now();
    for _ in 0..count {
        std::hint::black_box(next()?);
    }
    Ok(start.elapsed().as_secs_f64())
}

fn report(name: &str, count: usize, elapsed_secs: f64) -> anyhow::Result<()> {
    let per_sec = count as f64 / elapsed_secs.max(f64::EPSILON);
    tracing::info!(generator = name, count, elapsed_secs, "bench finished");
    writeln!(
        io::stdout().lock(),
        "{name}: {count} ids in {:.3} ms ({per_sec:.0} ids/s)",
        elapsed_secs * 1_000.0
    )?;
    Ok(())
}

fn write_lines(ids: &[String]) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    for id in ids {
        writeln!(out, "{id}")?;
    }
    Ok(())
}
