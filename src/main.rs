//! wumon - CLI entry point
//!
//! All file I/O lives here: the engine itself only sees already-read
//! text and bytes.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use humansize::{format_size, BINARY};

use wumon::cli::{Cli, ClientArgs, Commands};
use wumon::{
    AggregateResult, ClientQueue, Config, Endianness, TracingSink, UnitDataAggregator,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { client } => status(&client),
        Commands::Units { client, json } => units(&client, json),
        Commands::Runs { client } => runs(&client),
        Commands::Queue { client } => queue(&client),
    }
}

/// Already-read artifact content plus the resolved decode policy.
struct ClientArtifacts {
    log: String,
    queue: Option<Vec<u8>>,
    unitinfo: Option<String>,
    endianness: Endianness,
}

fn read_artifacts(args: &ClientArgs) -> Result<ClientArtifacts> {
    let config = Config::load()?;

    let log_path = resolve(args.log.clone(), &args.dir, &config.client.log_file);
    let log = fs::read_to_string(&log_path)
        .with_context(|| format!("Failed to read log file: {:?}", log_path))?;

    // Queue and status file absence are normal degraded conditions
    let queue_path = resolve(args.queue.clone(), &args.dir, &config.client.queue_file);
    let queue = fs::read(&queue_path).ok();
    let unitinfo_path = resolve(args.unitinfo.clone(), &args.dir, &config.client.unitinfo_file);
    let unitinfo = fs::read_to_string(&unitinfo_path).ok();

    let endianness = args
        .endian
        .map(Into::into)
        .unwrap_or(config.queue.endianness);

    Ok(ClientArtifacts {
        log,
        queue,
        unitinfo,
        endianness,
    })
}

fn resolve(explicit: Option<PathBuf>, dir: &std::path::Path, name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| dir.join(name))
}

fn aggregate(args: &ClientArgs) -> Result<AggregateResult> {
    let artifacts = read_artifacts(args)?;
    let sink = TracingSink;
    let aggregator = UnitDataAggregator::new(&sink)
        .endianness(artifacts.endianness)
        .reference_year(Utc::now().year());
    let result = aggregator.aggregate(
        &artifacts.log,
        artifacts.queue.as_deref(),
        artifacts.unitinfo.as_deref(),
    )?;
    Ok(result)
}

fn status(args: &ClientArgs) -> Result<()> {
    let result = aggregate(args)?;
    let run = result.current_run();

    println!(
        "Folding identity: {} (Team {})",
        if run.user_name.is_empty() {
            "unknown"
        } else {
            &run.user_name
        },
        run.team
    );
    println!("Client status:    {:?}", result.current_status);
    println!(
        "Mode:             {}",
        if result.log_only {
            "log-only (queue unavailable)"
        } else {
            "queue"
        }
    );
    println!(
        "Run counters:     {} completed, {} failed, {} lifetime",
        run.completed_units, run.failed_units, run.total_completed_units
    );
    println!();

    for (slot, unit) in result.units.iter().enumerate() {
        let marker = if slot == result.current_unit_index {
            '*'
        } else {
            ' '
        };
        match unit {
            Some(unit) => {
                let progress = unit
                    .percent_complete()
                    .map(|p| format!("{p}%"))
                    .unwrap_or_else(|| "--".to_string());
                println!(
                    "{marker} slot {slot}: {:14} {:>4}  {:?}",
                    unit.project.to_string(),
                    progress,
                    unit.result
                );
            }
            None => println!("{marker} slot {slot}: -"),
        }
    }
    Ok(())
}

fn units(args: &ClientArgs, json: bool) -> Result<()> {
    let result = aggregate(args)?;

    if json {
        let output =
            serde_json::to_string_pretty(&result.units).context("Failed to serialize units")?;
        println!("{output}");
        return Ok(());
    }

    for (slot, unit) in result.units.iter().enumerate() {
        let Some(unit) = unit else {
            continue;
        };
        println!("slot {slot}: {}", unit.project);
        if let Some(name) = &unit.protein_name {
            println!("  protein:   {name}");
        }
        if let Some(core) = &unit.core_version {
            println!("  core:      {core}");
        }
        if let Some(time) = unit.download_time {
            println!("  download:  {time}");
        }
        if let Some(time) = unit.due_time {
            println!("  due:       {time}");
        }
        if let Some(frame) = unit.current_frame() {
            println!(
                "  progress:  {}% ({}/{} raw), last frame {:?}",
                frame.id, unit.raw_frames_complete, unit.raw_frames_total, frame.duration
            );
        }
        println!("  result:    {:?}", unit.result);
    }
    Ok(())
}

fn runs(args: &ClientArgs) -> Result<()> {
    let artifacts = read_artifacts(args)?;
    let lines = wumon::fahlog::classify_all(&artifacts.log);
    let runs = wumon::fahlog::segment(&lines)?;

    for (index, run) in runs.iter().enumerate() {
        println!(
            "run {index}: line {}, user {} (Team {}), {} unit(s), {} completed / {} failed",
            run.start_index,
            if run.user_name.is_empty() {
                "unknown"
            } else {
                &run.user_name
            },
            run.team,
            run.unit_indexes.len(),
            run.completed_units,
            run.failed_units
        );
    }
    Ok(())
}

fn queue(args: &ClientArgs) -> Result<()> {
    let artifacts = read_artifacts(args)?;
    let bytes = artifacts
        .queue
        .context("Queue snapshot not found or unreadable")?;
    let queue: ClientQueue = wumon::queue::decode(&bytes, artifacts.endianness)?;

    println!(
        "queue version {}, current slot {}",
        queue.version, queue.current_index
    );
    for (slot, entry) in queue.entries.iter().enumerate() {
        let marker = if slot as u32 == queue.current_index {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} slot {slot}: {:?} {} server {}:{} cores {} mem {}",
            entry.status,
            entry.project,
            entry.server,
            entry.port,
            entry.core_count,
            format_size(u64::from(entry.memory_mib) * 1024 * 1024, BINARY)
        );
    }
    Ok(())
}
