//! CLI definitions for wumon
//!
//! Clap structure definitions, separated from main.rs so the surface stays
//! easy to scan and test in one place.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::queue::Endianness;

#[derive(Parser)]
#[command(name = "wumon")]
#[command(about = "[ Work Unit Monitor ] - inspect legacy folding client artifacts")]
#[command(
    long_about = "Work Unit Monitor (wumon) - turn a legacy folding client's on-disk
artifacts (FAHlog.txt, queue.dat, unitinfo.txt) into structured work-unit records.

QUICK START:
    wumon status ~/folding          One aggregation cycle, human summary
    wumon units ~/folding --json    Canonical unit records as JSON
    wumon runs ~/folding            Client runs found in the log
    wumon queue ~/folding           Decoded queue snapshot"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one aggregation cycle and print a per-slot summary
    Status {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Print the canonical unit records
    Units {
        #[command(flatten)]
        client: ClientArgs,
        /// Emit JSON instead of the human listing
        #[arg(long)]
        json: bool,
    },

    /// List client runs segmented from the log
    Runs {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Decode and print the queue snapshot
    Queue {
        #[command(flatten)]
        client: ClientArgs,
    },
}

/// Where to find the client artifacts. File flags override the configured
/// names inside the client directory.
#[derive(Args)]
pub struct ClientArgs {
    /// Client directory containing the artifact files
    pub dir: PathBuf,

    /// Explicit log file path
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Explicit queue snapshot path
    #[arg(long)]
    pub queue: Option<PathBuf>,

    /// Explicit status file path
    #[arg(long)]
    pub unitinfo: Option<PathBuf>,

    /// Byte order for queue snapshot fields (overrides config)
    #[arg(long, value_enum)]
    pub endian: Option<EndianArg>,
}

/// CLI-facing spelling of the queue byte-order policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EndianArg {
    Little,
    Big,
}

impl From<EndianArg> for Endianness {
    fn from(value: EndianArg) -> Self {
        match value {
            EndianArg::Little => Endianness::Little,
            EndianArg::Big => Endianness::Big,
        }
    }
}
