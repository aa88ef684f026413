//! Command-line interface for bunkersurvey.
//!
//! This module provides the CLI structure for the `bunkrec` binary and the
//! worksheet format it reads.

mod commands;
mod worksheet;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ComputeCommand, ConfigCommand, StatusCommand, SurveyCommand, VesselCommand};
pub use worksheet::{FieldValue, FixedReading, ManualTankSheet, Overrides, TankReadings, Worksheet};

/// bunkrec - Bunker survey quantities
///
/// Computes standard volumes and weights of bunker tanks from soundings,
/// and keeps completed surveys and vessel configurations in a local store.
#[derive(Debug, Parser)]
#[command(name = "bunkrec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute quantities from a worksheet without saving
    Compute(ComputeCommand),

    /// Manage saved surveys
    #[command(subcommand)]
    Survey(SurveyCommand),

    /// Manage vessel configurations
    #[command(subcommand)]
    Vessel(VesselCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
