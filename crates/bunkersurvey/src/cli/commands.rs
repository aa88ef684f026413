//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Compute command arguments.
#[derive(Debug, Args)]
pub struct ComputeCommand {
    /// Worksheet JSON file
    pub worksheet: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Saved survey commands.
#[derive(Debug, Subcommand)]
pub enum SurveyCommand {
    /// Compute a worksheet and save it as a completed survey
    Save {
        /// Worksheet JSON file
        worksheet: PathBuf,

        /// Owning user id
        #[arg(short, long)]
        user: String,
    },

    /// List a user's surveys, newest first
    List {
        /// Owning user id
        #[arg(short, long)]
        user: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print a saved survey document
    Show {
        /// Survey id
        id: String,

        /// Owning user id
        #[arg(short, long)]
        user: String,
    },

    /// Delete a saved survey
    Delete {
        /// Survey id
        id: String,

        /// Owning user id
        #[arg(short, long)]
        user: String,
    },

    /// Print the quantity report of a saved survey
    Report {
        /// Survey id
        id: String,

        /// Owning user id
        #[arg(short, long)]
        user: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Vessel configuration commands.
#[derive(Debug, Subcommand)]
pub enum VesselCommand {
    /// Save a vessel configuration from a JSON file
    Import {
        /// Vessel JSON file
        file: PathBuf,

        /// Owning user id
        #[arg(short, long)]
        user: String,
    },

    /// List a user's vessels
    List {
        /// Owning user id
        #[arg(short, long)]
        user: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_command_debug() {
        let cmd = SurveyCommand::Report {
            id: "abc".to_string(),
            user: "u1".to_string(),
            json: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Report"));
        assert!(debug_str.contains("abc"));
    }

    #[test]
    fn test_compute_command_debug() {
        let cmd = ComputeCommand {
            worksheet: PathBuf::from("sheet.json"),
            json: false,
        };
        assert!(format!("{cmd:?}").contains("sheet.json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
