//! `bunkrec` - CLI for bunkersurvey
//!
//! This binary computes bunker quantities from worksheets and manages saved
//! surveys and vessel configurations.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use bunkersurvey::cli::{Cli, Command, ConfigCommand, SurveyCommand, VesselCommand, Worksheet};
use bunkersurvey::storage::{SurveyRepository, VesselRepository};
use bunkersurvey::{init_logging, Config, QuantityReport, Storage, Survey, TextSink, Vessel};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Compute(cmd) => handle_compute(&config, &cmd.worksheet, cmd.json),
        Command::Survey(cmd) => handle_survey(&config, cmd),
        Command::Vessel(cmd) => handle_vessel(&config, cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening store at {}", path.display()))
}

fn run_worksheet(config: &Config, path: &Path) -> Result<(Worksheet, Survey)> {
    let sheet =
        Worksheet::load(path).with_context(|| format!("reading worksheet {}", path.display()))?;
    let session = sheet.session(config.calculator.clone())?;
    debug!(
        "{} of {} tanks unclassified",
        session.unclassified_tanks().len(),
        session.tanks().len()
    );
    let finalized = sheet.finalize(&session);
    let survey = sheet.to_survey(finalized, &config.survey);
    Ok((sheet, survey))
}

fn print_report(report: &QuantityReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let mut sink = TextSink::new(io::stdout().lock());
        report.render(&mut sink)?;
    }
    Ok(())
}

fn handle_compute(config: &Config, worksheet: &Path, json: bool) -> Result<()> {
    let (sheet, survey) = run_worksheet(config, worksheet)?;
    let report = QuantityReport::from_survey(&survey, Some(&sheet.vessel));
    print_report(&report, json)
}

fn handle_survey(config: &Config, cmd: SurveyCommand) -> Result<()> {
    let store = open_store(config)?;

    match cmd {
        SurveyCommand::Save { worksheet, user } => {
            let (_, mut survey) = run_worksheet(config, &worksheet)?;
            let repo = SurveyRepository::new(&store, &user)?;
            let id = repo.create(&mut survey)?;
            println!("{id}");
        }
        SurveyCommand::List { user, json } => {
            let surveys = SurveyRepository::new(&store, &user)?.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&surveys)?);
            } else if surveys.is_empty() {
                println!("No surveys for user {user}.");
            } else {
                println!(
                    "{:<32}  {:<10}  {:<24}  {:<14}  {:>10}  {:>10}",
                    "ID", "Date", "Vessel", "Type", "HFO (t)", "MGO (t)"
                );
                for s in &surveys {
                    println!(
                        "{:<32}  {:<10}  {:<24}  {:<14}  {:>10.2}  {:>10.2}",
                        s.id.as_deref().unwrap_or("-"),
                        s.date,
                        s.details.vessel_name,
                        s.details.kind.to_string(),
                        s.total_hfo,
                        s.total_mgo
                    );
                }
            }
        }
        SurveyCommand::Show { id, user } => {
            let survey = SurveyRepository::new(&store, &user)?
                .get(&id)?
                .with_context(|| format!("no survey {id} for user {user}"))?;
            println!("{}", serde_json::to_string_pretty(&survey)?);
        }
        SurveyCommand::Delete { id, user } => {
            if !SurveyRepository::new(&store, &user)?.delete(&id)? {
                bail!("no survey {id} for user {user}");
            }
            println!("Deleted survey {id}.");
        }
        SurveyCommand::Report { id, user, json } => {
            let survey = SurveyRepository::new(&store, &user)?
                .get(&id)?
                .with_context(|| format!("no survey {id} for user {user}"))?;
            let vessel = VesselRepository::new(&store, &user)?
                .list()?
                .into_iter()
                .find(|v| !v.imo.is_empty() && v.imo == survey.details.vessel_imo);
            debug!("Vessel configuration found: {}", vessel.is_some());
            let report = QuantityReport::from_survey(&survey, vessel.as_ref());
            print_report(&report, json)?;
        }
    }
    Ok(())
}

fn handle_vessel(config: &Config, cmd: VesselCommand) -> Result<()> {
    let store = open_store(config)?;

    match cmd {
        VesselCommand::Import { file, user } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut vessel: Vessel = serde_json::from_str(&text)
                .with_context(|| format!("parsing vessel {}", file.display()))?;
            let id = VesselRepository::new(&store, &user)?.save(&mut vessel)?;
            println!("{id}");
        }
        VesselCommand::List { user, json } => {
            let vessels = VesselRepository::new(&store, &user)?.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vessels)?);
            } else if vessels.is_empty() {
                println!("No vessels for user {user}.");
            } else {
                for v in &vessels {
                    println!(
                        "{:<32}  {:<24}  IMO {:<9}  {} tanks",
                        v.id.as_deref().unwrap_or("-"),
                        v.name,
                        v.imo,
                        v.tanks.len()
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "documents": stats.total_documents,
            "collections": stats.per_collection,
            "last_updated": stats.last_updated,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("bunkrec status");
        println!("--------------");
        println!("Database:      {}", store.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Documents:     {}", stats.total_documents);
        for (collection, count) in &stats.per_collection {
            println!("  {collection:<14} {count}");
        }
        match stats.last_updated {
            Some(at) => println!("Last write:    {}", at.to_rfc3339()),
            None => println!("Last write:    never"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let calc = &config.calculator;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!();
                println!("[Calculator]");
                println!("  Default temperature: {} °C", calc.default_temperature);
                println!("  Fuel oil density:    {} t/m³", calc.fuel_oil_density);
                println!("  Distillate density:  {} t/m³", calc.distillate_density);
                println!("  Density fallback:    {} t/m³", calc.density_fallback);
                println!("  Air density:         {} t/m³", calc.air_density);
                println!();
                println!("[Survey]");
                println!("  Default type:        {}", config.survey.default_kind);
                println!(
                    "  Default location:    {}",
                    config.survey.default_location.as_deref().unwrap_or("-")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
