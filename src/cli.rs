use crate::api::rest::RestClient;
use crate::config::Config;
use crate::dataset::ReferenceData;
use crate::error::SeedError;
use crate::service::{creative, health, upsert};
use crate::types::{LookupEntry, LookupTable};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

/// Seed and maintain lookup tables and creatives through a PostgREST API.
#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct Cli {
    /// TOML config file. Defaults to `refseed.toml` in the working directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Check the API answers and which lookup tables are readable
    Check,
    /// Upsert the reference dataset into the lookup tables
    Seed {
        /// Only seed this table
        #[arg(long, value_parser = parse_table)]
        table: Option<LookupTable>,
        /// JSON dataset replacing the built-in one
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Do not create the test creative afterwards
        #[arg(long)]
        skip_test_creative: bool,
    },
    /// Create or update a single lookup row by code
    Upsert {
        #[arg(value_parser = parse_table)]
        table: LookupTable,
        code: String,
        name: String,
    },
    /// Creative maintenance
    Creative {
        #[command(subcommand)]
        action: CreativeCommand,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CreativeCommand {
    /// Create the test creative referencing seeded lookup rows
    Test,
    /// Point the newest creative with a given title at another format
    SetFormat {
        #[arg(long)]
        title: String,
        #[arg(long = "format")]
        format_code: String,
    },
}

fn parse_table(s: &str) -> Result<LookupTable, String> {
    s.parse().map_err(|e: SeedError| e.to_string())
}

pub async fn run(command: Command, cfg: &Config) -> Result<(), SeedError> {
    let client = RestClient::new(cfg)?;

    match command {
        Command::Check => {
            health::check_connection(&client).await?;
            let available = health::available_tables(&client, &LookupTable::ALL).await;
            info!(
                available = available.len(),
                total = LookupTable::ALL.len(),
                "table check finished"
            );
            Ok(())
        }
        Command::Seed {
            table,
            dataset,
            skip_test_creative,
        } => {
            let wanted: Vec<LookupTable> = match table {
                Some(t) => vec![t],
                None => LookupTable::ALL.to_vec(),
            };
            let available = health::available_tables(&client, &wanted).await;
            if available.is_empty() {
                return Err(SeedError::NoTablesAvailable);
            }

            let data = match dataset {
                Some(path) => ReferenceData::from_json_file(&path)?,
                None => ReferenceData::builtin(),
            };
            let data = match table {
                Some(t) => data.only(t),
                None => data,
            }
            .restricted_to(&available);

            let summary = upsert::seed_all(&client, &data, cfg.table_pause()).await;
            info!(
                tables = summary.reports.len(),
                touched = summary.tables_touched(),
                failed = summary.total_failed(),
                "seeding finished"
            );

            if !skip_test_creative
                && !summary.reports.is_empty()
                && let Err(e) = creative::create_test_creative(&client).await
            {
                warn!(error = %e, "test creative was not created");
            }
            Ok(())
        }
        Command::Upsert { table, code, name } => {
            let entry = LookupEntry::new(code, name);
            let outcome = upsert::upsert_entry(&client, table, &entry).await?;
            info!(%table, code = %entry.code, name = %entry.name, ?outcome, "upsert done");
            Ok(())
        }
        Command::Creative { action } => match action {
            CreativeCommand::Test => creative::create_test_creative(&client).await,
            CreativeCommand::SetFormat { title, format_code } => {
                creative::set_creative_format(&client, &title, &format_code)
                    .await
                    .map(drop)
            }
        },
    }
}
