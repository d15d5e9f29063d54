use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fee_core::format_inr;
use fee_data::{PackageLoader, RateCardCsv};
use fee_db_sqlite::SqliteRepository;

/// Rate-card and package data tooling.
#[derive(Parser, Debug)]
#[command(name = "fee-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare a rate-card CSV (slab_id,entity_type,service_type,fee)
    /// against the built-in rate card. Exits non-zero on any finding.
    Audit {
        /// Path to the CSV file to check
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write the built-in rate card as CSV.
    Export {
        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import service packages
    /// (name,description,slab_id,entity_type,service_type,active).
    Packages {
        /// Path to the CSV file containing packages
        #[arg(short, long)]
        file: PathBuf,

        /// SQLite database path or URL; created if missing
        #[arg(short, long, default_value = "portal.db")]
        database: String,

        /// Run database migrations before loading data
        #[arg(short, long, default_value_t = false)]
        migrate: bool,

        /// Run seed files from the specified directory after migrations
        #[arg(short, long)]
        seeds: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    match Args::parse().command {
        Command::Audit { file } => audit(file),
        Command::Export { output } => export(output),
        Command::Packages {
            file,
            database,
            migrate,
            seeds,
        } => packages(file, &database, migrate, seeds).await,
    }
}

fn audit(file: PathBuf) -> Result<()> {
    let reader =
        File::open(&file).with_context(|| format!("Failed to open: {}", file.display()))?;
    let records = RateCardCsv::parse(reader)
        .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;

    let audit = RateCardCsv::audit(&records);
    for finding in &audit.findings {
        println!("{finding}");
    }
    println!(
        "{} rows read, {} match the rate card, {} findings.",
        audit.rows,
        audit.matched,
        audit.findings.len()
    );

    if !audit.is_clean() {
        bail!("{} does not match the rate card", file.display());
    }
    Ok(())
}

fn export(output: Option<PathBuf>) -> Result<()> {
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let written = RateCardCsv::export(writer).context("Failed to write rate card")?;

    if let Some(path) = output {
        println!("Wrote {} rate-card rows to {}.", written, path.display());
    }
    Ok(())
}

async fn packages(
    file: PathBuf,
    database: &str,
    migrate: bool,
    seeds: Option<PathBuf>,
) -> Result<()> {
    let repo = SqliteRepository::new(database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", database))?;

    if migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading packages from: {}", file.display());

    let reader =
        File::open(&file).with_context(|| format!("Failed to open: {}", file.display()))?;
    let records = PackageLoader::parse(reader)
        .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let created = PackageLoader::load(&repo, &records)
        .await
        .context("Failed to load packages into database")?;

    for package in &created {
        println!(
            "  #{} {} ({}) {}",
            package.id,
            package.name,
            package.key(),
            format_inr(package.price())
        );
    }
    println!("Successfully loaded {} packages into the database.", created.len());

    Ok(())
}
