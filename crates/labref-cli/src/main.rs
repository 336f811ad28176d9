mod commands;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "labref",
    version,
    about = "Resolve reference ranges and classify laboratory results"
)]
struct Cli {
    /// SQLite database with laboratories and standard reference ranges
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// JSON file with extra facility aliases and severity terms
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every parameter of an extracted report payload
    Classify {
        /// Path to the extractor output (JSON, optionally fenced)
        input_file: PathBuf,

        /// Patient gender: male, female, other (anything else is unknown)
        #[arg(short, long, default_value = "unknown")]
        gender: String,

        /// Patient age in whole years
        #[arg(short, long, conflicts_with = "birth_date")]
        age: Option<u32>,

        /// Patient birth date (YYYY-MM-DD); age is taken on the collection date
        #[arg(long, value_name = "DATE")]
        birth_date: Option<NaiveDate>,

        /// Store the measurements under this document ID (requires --db)
        #[arg(long, value_name = "ID", requires = "db")]
        document_id: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Show the canonical form of a laboratory name
    Normalize {
        /// Raw laboratory name
        name: String,
    },
    /// Manage stored standard reference ranges
    References {
        #[command(subcommand)]
        action: ReferencesAction,
    },
}

#[derive(Subcommand)]
enum ReferencesAction {
    /// Import standard ranges from a JSON array
    Import {
        /// Path to JSON file
        file: PathBuf,
    },
    /// List stored ranges for a parameter
    List {
        /// Parameter code (e.g. GLICOSE)
        parameter_code: String,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Exclude a range from lookups
    Deactivate {
        /// Range ID
        id: i64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let db = cli.db.as_deref();

    let result = match cli.command {
        Commands::Classify {
            input_file,
            gender,
            age,
            birth_date,
            document_id,
            output,
        } => commands::classify::run(
            &input_file,
            commands::classify::PatientArgs {
                gender,
                age,
                birth_date,
            },
            db,
            config,
            document_id.as_deref(),
            &output,
        ),
        Commands::Normalize { name } => commands::normalize::run(&name, config),
        Commands::References { action } => match action {
            ReferencesAction::Import { file } => commands::references::import(db, &file),
            ReferencesAction::List {
                parameter_code,
                output,
            } => commands::references::list(db, &parameter_code, &output),
            ReferencesAction::Deactivate { id } => commands::references::deactivate(db, id),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
