// Headless CLI for annotab tables

mod exit_codes;
mod table_cmds;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use annotab_config::Settings;
use annotab_engine::StoreError;
use annotab_io::IoError;

use exit_codes::*;

#[derive(Parser)]
#[command(name = "annotab")]
#[command(about = "Annotate tables against reconciliation services (headless)")]
#[command(version)]
struct Cli {
    /// Settings file (default: the user config dir)
    #[arg(long, global = true, env = "ANNOTAB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV/TSV file into a table snapshot
    #[command(after_help = "\
Examples:
  annotab import cities.csv -o cities.json
  annotab import export.txt --separator ';' -o table.json")]
    Import {
        /// Delimited input file
        input: PathBuf,

        /// Field separator (sniffed when omitted)
        #[arg(long, short = 's')]
        separator: Option<char>,

        /// Table name (default: the file name)
        #[arg(long)]
        name: Option<String>,

        /// Output snapshot
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Show columns, status and reconciliators of a table
    #[command(after_help = "\
Examples:
  annotab inspect table.json
  annotab inspect table.json --json")]
    Inspect {
        /// Table snapshot
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a JSON array of store operations, each one undoable
    #[command(after_help = "\
Examples:
  annotab apply table.json --ops edits.json
  annotab apply table.json --ops edits.json -o edited.json

Each operation is an object tagged by \"op\":
  [{\"op\": \"update_cell_label\", \"cell\": \"r0$City\", \"value\": \"Roma\"},
   {\"op\": \"auto_matching\"},
   {\"op\": \"undo\"}]

auto_matching without a threshold uses matching.threshold from settings.")]
    Apply {
        /// Table snapshot
        file: PathBuf,

        /// Operations file
        #[arg(long)]
        ops: PathBuf,

        /// Output snapshot (default: overwrite the input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Merge reconciliation service results into a table
    #[command(after_help = "\
Examples:
  annotab merge table.json --results wd.json --reconciliator wikidata
  annotab merge table.json --results out.json --reconciliator geo --name GeoNames -o merged.json")]
    Merge {
        /// Table snapshot
        file: PathBuf,

        /// Service results: [{\"id\": \"r0$City\", \"metadata\": [...]}]
        #[arg(long)]
        results: PathBuf,

        /// Reconciliator id
        #[arg(long)]
        reconciliator: String,

        /// Reconciliator display name (default: from settings, else the id)
        #[arg(long)]
        name: Option<String>,

        /// Output snapshot (default: overwrite the input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Save a table into a SQLite table store
    #[command(after_help = "\
Examples:
  annotab save table.json --db tables.db")]
    Save {
        /// Table snapshot; rewritten with the assigned id
        file: PathBuf,

        /// Table store file (created when missing)
        #[arg(long)]
        db: PathBuf,
    },

    /// List tables in a SQLite table store
    List {
        /// Table store file
        #[arg(long)]
        db: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Import { input, separator, name, output } => {
            table_cmds::cmd_import(&settings, &input, separator, name, &output)
        }
        Commands::Inspect { file, json } => table_cmds::cmd_inspect(&file, json),
        Commands::Apply { file, ops, output } => {
            table_cmds::cmd_apply(&settings, &file, &ops, output.as_deref())
        }
        Commands::Merge { file, results, reconciliator, name, output } => table_cmds::cmd_merge(
            &settings,
            &file,
            &results,
            &reconciliator,
            name,
            output.as_deref(),
        ),
        Commands::Save { file, db } => table_cmds::cmd_save(&settings, &file, &db),
        Commands::List { db, json } => table_cmds::cmd_list(&db, json),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = &e.hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path).map_err(|e| {
            CliError::args(format!("{}: {e}", path.display()))
                .with_hint("see `[history]`, `[matching]` and `[services]` in settings.toml")
        }),
        None => Ok(Settings::load()),
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn error(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Map an I/O layer error onto the exit code registry.
    pub fn from_io(context: &Path, err: IoError) -> Self {
        let message = format!("{}: {err}", context.display());
        match err {
            IoError::Io(_) | IoError::Sqlite(_) => Self::io(message),
            IoError::NotFound(_) => Self::error(message),
            IoError::Csv(_) | IoError::Json(_) | IoError::Invalid(_) => Self::parse(message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::error(err.to_string())
    }
}
