//! Category CLI.
//!
//! # Responsibility
//! - Drive category use-cases against a SQLite database file.
//! - Print committed records as JSON and failures with their machine code.

use category_core::{
    default_log_level, error_chain, init_logging, open_db_with_options, CategoryDraft, CategoryId,
    CategoryKind, CategoryService, CategoryServiceError, DbOptions, SqliteCategoryRepository,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "category")]
#[command(about = "Manage user and supplier categories", long_about = None)]
struct Cli {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "CATEGORY_DB")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CATEGORY_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error; defaults per build mode.
    #[arg(long, env = "CATEGORY_LOG_LEVEL")]
    log_level: Option<String>,

    /// How long to wait on a locked database before failing.
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,

    #[arg(value_enum)]
    kind: KindArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    User,
    Supplier,
}

impl From<KindArg> for CategoryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::User => CategoryKind::User,
            KindArg::Supplier => CategoryKind::Supplier,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List every category in insertion order
    List,
    /// Show one category
    Get { id: CategoryId },
    /// Create a category
    Create(FieldArgs),
    /// Replace name/description if the category is still at VERSION
    Update {
        id: CategoryId,
        #[arg(long)]
        version: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a category
    Delete { id: CategoryId },
}

#[derive(Debug, Args)]
struct FieldArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
}

impl From<FieldArgs> for CategoryDraft {
    fn from(value: FieldArgs) -> Self {
        CategoryDraft::new(value.name, value.description)
    }
}

#[derive(Debug)]
enum CliError {
    Setup(String),
    Service(CategoryServiceError),
    Output(serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Service(CategoryServiceError::NotFound { .. }) => 2,
            Self::Service(CategoryServiceError::Conflict { .. }) => 3,
            Self::Service(CategoryServiceError::Invalid(_)) => 4,
            _ => 1,
        }
    }
}

impl From<CategoryServiceError> for CliError {
    fn from(value: CategoryServiceError) -> Self {
        Self::Service(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match &err {
                CliError::Setup(message) => eprintln!("Error: {message}"),
                CliError::Output(json_err) => {
                    eprintln!("Error: failed to render output: {json_err}")
                }
                CliError::Service(service_err) => {
                    eprintln!("Error [{}]: {}", service_err.code(), error_chain(service_err))
                }
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| CliError::Setup(error_chain(&err)))?;
    }

    let options = DbOptions {
        busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
    };
    let conn = open_db_with_options(&cli.db, &options)
        .map_err(|err| CliError::Setup(error_chain(&err)))?;
    let kind = CategoryKind::from(cli.kind);
    let repo = SqliteCategoryRepository::try_new(&conn, kind)
        .map_err(|err| CliError::Setup(error_chain(&err)))?;
    let service = CategoryService::new(repo);
    info!("event=cli_command module=cli status=start kind={kind}");

    let output = match cli.command {
        Commands::List => to_json(&service.list()?),
        Commands::Get { id } => to_json(&service.get(id)?),
        Commands::Create(fields) => to_json(&service.create(&fields.into())?),
        Commands::Update {
            id,
            version,
            fields,
        } => to_json(&service.update(id, version, &fields.into())?),
        Commands::Delete { id } => {
            service.delete(id)?;
            Ok(format!("{{\"deleted\":{id}}}"))
        }
    }?;

    Ok(output)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Output)
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliError, Commands, KindArg};
    use category_core::{CategoryKind, CategoryServiceError};
    use clap::Parser;

    #[test]
    fn update_parses_version_and_fields() {
        let cli = Cli::try_parse_from([
            "category",
            "--db",
            "/tmp/categories.db",
            "supplier",
            "update",
            "7",
            "--version",
            "3",
            "--name",
            "Atacado",
        ])
        .unwrap();

        assert!(matches!(cli.kind, KindArg::Supplier));
        match cli.command {
            Commands::Update {
                id,
                version,
                fields,
            } => {
                assert_eq!((id, version), (7, 3));
                assert_eq!(fields.name, "Atacado");
                assert_eq!(fields.description, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_requires_expected_version() {
        let result = Cli::try_parse_from([
            "category", "--db", "x.db", "user", "update", "1", "--name", "n",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn exit_codes_distinguish_outcomes() {
        let not_found = CliError::Service(CategoryServiceError::NotFound {
            kind: CategoryKind::User,
            id: 1,
        });
        let conflict = CliError::Service(CategoryServiceError::Conflict {
            kind: CategoryKind::User,
            id: 1,
            expected_version: 0,
        });
        assert_eq!(not_found.exit_code(), 2);
        assert_eq!(conflict.exit_code(), 3);
        assert_eq!(CliError::Setup("boom".to_string()).exit_code(), 1);
    }
}
