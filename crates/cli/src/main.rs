// Series master CLI - batch updates, audit logs, publishing

mod compare;
mod exit_codes;
mod preview;
mod publish;
mod template;
mod update;
mod util;
mod validate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{io_exit_code, publish_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use seriesmaster_config::Settings;

#[derive(Parser)]
#[command(name = "smaster")]
#[command(about = "Apply batch updates and deletions to the series master, with an audit trail")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: ./seriesmaster.toml, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile an input batch against the master and write an audit log
    #[command(after_help = "\
Examples:
  smaster update --input changes.xlsx
  smaster update --input changes.csv --master data/Master.xlsx --sheet Master
  smaster update --input changes.csv --dry-run --json
  smaster update --input changes.xlsx --publish --repo acme/series")]
    Update(update::UpdateArgs),

    /// Check an input batch for required columns and count its requests
    #[command(after_help = "\
Examples:
  smaster validate changes.xlsx
  smaster validate changes.csv --json")]
    Validate {
        /// Input batch (CSV or Excel)
        input: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Write an empty input batch with the required headers
    #[command(after_help = "\
Examples:
  smaster template
  smaster template -o batch.csv")]
    Template {
        /// Output file (.xlsx or .csv)
        #[arg(long, short = 'o', default_value = "UpdateTemplate.xlsx")]
        output: PathBuf,
    },

    /// Show the first rows of the master
    #[command(after_help = "\
Examples:
  smaster preview
  smaster preview --rows 20
  smaster preview --master data/Master.xlsx --json")]
    Preview {
        /// Master file (default from settings)
        #[arg(long, short = 'm')]
        master: Option<PathBuf>,

        /// Worksheet name (default from settings)
        #[arg(long)]
        sheet: Option<String>,

        /// Number of rows to show
        #[arg(long, short = 'n', default_value_t = 100)]
        rows: usize,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Rank series names matching each requested series by usage share
    #[command(after_help = "\
Examples:
  smaster compare --requests requests.xlsx --series series.xlsx
  smaster compare --requests requests.csv --series series.csv --rules rules.csv --top-n 3 -o out.xlsx")]
    Compare(compare::CompareArgs),

    /// Upload a master file to a GitHub repository
    #[command(after_help = "\
Examples:
  smaster publish --repo acme/series
  GITHUB_TOKEN=... smaster publish data/Master.xlsx --repo acme/series --branch main --repo-path MasterSeriesHistory.xlsx")]
    Publish {
        /// File to upload (default: master path from settings)
        file: Option<PathBuf>,

        #[command(flatten)]
        target: publish::PublishArgs,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Save a GitHub token for publishing
    Login {
        /// Personal access token with contents:write
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Remove the saved GitHub token
    Logout,

    /// Print the effective settings
    Config,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, CliError> {
    let (settings, used) = Settings::load(path).map_err(|e| CliError::config(e.to_string()))?;
    if let Some(used) = used {
        log::info!("settings: {}", used.display());
    }
    Ok(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: smaster <command> [options]");
            eprintln!("       smaster --help for more information");
            Ok(())
        }
        Some(Commands::Update(args)) => load_settings(config).and_then(|s| update::cmd_update(args, &s)),
        Some(Commands::Validate { input, json }) => {
            load_settings(config).and_then(|s| validate::cmd_validate(input, json, &s))
        }
        Some(Commands::Template { output }) => {
            load_settings(config).and_then(|s| template::cmd_template(output, &s))
        }
        Some(Commands::Preview { master, sheet, rows, json }) => {
            load_settings(config).and_then(|s| preview::cmd_preview(master, sheet, rows, json, &s))
        }
        Some(Commands::Compare(args)) => load_settings(config).and_then(|s| compare::cmd_compare(args, &s)),
        Some(Commands::Publish { file, target, json }) => {
            load_settings(config).and_then(|s| publish::cmd_publish(file, target, json, &s))
        }
        Some(Commands::Login { token }) => publish::cmd_login(token),
        Some(Commands::Logout) => publish::cmd_logout(),
        Some(Commands::Config) => load_settings(config).and_then(|s| cmd_config(&s)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn cmd_config(settings: &Settings) -> Result<(), CliError> {
    let text = settings.to_toml().map_err(|e| CliError::config(e.to_string()))?;
    print!("{text}");
    Ok(())
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// File error with its registered exit code.
    pub fn io(err: seriesmaster_io::IoError) -> Self {
        let hint = match &err {
            seriesmaster_io::IoError::UnsupportedFormat(_) => {
                Some("use .csv, .tsv, .xlsx, .xlsm, .xls, .xlsb or .ods".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    /// Publish error with its registered exit code.
    pub fn publish(err: seriesmaster_publish::PublishError) -> Self {
        let hint = match &err {
            seriesmaster_publish::PublishError::NotAuthenticated => {
                Some("set GITHUB_TOKEN or run `smaster login --token <TOKEN>`".to_string())
            }
            seriesmaster_publish::PublishError::Validation(_) => {
                Some("the file changed on the branch since it was read; retry the publish".to_string())
            }
            _ => None,
        };
        Self { code: publish_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
