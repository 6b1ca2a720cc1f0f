use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use treepass::config::{Config, ConfigError};
use treepass::diagnostics::{render_error, PassError};
use treepass::lints;
use treepass::pass::{HandlerSet, HandlerSource, PassOptions, PassResults};

#[derive(Parser)]
#[command(name = "treepass", version, about = "Run handler passes over ESTree syntax trees")]
struct Cli {
    /// Log level for tracing output (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lints over an ESTree JSON file
    Check {
        /// ESTree JSON file
        ast: PathBuf,
        /// Source text the tree was parsed from; enables excerpts in diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
        /// Config file (defaults to treepass.toml next to the AST file)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Lint to run; may be repeated. Overrides `[lints] enabled`
        #[arg(long = "lint", value_parser = PossibleValuesParser::new(lints::NAMES.iter().copied()))]
        lints: Vec<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One diagnostic per warning, with a source excerpt when --source is given
    #[default]
    Text,
    /// The collected warnings as JSON
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid AST in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pass itself failed; `rendered` is what gets printed.
    #[error("{rendered}")]
    Pass { rendered: String },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Pass { .. } => 1,
            CliError::Io { .. } | CliError::Json { .. } | CliError::Output(_) | CliError::Config(_) => 2,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match &err {
                CliError::Pass { rendered } => eprint!("{rendered}"),
                other => eprintln!("error: {other}"),
            }
            ExitCode::from(err.exit_code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Check { ast, source, config, lints, format } => {
            check(&ast, source.as_deref(), config.as_deref(), lints, format)
        }
    }
}

fn check(
    ast: &Path,
    source_path: Option<&Path>,
    config_path: Option<&Path>,
    lint_names: Vec<String>,
    format: Format,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => {
            let dir = ast.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            Config::discover(dir)?.unwrap_or_default()
        }
    };

    let json = read(ast)?;
    let tree = treepass::parse_tree(&json).map_err(|source| CliError::Json { path: ast.to_path_buf(), source })?;

    let (source, filename) = match source_path {
        Some(path) => (read(path)?, path.display().to_string()),
        None => (String::new(), ast.display().to_string()),
    };
    let options = PassOptions::new(source, filename).with_keys(config.visitor_keys());

    let names = if !lint_names.is_empty() {
        lint_names
    } else if !config.lints.enabled.is_empty() {
        config.lints.enabled.clone()
    } else {
        lints::NAMES.iter().map(|n| n.to_string()).collect()
    };
    // Names were validated by clap or by the config loader.
    let sets: Vec<HandlerSet> = names.iter().filter_map(|n| lints::by_name(n)).collect();
    let sources: Vec<&dyn HandlerSource> = sets.iter().map(|s| s as &dyn HandlerSource).collect();
    tracing::debug!(lints = ?names, "running lints");

    let mut results = PassResults::default();
    if let Err(err) = treepass::run_passes(tree, &options, &sources, &mut results) {
        return Err(CliError::Pass { rendered: render_failure(&err, source_path.is_some()) });
    }

    let mut stdout = io::stdout().lock();
    let written = match format {
        Format::Json => serde_json::to_writer_pretty(&mut stdout, &results)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(stdout)),
        Format::Text => results.warnings.iter().try_for_each(|warning| {
            if source_path.is_some() {
                write!(stdout, "{}", warning.render(&options.source))
            } else {
                writeln!(stdout, "{warning}")
            }
        }),
    };
    written.map_err(CliError::Output)?;

    if format == Format::Text {
        let count = results.warnings.len();
        eprintln!("{count} warning{}", if count == 1 { "" } else { "s" });
    }
    Ok(())
}

/// Full excerpt when the source text is available, one line otherwise.
fn render_failure(err: &PassError, has_source: bool) -> String {
    if has_source {
        render_error(err)
    } else {
        format!("error: {err}\n")
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}
