mod commands;
mod render;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use findoc_core::{Currency, DocumentType, WorkflowModel};
use findoc_service::{ApiError, ServiceConfig};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Workflow table selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModelArg {
    Branching,
    Linear,
}

impl From<ModelArg> for WorkflowModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Branching => WorkflowModel::Branching,
            ModelArg::Linear => WorkflowModel::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TypeArg {
    Invoice,
    Bill,
    CreditNote,
    PurchaseOrder,
    ExpenseReport,
}

impl From<TypeArg> for DocumentType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Invoice => DocumentType::Invoice,
            TypeArg::Bill => DocumentType::Bill,
            TypeArg::CreditNote => DocumentType::CreditNote,
            TypeArg::PurchaseOrder => DocumentType::PurchaseOrder,
            TypeArg::ExpenseReport => DocumentType::ExpenseReport,
        }
    }
}

/// Simulated finance documents API.
#[derive(Parser)]
#[command(name = "findoc", version, about = "Simulated finance documents API")]
struct Cli {
    /// Path to a TOML service configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log at debug level to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a deterministic synthetic dataset
    Generate {
        /// Number of documents (defaults to dataset.count)
        #[arg(long)]
        count: Option<usize>,
        /// Random seed (defaults to dataset.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the seeded documents with filter, sort and pagination
    List {
        /// Filter expression, e.g. status:in:INIT|SUBMITTED,amount:gt:1000
        #[arg(long)]
        filter: Option<String>,
        /// Sort expression, e.g. amount:desc,issueDate
        #[arg(long)]
        sort: Option<String>,
        /// Page size, clamped to 1..=100
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,
        /// Cursor returned by a previous page
        #[arg(long)]
        cursor: Option<String>,
        /// Follow next cursors until the last page
        #[arg(long)]
        all: bool,
        /// Simulated latency in milliseconds (overrides network.latency_ms)
        #[arg(long)]
        latency_ms: Option<u64>,
        /// Simulated failure probability (overrides network.fail_rate)
        #[arg(long)]
        fail_rate: Option<f64>,
    },

    /// Show one seeded document
    Show {
        /// Document id, e.g. doc_000001
        id: String,
    },

    /// Create a document and walk it through the workflow to a terminal state
    Workflow {
        /// Document amount
        #[arg(long, default_value = "5000")]
        amount: Decimal,
        /// ISO currency code
        #[arg(long, default_value = "USD")]
        currency: Currency,
        /// Document type
        #[arg(long = "type", default_value = "invoice", value_enum)]
        doc_type: TypeArg,
        /// Counterparty name
        #[arg(long, default_value = "Acme Corp")]
        counterparty: String,
        /// Workflow table (overrides workflow.model)
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
    },

    /// Print the legal transitions of a workflow table
    Transitions {
        /// Workflow table (overrides workflow.model)
        #[arg(long, value_enum)]
        model: Option<ModelArg>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref(), cli.output, cli.quiet);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {e}"),
                cli.output,
                cli.quiet,
            );
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Generate { count, seed } => {
            let count = count.unwrap_or(config.dataset.count);
            let seed = seed.unwrap_or(config.dataset.seed);
            rt.block_on(commands::generate::cmd_generate(
                &config, count, seed, cli.output, cli.quiet,
            ));
        }
        Commands::List {
            filter,
            sort,
            limit,
            cursor,
            all,
            latency_ms,
            fail_rate,
        } => {
            if let Some(latency_ms) = latency_ms {
                config.network.latency_ms = latency_ms;
            }
            if let Some(fail_rate) = fail_rate {
                config.network.fail_rate = fail_rate;
            }
            if let Err(e) = config.validate() {
                report_error(&e.to_string(), cli.output, cli.quiet);
                process::exit(1);
            }
            let args = commands::list::ListArgs {
                filter,
                sort,
                limit,
                cursor,
                all,
            };
            rt.block_on(commands::list::cmd_list(
                &config, args, cli.output, cli.quiet,
            ));
        }
        Commands::Show { id } => {
            rt.block_on(commands::show::cmd_show(&config, &id, cli.output, cli.quiet));
        }
        Commands::Workflow {
            amount,
            currency,
            doc_type,
            counterparty,
            model,
        } => {
            if let Some(model) = model {
                config.workflow.model = model.into();
            }
            let args = commands::workflow::DemoArgs {
                amount,
                currency,
                doc_type: doc_type.into(),
                counterparty,
            };
            rt.block_on(commands::workflow::cmd_workflow(
                &config, args, cli.output, cli.quiet,
            ));
        }
        Commands::Transitions { model } => {
            if let Some(model) = model {
                config.workflow.model = model.into();
            }
            commands::transitions::cmd_transitions(&config, cli.output, cli.quiet);
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read `--config` if given, otherwise use the defaults. Exits on error.
fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> ServiceConfig {
    let Some(path) = path else {
        return ServiceConfig::default();
    };
    match ServiceConfig::load(path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Report an API failure with its status code, then exit 1.
pub(crate) fn exit_with_api_error(err: &ApiError, output: OutputFormat, quiet: bool) -> ! {
    if !quiet {
        match output {
            OutputFormat::Text => eprintln!("error ({}): {}", err.status_code(), err),
            OutputFormat::Json => eprintln!(
                "{}",
                serde_json::json!({
                    "error": err.to_string(),
                    "status": err.status_code(),
                    "retryable": err.is_retryable(),
                })
            ),
        }
    }
    process::exit(1);
}
