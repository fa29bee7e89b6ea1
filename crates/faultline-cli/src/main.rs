mod archive;
mod commands;
mod display;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "faultline",
    version,
    about = "Turn accident-analysis webhook output into per-driver fault letters"
)]
struct Cli {
    /// Increase log detail (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a spreadsheet to the analysis webhook and write one PDF per driver
    Process {
        /// Spreadsheet or CSV of police accident reports
        file: PathBuf,

        /// Analysis webhook endpoint
        #[arg(long, env = "FAULTLINE_WEBHOOK_URL")]
        webhook_url: String,

        #[command(flatten)]
        classifier: ClassifierArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the pipeline over a saved webhook response body
    Replay {
        /// File containing the raw response text
        file: PathBuf,

        #[command(flatten)]
        classifier: ClassifierArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Classify a single letter as fault or not_fault
    Classify {
        /// Plain-text letter
        file: PathBuf,

        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Re-render an archived report list to PDFs
    Render {
        /// JSON archive written by `process` or `replay`
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct ClassifierArgs {
    /// Enables the Gemini fallback for letters without a clear fault signal
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = faultline_ai::gemini::DEFAULT_MODEL)]
    gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = faultline_ai::gemini::DEFAULT_BASE_URL)]
    gemini_base_url: String,

    /// Label used when neither the wording nor the fallback decides
    #[arg(long, env = "FAULTLINE_TIE_BREAK", value_enum, default_value_t = TieBreakArg::CoinFlip)]
    tie_break: TieBreakArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum TieBreakArg {
    CoinFlip,
    Fault,
    NotFault,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for generated PDFs
    #[arg(long, env = "FAULTLINE_OUT_DIR", default_value = "./letters")]
    out_dir: PathBuf,

    /// Report archive (default: <OUT_DIR>/reports.json)
    #[arg(long)]
    archive: Option<PathBuf>,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::info!("faultline v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Process {
            file,
            webhook_url,
            classifier,
            output,
        } => commands::process(&file, &webhook_url, &classifier, &output).await,
        Commands::Replay {
            file,
            classifier,
            output,
        } => commands::replay(&file, &classifier, &output).await,
        Commands::Classify { file, classifier } => commands::classify(&file, &classifier).await,
        Commands::Render { file, output } => commands::render(&file, &output).await,
    }
}
