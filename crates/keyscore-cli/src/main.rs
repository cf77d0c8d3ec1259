//! keyscore CLI: score an exam answer key and rank it against everyone
//! submitted so far.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "keyscore", version, about = "Exam answer-key scorer and rank predictor")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Population store file (overrides config and KEYSCORE_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an answer key and record the result
    Submit {
        /// Answer-key URL, or "demo" for sample data
        #[arg(long, conflicts_with_all = ["html_file", "document"])]
        url: Option<String>,

        /// Saved answer-key page (HTML or a view-source dump)
        #[arg(long, conflicts_with = "document")]
        html_file: Option<PathBuf>,

        /// Answer-key document (PDF); not supported yet
        #[arg(long)]
        document: Option<PathBuf>,

        /// Candidate category (falls back to the configured default)
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        sub_category: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        state: Option<String>,

        /// Exam language
        #[arg(long)]
        language: Option<String>,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file (default for html: ./scorecard-<roll number>.html)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract an answer key without scoring it
    Parse {
        /// Answer-key URL
        #[arg(long, conflicts_with = "html_file", required_unless_present = "html_file")]
        url: Option<String>,

        /// Saved answer-key page
        #[arg(long)]
        html_file: Option<PathBuf>,
    },

    /// Look up a stored result
    Result {
        #[arg(long)]
        roll_number: String,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file for the html format
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Population statistics
    Stats {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("keyscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        config: cli.config,
        store: cli.store,
    };

    let result = match cli.command {
        Commands::Submit {
            url,
            html_file,
            document,
            category,
            sub_category,
            gender,
            state,
            language,
            format,
            output,
        } => {
            let args = commands::submit::SubmitArgs {
                url,
                html_file,
                document,
                category,
                sub_category,
                gender,
                state,
                language,
                format,
                output,
            };
            commands::submit::execute(&ctx, args).await
        }
        Commands::Parse { url, html_file } => commands::parse::execute(&ctx, url, html_file).await,
        Commands::Result {
            roll_number,
            format,
            output,
        } => commands::result::execute(&ctx, roll_number, format, output).await,
        Commands::Stats { format } => commands::stats::execute(&ctx, format).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
