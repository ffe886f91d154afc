use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use kestrel_cli::commands::{self, analyze::AnalyzeOptions};
use kestrel_cli::{ExportFormat, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kestrel")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Analyze web server access logs for latency, status codes and CDN traffic",
    long_about = "Kestrel reads an access log, groups requests by endpoint, hour, status code \
                  and origin (CDN edge or direct), flags slow requests and exports the results \
                  to Excel or CSV."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an access log
    Analyze {
        /// Path to the access log
        #[arg(value_name = "LOG_FILE")]
        file: PathBuf,

        /// Slow request threshold in seconds (suggested from the data when omitted)
        #[arg(short, long, env = "KESTREL_THRESHOLD")]
        threshold: Option<f64>,

        /// Export the analysis
        #[arg(short, long, value_enum)]
        export: Option<ExportFormat>,

        /// Workbook path for Excel export
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for CSV export (defaults to the log's directory)
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Download the current CDN ranges instead of using the built-in list
        #[arg(long)]
        refresh_cdn_ranges: bool,

        /// Extra CIDR range to treat as CDN (repeatable)
        #[arg(long = "cdn-range", value_name = "CIDR")]
        cdn_ranges: Vec<String>,

        /// Text that marks a line as CDN traffic
        #[arg(long, env = "KESTREL_CDN_MARKER", default_value = "cf-node")]
        cdn_marker: String,

        /// Number of endpoints in the top endpoints table
        #[arg(long, default_value_t = 25)]
        top: usize,
    },

    /// Show the CDN ranges used for origin detection
    Ranges {
        /// Download the current CDN ranges instead of using the built-in list
        #[arg(long)]
        refresh_cdn_ranges: bool,
    },

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for kestrel.

SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    Bash:
        kestrel completion --shell bash >> ~/.bashrc

    Zsh:
        kestrel completion --shell zsh > ~/.zfunc/_kestrel
        # then add `fpath+=~/.zfunc` to ~/.zshrc

    Fish:
        kestrel completion --shell fish > ~/.config/fish/completions/kestrel.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            file,
            threshold,
            export,
            output,
            csv_dir,
            refresh_cdn_ranges,
            cdn_ranges,
            cdn_marker,
            top,
        } => {
            let options = AnalyzeOptions {
                threshold,
                refresh_cdn_ranges,
                cdn_ranges,
                cdn_marker,
                top,
                export,
                output,
                csv_dir,
                progress: true,
            };
            commands::analyze::execute(&file, &options, cli.format)
        }
        Commands::Ranges { refresh_cdn_ranges } => {
            commands::ranges::execute(refresh_cdn_ranges, cli.format)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("kestrel=debug,kestrel_cli=debug,kestrel_core=debug,kestrel_detectors=debug")
    } else {
        EnvFilter::new("kestrel=info,kestrel_cli=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
