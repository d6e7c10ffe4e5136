use clap::{ArgAction, Parser, Subcommand};
use commands::{baseline, config, serve, status, sweep};

mod commands;
mod logging;
mod output;
mod webhook;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Herald - announces new arrivals and quality upgrades from your media server")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server and background pollers
    #[command(
        long_about = "Start the webhook endpoint and the per-kind background pollers. Notifications go out for new arrivals and quality upgrades; the shared ledger keeps the two observation paths from announcing the same event twice."
    )]
    Serve {
        /// Bind address override (e.g. '0.0.0.0:5000')
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Run only the webhook endpoint, without the background pollers
        #[arg(long, action = ArgAction::SetTrue)]
        no_pollers: bool,
    },

    /// Mark the existing library as announced without notifying
    #[command(
        long_about = "Page through the entire catalog and record every item as already announced. Run once when pointing herald at a pre-existing library, so deployment does not flood your channels with historical content."
    )]
    Baseline,

    /// Run one ledger garbage-collection sweep
    #[command(
        long_about = "Remove ledger rows whose content no longer exists in the catalog and that have aged past the grace period. The serve command runs this periodically on its own."
    )]
    Sweep,

    /// Show ledger row counts
    Status,

    /// Configure server credentials and settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks credentials)
    Show,

    /// Configure the media server connection
    Jellyfin {
        /// Base URL, e.g. http://jellyfin:8096 (prompts if omitted)
        #[arg(long)]
        url: Option<String>,
    },

    /// Configure the Telegram transport
    Telegram {
        /// Chat id to deliver to (prompts if omitted)
        #[arg(long)]
        chat_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to initialize logging: {}", e))?;

    let out = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Serve { bind, no_pollers } => serve::run_serve(bind, no_pollers, &out).await,
        Commands::Baseline => baseline::run_baseline(&out).await,
        Commands::Sweep => sweep::run_sweep(&out).await,
        Commands::Status => status::run_status(&out).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config::run_show(&out),
            ConfigCommands::Jellyfin { url } => config::run_jellyfin(url, &out),
            ConfigCommands::Telegram { chat_id } => config::run_telegram(chat_id, &out),
        },
    }
}
