//! RVFXE - color parameter editor and batch converter for game-asset JSON
//!
//! Every command prints one JSON record on stdout; batch commands stream
//! progress as JSON lines on stderr. Exit codes follow [`ExitCode`].

use clap::{Parser, Subcommand};
use rvfxe::cli::{
    BatchArgs, CacheArgs, CliResult, ConfigArgs, ExitCode, FromJsonArgs, ProjectArgs,
    RecolorArgs, ScanArgs, ToJsonArgs,
};
use rvfxe::convert::ConversionDirection;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RVFXE - edit VFX colors in game-asset JSON and convert assets in bulk
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one binary asset to JSON
    ToJson(ToJsonArgs),
    /// Convert one JSON document back to a binary asset
    FromJson(FromJsonArgs),
    /// Convert a list of binary assets to JSON in parallel
    BatchToJson(BatchArgs),
    /// Convert a list of JSON documents back to binary assets in parallel
    BatchFromJson(BatchArgs),
    /// Extract and list color parameters
    Scan(ScanArgs),
    /// Recolor parameters and write the patched documents
    Recolor(RecolorArgs),
    /// Export or import project files
    Project(ProjectArgs),
    /// Inspect or clear the conversion cache
    Cache(CacheArgs),
    /// Show or change configuration
    Config(ConfigArgs),
    /// Print version information as JSON
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: &Commands) -> CliResult<i32> {
    let success = ExitCode::Success.code();
    match command {
        Commands::ToJson(args) => args.execute().map(|()| success),
        Commands::FromJson(args) => args.execute().map(|()| success),
        Commands::BatchToJson(args) => args.execute(ConversionDirection::ToJson),
        Commands::BatchFromJson(args) => args.execute(ConversionDirection::FromJson),
        Commands::Scan(args) => args.execute().map(|()| success),
        Commands::Recolor(args) => args.execute().map(|()| success),
        Commands::Project(args) => args.execute().map(|()| success),
        Commands::Cache(args) => args.execute().map(|()| success),
        Commands::Config(args) => args.execute().map(|()| success),
        Commands::Version => rvfxe::cli::version::execute().map(|()| success),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::Usage.code()
            } else {
                ExitCode::Success.code()
            };
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);
    debug!("Running {:?}", cli.command);

    let code = match run(&cli.command) {
        Ok(code) => code,
        Err(e) => {
            debug!("Command failed: {}", e);
            e.report();
            e.exit_code()
        }
    };
    std::process::exit(code);
}
