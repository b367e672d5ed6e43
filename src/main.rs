use anyhow::{bail, Result};
use barcode_index::config::FALLBACK_CATEGORY;
use barcode_index::lexicon::Lexicon;
use barcode_index::normalize::normalize_barcode;
use barcode_index::pipeline::{run_build, BuildConfig};
use barcode_index::store;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "barcode-index")]
#[command(about = "Build an offline barcode-to-product-name index from product datasets")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the SQLite index from the raw datasets
    Build(BuildArgs),
    /// Look up one barcode in a built index
    Lookup(LookupArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Directory containing the raw dataset archives
    #[arg(long)]
    raw_dir: PathBuf,

    /// Output SQLite file
    #[arg(short, long)]
    output: PathBuf,

    /// Include openfoodfacts-products.csv.gz
    #[arg(long)]
    include_off_food: bool,

    /// Aggregate and report without writing the index
    #[arg(long)]
    dry_run: bool,

    /// JSON file replacing the built-in noise tokens and alphabets
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Category written for winners that have none
    #[arg(long, default_value = FALLBACK_CATEGORY)]
    fallback_category: String,
}

#[derive(Args)]
struct LookupArgs {
    /// SQLite index produced by `build`
    #[arg(short, long)]
    index: PathBuf,

    /// Barcode to look up (non-digits are ignored)
    barcode: String,
}

fn run_build_command(args: BuildArgs) -> Result<()> {
    let lexicon = match &args.lexicon {
        Some(path) => Lexicon::from_path(path)?,
        None => Lexicon::default(),
    };

    let config = BuildConfig {
        raw_dir: args.raw_dir,
        output: args.output,
        include_off_food: args.include_off_food,
        dry_run: args.dry_run,
        lexicon,
        fallback_category: args.fallback_category,
    };

    let summary = run_build(&config)?;
    summary.print();
    Ok(())
}

fn run_lookup(args: LookupArgs) -> Result<()> {
    let barcode = normalize_barcode(&args.barcode);
    if barcode.is_empty() {
        bail!("Barcode contains no digits: {:?}", args.barcode);
    }

    match store::lookup(&args.index, &barcode)? {
        Some(row) => {
            println!("{}", serde_json::to_string_pretty(&row)?);
            Ok(())
        }
        None => bail!("Barcode not found: {}", barcode),
    }
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG, when set, overrides -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(cli.verbose)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Build(args) => run_build_command(args),
        Commands::Lookup(args) => run_lookup(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
