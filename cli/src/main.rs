mod dump;

use std::io::stdout;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use egk::pcsc::Context;
use egk::{Card, TracingTransport};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::dump::Output;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Error occurred on communicating with PC/SC device: {0}")]
    Pcsc(#[from] egk::pcsc::Error),

    #[error("Could not write {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Could not serialise the record: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reads and decodes every file readable without a PIN.
    Dump(DumpArgs),
}

#[derive(Args)]
struct DumpArgs {
    /// Print every APDU exchanged with the card.
    #[arg(short, long)]
    trace: bool,

    /// Save certificates and compressed documents into this directory.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Print decoded records as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Dump(args) => {
            let ctx = Context::try_new()?;
            let device = ctx.open()?;
            let pcsc_card = device.connect(&ctx)?;

            println!("reader: {}", device.name());
            println!("atr: {}", hex::encode(pcsc_card.atr()?));

            let output = Output::new(args.out_dir, args.json)?;
            debug!("Dumping with trace={}", args.trace);

            match args.trace {
                true => dump::dump_all(Card::new(TracingTransport::new(pcsc_card, stdout())), &output),
                _ => dump::dump_all(Card::new(pcsc_card), &output),
            }
        }
    }
}
