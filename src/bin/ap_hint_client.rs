//! Connect to an Archipelago room and earn hints by idling
//!
//! Run with: cargo run --bin ap-hint-client -- --port 38281 --slot Runner --timer-file idle.txt

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use ap_hint_client::client::{run as run_session, ClientBuilder};
use ap_hint_client::telemetry::{self, MilestoneTracker, DEFAULT_MILESTONE_SECS};
use ap_hint_client::{logging, Client, Error, SessionEvent};

#[derive(Parser)]
#[command(name = "ap-hint-client")]
#[command(about = "Archipelago client that requests a hint for every stretch of doing nothing")]
struct Args {
    /// Server host (blank for archipelago.gg)
    #[arg(long, default_value = "archipelago.gg")]
    host: String,

    #[arg(long)]
    port: u16,

    /// Slot name to connect as
    #[arg(long)]
    slot: String,

    #[arg(long, default_value = "")]
    password: String,

    /// Use ws:// instead of wss://
    #[arg(long)]
    insecure: bool,

    /// Idle seconds per earned hint
    #[arg(long, default_value_t = DEFAULT_MILESTONE_SECS, value_parser = clap::value_parser!(i64).range(1..))]
    milestone: i64,

    /// Milliseconds to wait for server messages each tick
    #[arg(long, default_value_t = 100)]
    timeout_ms: u64,

    /// File holding the game's idle timer in seconds
    #[arg(long)]
    timer_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_logging(args.log.as_deref());

    if let Err(e) = run(args).await {
        match e {
            Error::ConnectionRefused { diagnostics } => {
                for line in diagnostics {
                    eprintln!("{}", line);
                }
            }
            other => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    // The idle timer must be readable before we touch the server
    let timer = telemetry::open_timer(args.timer_file.as_deref())?;
    let mut idle = MilestoneTracker::new(timer, args.milestone);

    let config = ClientBuilder::new(args.host, args.port, args.slot)
        .password(args.password)
        .secure(!args.insecure)
        .timeout(Duration::from_millis(args.timeout_ms))
        .build();

    eprintln!("Connecting to {}...", config.url());
    let mut client = Client::connect(config).await?;

    run_session(&mut client, &mut idle, print_event).await
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Message(line) => println!("{}", line),
        SessionEvent::Connected { team, slot } => {
            println!("Connected! Team {}, slot {}", team, slot)
        }
        SessionEvent::HintRequested { location } => {
            println!("Requesting a hint for location {}", location)
        }
        SessionEvent::HintEarned => println!("You earned a hint for doing nothing! Giving now.."),
        SessionEvent::Disconnected { reason } => eprintln!("Disconnected: {}", reason),
    }
}
