use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use log::error;
use serde::Serialize;

use events_cc::{BlockEvent, EventSender, Peer, PeerConfig, Response, Result};

#[derive(Debug, Parser)]
#[command(name = "events-cc")]
#[command(about = "Run the event sender chaincode on an in-process peer")]
#[command(version)]
struct Cli {
    /// TOML file with a `[peer]` table.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the channel id from the config.
    #[arg(long, global = true)]
    channel_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Instantiate the chaincode and execute a script of invocations.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Script with one invocation per line; reads stdin if omitted.
    ///
    /// Each line holds whitespace-separated arguments, e.g.
    /// `invoke invoke -a`. Lines starting with `query` are evaluated without
    /// being committed. Empty lines and `#` comments are skipped.
    script: Option<PathBuf>,

    /// Regular expression selecting which event names are printed.
    #[arg(long, default_value = ".*")]
    events: String,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a [String],
    response: Response,
}

fn main() {
    pretty_env_logger::init();

    if let Err(err) = run() {
        error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PeerConfig::load(path)?,
        None => PeerConfig::default(),
    };
    if let Some(channel_id) = cli.channel_id {
        config = config.channel_id(channel_id);
    }

    match cli.command {
        Commands::Run(args) => {
            let input: Box<dyn BufRead> = match &args.script {
                Some(path) => Box::new(BufReader::new(File::open(path)?)),
                None => Box::new(BufReader::new(io::stdin())),
            };
            run_script(config, &args.events, input, io::stdout().lock())
        }
    }
}

fn run_script<R: BufRead, W: Write>(
    config: PeerConfig,
    events: &str,
    input: R,
    mut out: W,
) -> Result<()> {
    let chaincode_id = config.chaincode_id.clone();
    let mut peer: Peer<EventSender> = Peer::new(config, EventSender);

    // listeners run during commit, so events are collected and written out
    // ahead of the result of the tx which committed them
    let pending: Rc<RefCell<Vec<BlockEvent>>> = Rc::new(RefCell::new(vec![]));
    let sink = pending.clone();
    peer.events()
        .register_chaincode_event(&chaincode_id, events, move |event| {
            sink.borrow_mut().push(event.clone())
        })?;

    let res = peer.instantiate(["init"])?;
    writeln!(out, "{}", serde_json::to_string(&res)?)?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut words: Vec<String> = line.split_whitespace().map(String::from).collect();
        if words[0] == "query" {
            words.remove(0);
            let response = peer.query(words.iter().cloned())?;
            let output = QueryOutput {
                query: &words,
                response,
            };
            writeln!(out, "{}", serde_json::to_string(&output)?)?;
        } else {
            let res = peer.invoke(words)?;
            for event in pending.borrow_mut().drain(..) {
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
            }
            writeln!(out, "{}", serde_json::to_string(&res)?)?;
        }
    }

    Ok(())
}
