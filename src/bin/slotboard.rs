use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use slotboard::core::{
    init, open_monitor, open_worker, BoardConfig, BoardView, InitMethod, PollPolicy, Timeout,
    Worker,
};

#[derive(Parser)]
#[command(name = "slotboard", version, about = "File-backed worker slot table tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct BoardArgs {
    /// Coordination file shared by every participant
    #[arg(long)]
    path: PathBuf,
    /// Number of worker slots; must match across participants
    #[arg(long)]
    workers: usize,
    /// Sleep between polls, in microseconds
    #[arg(long = "poll-us", default_value_t = 1)]
    poll_us: u64,
}

impl BoardArgs {
    fn config(&self, init: InitMethod, timeout: i64) -> BoardConfig {
        BoardConfig::new(&self.path, self.workers)
            .with_init(init)
            .with_timeout(timeout)
            .with_poll(PollPolicy::every(Duration::from_micros(self.poll_us)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or reset) the coordination file with zeroed slots
    Init {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Occupy a slot, publish name and value, then wait for the others
    Join {
        #[command(flatten)]
        board: BoardArgs,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        value: Option<String>,
        /// FFA, Zero or None
        #[arg(long, default_value = "ffa")]
        init: InitMethod,
        /// Poll budget for initialization and rendezvous; <= 0 waits forever
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        timeout: i64,
        /// Keep the slot Ready this long after the rendezvous
        #[arg(long = "hold-ms", default_value_t = 0)]
        hold_ms: u64,
    },
    /// Print the status table of every slot
    Status {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Print every published value, one per line
    Values {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Print the worker a key routes to
    Select {
        #[command(flatten)]
        board: BoardArgs,
        key: String,
    },
    /// Run the five-worker walkthrough against a scratch file
    Demo {
        #[arg(long, default_value = "status")]
        path: PathBuf,
    },
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut out = io::BufWriter::new(io::stdout());
    match cli.command {
        Commands::Init { board } => {
            init(&board.path, board.workers)
                .with_context(|| format!("initializing {}", board.path.display()))?;
        }
        Commands::Join {
            board,
            index,
            name,
            value,
            init,
            timeout,
            hold_ms,
        } => cmd_join(&board, index, name, value, init, timeout, hold_ms, &mut out)?,
        Commands::Status { board } => {
            let mut monitor = open_monitor(&board.config(InitMethod::None, -1))
                .with_context(|| format!("opening {}", board.path.display()))?;
            monitor.status(&mut out)?;
        }
        Commands::Values { board } => {
            let mut monitor = open_monitor(&board.config(InitMethod::None, -1))
                .with_context(|| format!("opening {}", board.path.display()))?;
            for value in monitor.values()? {
                writeln!(out, "{value}")?;
            }
        }
        Commands::Select { board, key } => {
            let mut monitor = open_monitor(&board.config(InitMethod::None, -1))
                .with_context(|| format!("opening {}", board.path.display()))?;
            writeln!(out, "{}", monitor.select(&key)?)?;
        }
        Commands::Demo { path } => cmd_demo(path, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_join(
    board: &BoardArgs,
    index: usize,
    name: Option<String>,
    value: Option<String>,
    init: InitMethod,
    timeout: i64,
    hold_ms: u64,
    out: &mut dyn Write,
) -> Result<()> {
    let config = board.config(init, timeout);
    let mut worker = open_worker(&config, index)
        .with_context(|| format!("joining {} as worker {index}", board.path.display()))?;
    if let Some(name) = name {
        worker.set_name(&name);
    }
    if let Some(value) = value {
        worker.set_data(value.as_bytes());
    }
    worker.write()?;

    let ready = worker.rendezvous(config.timeout)?;
    info!("worker {index} saw {ready} of {} ready", board.workers);
    writeln!(out, "{ready}")?;

    if hold_ms > 0 {
        out.flush()?;
        std::thread::sleep(Duration::from_millis(hold_ms));
    }
    worker.close()?;
    Ok(())
}

fn cmd_demo(path: PathBuf, out: &mut dyn Write) -> Result<()> {
    const WORKERS: usize = 5;
    info!("slotboard {}", env!("CARGO_PKG_VERSION"));

    init(&path, WORKERS).with_context(|| format!("initializing {}", path.display()))?;
    let mut worker = Worker::open(WORKERS - 1, &path, WORKERS)?;
    writeln!(out, "{}", worker.rendezvous(Timeout::Polls(1))?)?;

    worker.set_name("new_worker");
    worker.set_time(10);
    worker.write()?;

    for index in 0..WORKERS - 1 {
        Worker::open(index, &path, WORKERS)?.close()?;
    }

    writeln!(out, "{}", worker.rendezvous(Timeout::Unbounded)?)?;
    worker.status(out)?;
    worker.close()?;
    Ok(())
}
