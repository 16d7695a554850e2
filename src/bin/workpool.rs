use std::io::{self, Write};
use std::process::exit;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info};
use serde::Serialize;

use workpool::{Result, WorkPool, WorkPoolError};

const DEFAULT_TASKS: usize = 16;
const DEFAULT_TASK_MS: u64 = 10;

#[derive(Parser)]
#[command(name = "workpool", version, about = "Fan synthetic tasks out over a work pool")]
struct Cli {
    /// Number of workers; values <= 0 run with a single worker [default: number of CPUs]
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    workers: Option<i64>,

    /// Number of tasks to enqueue
    #[arg(long, default_value_t = DEFAULT_TASKS, value_name = "N")]
    tasks: usize,

    /// How long each task sleeps, in milliseconds
    #[arg(long, default_value_t = DEFAULT_TASK_MS, value_name = "MS")]
    task_ms: u64,

    /// Make every K-th task panic; 0 disables fault injection
    #[arg(long, default_value_t = 0, value_name = "K")]
    fail_every: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// What a single invocation did.
#[derive(Debug, Serialize)]
struct Report {
    workers: usize,
    tasks: usize,
    completed: usize,
    faulted: usize,
    elapsed_ms: u64,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stderr)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let workers = resolve_workers(cli.workers);
    if cli.fail_every == 0 {
        info!("Fault injection disabled");
    } else {
        info!("Every {} task(s) will panic", cli.fail_every);
        // Injected panics are expected; keep them out of stderr.
        std::panic::set_hook(Box::new(|_| {}));
    }

    info!("workpool {}", env!("CARGO_PKG_VERSION"));
    info!("Running {} tasks over {} workers", cli.tasks, workers);

    let pool = WorkPool::new(workers);
    let delay = Duration::from_millis(cli.task_ms);
    let fail_every = cli.fail_every;
    pool.enqueue_all((1..=cli.tasks).map(|n| {
        move || {
            thread::sleep(delay);
            if fail_every != 0 && n % fail_every == 0 {
                panic!("injected fault in task {n}");
            }
        }
    }));

    let start = Instant::now();
    let summary = pool.run();
    let report = Report {
        workers: pool.workers(),
        tasks: cli.tasks,
        completed: summary.completed,
        faulted: summary.faulted,
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    if summary.executed() != report.tasks {
        return Err(WorkPoolError::StringError(format!(
            "expected {} tasks to run, but {} did",
            report.tasks,
            summary.executed()
        )));
    }

    print_report(&report, cli.json)
}

/// Normalizes the requested worker count; anything <= 0 becomes one worker.
fn resolve_workers(requested: Option<i64>) -> usize {
    match requested {
        Some(n) => usize::try_from(n).unwrap_or(0).max(1),
        None => num_cpus::get(),
    }
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "workers:   {}", report.workers)?;
        writeln!(out, "tasks:     {}", report.tasks)?;
        writeln!(out, "completed: {}", report.completed)?;
        writeln!(out, "faulted:   {}", report.faulted)?;
        writeln!(out, "elapsed:   {}ms", report.elapsed_ms)?;
    }
    out.flush()?;
    Ok(())
}
