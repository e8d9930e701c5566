use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use seqexport::parse::{
    parse_counter_line, parse_fork_line, read_export, read_export_all, DEFAULT_MAX_LINE,
};
use seqexport::reader::DEFAULT_CHUNK_SIZE;
use seqexport::simulate::Producers;
use seqexport::spawn::capture_fork;
use seqexport::store::counters::DEFAULT_COUNTER_CAPACITY;
use seqexport::{Config, ExportReader, ForkSlot, LineFormat, RecordStore};

#[derive(Debug, Parser)]
#[command(name = "seqexport")]
#[command(about = "Stream syscall counters and fork events in fixed-size chunks")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export a table of syscall counters, one value per line
    Counters {
        /// Number of counters exported (defaults to the capacity)
        #[arg(long)]
        count: Option<usize>,
        /// Number of counters in the table
        #[arg(long, default_value_t = DEFAULT_COUNTER_CAPACITY)]
        capacity: usize,
        /// Bytes per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// JSON file with initial counter values
        #[arg(long)]
        values: Option<PathBuf>,
        /// Producer threads incrementing counters while exporting
        #[arg(long, default_value = "0")]
        producers: usize,
        /// Milliseconds producers run before the export starts (Ctrl-C cuts it short)
        #[arg(long, default_value = "0")]
        warmup_ms: u64,
        /// Emit one JSON object per record
        #[arg(long)]
        json: bool,
    },
    /// Spawn a command, capture its fork event and export it
    Fork {
        /// Export a slot that never saw an event
        #[arg(long)]
        empty: bool,
        /// Bytes per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Emit one JSON object per record
        #[arg(long)]
        json: bool,
        /// Command to run (everything after --), defaults to `true`
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Read an export file the way a simple consumer does
    Read {
        /// File to read, e.g. /proc/fork_info
        path: PathBuf,
        /// Bytes per read
        #[arg(long, default_value_t = DEFAULT_MAX_LINE)]
        max_line: usize,
        /// Keep reading until end of file instead of a single read
        #[arg(long)]
        all: bool,
        /// Parse each line and print it as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn line_format(json: bool) -> LineFormat {
    if json {
        LineFormat::Json
    } else {
        LineFormat::Text
    }
}

/// Drive `reader` to the end, writing each chunk to stdout as one write.
fn stream<S: RecordStore>(reader: &mut ExportReader<S>, chunk_size: usize) -> Result<()> {
    let mut out = io::stdout().lock();
    let mut chunks = 0u64;
    while let Some(chunk) = reader.read_chunk(chunk_size)? {
        out.write_all(chunk.as_bytes())
            .context("Failed to write to stdout")?;
        chunks += 1;
    }
    out.flush().context("Failed to flush stdout")?;
    info!(chunks, records = reader.records_emitted(), "export finished");
    Ok(())
}

fn export_counters(config: &Config) -> Result<()> {
    let table = Arc::new(config.counter_table()?);
    info!(
        capacity = table.capacity(),
        count = table.count(),
        producers = config.producers,
        "exporting counters"
    );

    let producers = (config.producers > 0)
        .then(|| Producers::spawn(Arc::clone(&table), config.producers));

    if let Some(producers) = producers.as_ref().filter(|_| config.warmup_ms > 0) {
        // Ctrl-C ends the warmup and freezes the table for the export
        let stop = producers.stop_flag();
        let (stop_tx, stop_rx) = channel();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
            let _ = stop_tx.send(());
        })
        .context("Failed to set Ctrl-C handler")?;
        if stop_rx
            .recv_timeout(Duration::from_millis(config.warmup_ms))
            .is_ok()
        {
            info!("interrupted, producers stopped before export");
        }
    }

    let mut reader = ExportReader::new(Arc::clone(&table)).with_format(config.format);
    let result = stream(&mut reader, config.chunk_size);

    if let Some(producers) = producers {
        let increments = producers.join()?;
        info!(increments, "producers stopped");
    }
    result
}

fn export_fork(
    empty: bool,
    chunk_size: usize,
    format: LineFormat,
    command: Vec<String>,
) -> Result<()> {
    let slot = ForkSlot::new();
    if !empty {
        let argv = if command.is_empty() {
            vec!["true".to_string()]
        } else {
            command
        };
        let status = capture_fork(&slot, &argv)?;
        if !status.success() {
            warn!(?status, "spawned command failed");
        }
    }

    let mut reader = ExportReader::new(&slot).with_format(format);
    stream(&mut reader, chunk_size)
}

fn read_file(path: PathBuf, max_line: usize, all: bool, json: bool) -> Result<()> {
    let bytes = if all {
        read_export_all(&path, max_line)?
    } else {
        read_export(&path, max_line)?
    };

    let mut out = io::stdout().lock();
    if !json {
        out.write_all(&bytes).context("Failed to write to stdout")?;
        return Ok(());
    }

    let text = String::from_utf8_lossy(&bytes);
    for line in text.lines() {
        let value = if let Ok(fork) = parse_fork_line(line) {
            serde_json::to_value(fork)?
        } else if let Ok(value) = parse_counter_line(line) {
            serde_json::json!({ "value": value })
        } else {
            warn!(line, "skipping unrecognized line");
            continue;
        };
        writeln!(out, "{}", value).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Counters {
            count,
            capacity,
            chunk_size,
            values,
            producers,
            warmup_ms,
            json,
        } => {
            let config = Config {
                chunk_size,
                format: line_format(json),
                counter_capacity: capacity,
                counter_count: count,
                counter_values: values,
                producers,
                warmup_ms,
            };
            export_counters(&config)
        }
        Commands::Fork {
            empty,
            chunk_size,
            json,
            command,
        } => export_fork(empty, chunk_size, line_format(json), command),
        Commands::Read {
            path,
            max_line,
            all,
            json,
        } => read_file(path, max_line, all, json),
    }
}
