use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use xxhash_rust::xxh3::xxh3_64;

use sio_codecs::payloads::RunHeader;
use sio_codecs::{compressor_by_name, Compressed, Compressor, PassThroughCompressor};
use sio_core::{Envelopes, Record, Structured};

/// Record name used for event files.
const EVENT_RECORD: &str = "evt";
/// Block name of the run header inside an event record.
const HEADER_BLOCK: &str = "header";

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "sio",
    about = "Write, read, and inspect SIO block/record files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an event record holding a single run header block
    WriteEvent {
        /// Destination file
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        run: i64,
        #[arg(long, default_value_t = 1)]
        event: i64,
        #[arg(long, default_value_t = 0)]
        trigger: i64,
        /// Payload compressor: none | zstd | lz4 | flate. Omit to store the
        /// header uncompressed.
        #[arg(short, long)]
        codec: Option<String>,
        /// Zstd compression level (1–22, only used with --codec zstd)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
    },
    /// Read an event record and print its run header
    ReadEvent {
        /// Source file
        input: PathBuf,
        /// Set if the file was written with --codec
        #[arg(short, long)]
        compressed: bool,
    },
    /// Print the block envelopes of a record file
    Inspect {
        /// Record file to inspect
        file: PathBuf,
        /// Print per-block details
        #[arg(long)]
        blocks: bool,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_write_event(
    output: PathBuf,
    header: RunHeader,
    codec: Option<String>,
    zstd_level: i32,
) -> anyhow::Result<()> {
    let buf = match codec {
        None => {
            let mut header = header;
            let mut rec = Record::new(EVENT_RECORD);
            rec.connect_structural(HEADER_BLOCK, &mut header)?;
            rec.to_bytes()?
        }
        Some(name) => {
            let compressor = compressor_by_name(&name, zstd_level)?;
            eprintln!("  codec       : {}", compressor.name());
            let mut payload = Compressed::new(Structured(header), compressor);
            let mut rec = Record::new(EVENT_RECORD);
            rec.connect_raw(HEADER_BLOCK, &mut payload)?;
            rec.to_bytes()?
        }
    };

    std::fs::write(&output, &buf).with_context(|| format!("writing {:?}", output))?;
    eprintln!("  record      : {}", EVENT_RECORD);
    eprintln!(
        "  header      : run={} event={} trigger={}",
        header.run_nbr, header.evt_nbr, header.trigger
    );
    eprintln!("  size        : {}", human_bytes(buf.len() as u64));
    Ok(())
}

fn run_read_event(input: PathBuf, compressed: bool) -> anyhow::Result<()> {
    let data = std::fs::read(&input).with_context(|| format!("reading {:?}", input))?;

    let header = if compressed {
        // the stored compressor id decides the transform on read
        let none: Arc<dyn Compressor> = Arc::new(PassThroughCompressor);
        let mut payload = Compressed::new(Structured(RunHeader::default()), none);
        let mut rec = Record::new(EVENT_RECORD);
        rec.connect_raw(HEADER_BLOCK, &mut payload)?;
        rec.read_from(&data)?;
        drop(rec);
        payload.into_inner().0
    } else {
        let mut header = RunHeader::default();
        let mut rec = Record::new(EVENT_RECORD);
        rec.connect_structural(HEADER_BLOCK, &mut header)?;
        rec.read_from(&data)?;
        drop(rec);
        header
    };

    println!("run     : {}", header.run_nbr);
    println!("event   : {}", header.evt_nbr);
    println!("trigger : {}", header.trigger);
    Ok(())
}

fn run_inspect(file: PathBuf, show_blocks: bool) -> anyhow::Result<()> {
    let data = std::fs::read(&file).with_context(|| format!("reading {:?}", file))?;

    let mut count = 0u64;
    let mut payload_total = 0u64;
    let mut rows = Vec::new();
    let mut failure = None;
    for env in Envelopes::new(&data) {
        match env {
            Ok(env) => {
                count += 1;
                payload_total += env.payload.len() as u64;
                rows.push(env);
            }
            Err(e) => failure = Some(e),
        }
    }

    println!("=== SIO record file: {:?} ===", file);
    println!();
    println!("  file size      : {}", human_bytes(data.len() as u64));
    println!("  blocks         : {}", count);
    println!("  payload bytes  : {}", human_bytes(payload_total));

    if show_blocks {
        println!();
        println!(
            "  {:<16}  {:>7}  {:>10}  {:>10}  {:>16}",
            "name", "version", "envelope", "payload", "xxh3"
        );
        println!("  {}", "-".repeat(67));
        for env in &rows {
            println!(
                "  {:<16}  {:>7}  {:>10}  {:>10}  {:016x}",
                env.name_lossy(),
                env.data.version,
                env.header.len,
                env.payload.len(),
                xxh3_64(env.payload)
            );
        }
    }

    if let Some(e) = failure {
        log::warn!("stopped after {} blocks: {}", count, e);
        return Err(e).with_context(|| format!("walking envelopes of {:?}", file));
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::WriteEvent {
            output,
            run,
            event,
            trigger,
            codec,
            zstd_level,
        } => run_write_event(
            output,
            RunHeader::new(run, event, trigger),
            codec,
            zstd_level,
        ),
        Commands::ReadEvent { input, compressed } => run_read_event(input, compressed),
        Commands::Inspect { file, blocks } => run_inspect(file, blocks),
    }
}
