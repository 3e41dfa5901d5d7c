use anyhow::{bail, Context, Result};
use crossbeam_channel::bounded;
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use subnettree::{file_reader, SubnetIndex};
use tracing::debug;

use crate::cli_utils::{format_number, load_index, EntriesArgs, LineScanner};

/// Addresses per work batch in parallel mode
const BATCH_LINES: usize = 4096;

/// Outcome counters for a match run
#[derive(Debug, Default, Clone, Copy)]
struct MatchStats {
    lines: usize,
    matched: usize,
    defaulted: usize,
    unmatched: usize,
    invalid: usize,
}

impl MatchStats {
    fn merge(&mut self, other: &MatchStats) {
        self.lines += other.lines;
        self.matched += other.matched;
        self.defaulted += other.defaulted;
        self.unmatched += other.unmatched;
        self.invalid += other.invalid;
    }
}

/// Look up one address line, appending an NDJSON record to `out` if given
fn match_line(
    index: &SubnetIndex<String>,
    line: &str,
    out: Option<&mut String>,
    stats: &mut MatchStats,
) {
    stats.lines += 1;

    let record = match index.lookup_match(line) {
        Ok(Some(m)) => {
            stats.matched += 1;
            json!({
                "address": line,
                "value": m.value,
                "cidr": m.block,
            })
        }
        Ok(None) => match index.default_value() {
            Some(value) => {
                stats.defaulted += 1;
                json!({ "address": line, "value": value, "default": true })
            }
            None => {
                stats.unmatched += 1;
                json!({ "address": line, "value": null })
            }
        },
        Err(e) => {
            stats.invalid += 1;
            json!({ "address": line, "error": e.to_string() })
        }
    };

    if let Some(out) = out {
        out.push_str(&record.to_string());
        out.push('\n');
    }
}

fn open_input(path: &Path) -> Result<LineScanner<Box<dyn io::BufRead + Send>>> {
    let reader = file_reader::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    Ok(LineScanner::new(reader))
}

fn process_sequential(
    index: &SubnetIndex<String>,
    inputs: &[PathBuf],
    emit: bool,
) -> Result<MatchStats> {
    let mut stats = MatchStats::default();
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    let mut out = String::new();
    let mut line_buf = Vec::new();

    for input in inputs {
        let mut scanner = open_input(input)?;
        while scanner.read_line(&mut line_buf)? {
            let line = String::from_utf8_lossy(&line_buf);
            out.clear();
            match_line(index, &line, emit.then_some(&mut out), &mut stats);
            writer.write_all(out.as_bytes())?;
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Reader on the calling thread, `workers` lookup threads sharing one index,
/// and a writer thread serializing output. Output order follows batch
/// completion, not input order.
fn process_parallel(
    index: &SubnetIndex<String>,
    inputs: &[PathBuf],
    workers: usize,
    emit: bool,
) -> Result<MatchStats> {
    let (work_tx, work_rx) = bounded::<Vec<String>>(workers * 2);
    let (out_tx, out_rx) = bounded::<String>(workers * 2);

    thread::scope(|scope| -> Result<MatchStats> {
        let writer = scope.spawn(move || -> io::Result<()> {
            let stdout = io::stdout();
            let mut writer = io::BufWriter::new(stdout.lock());
            for chunk in out_rx {
                writer.write_all(chunk.as_bytes())?;
            }
            writer.flush()
        });

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let work_rx = work_rx.clone();
                let out_tx = out_tx.clone();
                scope.spawn(move || {
                    let mut stats = MatchStats::default();
                    for batch in work_rx {
                        let mut out = String::new();
                        for line in &batch {
                            match_line(index, line, emit.then_some(&mut out), &mut stats);
                        }
                        if emit && out_tx.send(out).is_err() {
                            break;
                        }
                    }
                    debug!(worker_id, lines = stats.lines, "worker finished");
                    stats
                })
            })
            .collect();
        drop(work_rx);
        drop(out_tx);

        let mut line_buf = Vec::new();
        let mut batch = Vec::with_capacity(BATCH_LINES);
        for input in inputs {
            let mut scanner = open_input(input)?;
            while scanner.read_line(&mut line_buf)? {
                batch.push(String::from_utf8_lossy(&line_buf).into_owned());
                if batch.len() == BATCH_LINES {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(BATCH_LINES));
                    if work_tx.send(full).is_err() {
                        bail!("All match workers exited early");
                    }
                }
            }
        }
        if !batch.is_empty() && work_tx.send(batch).is_err() {
            bail!("All match workers exited early");
        }
        drop(work_tx);

        let mut total = MatchStats::default();
        for handle in handles {
            match handle.join() {
                Ok(stats) => total.merge(&stats),
                Err(_) => bail!("Match worker panicked"),
            }
        }
        match writer.join() {
            Ok(result) => result.context("Failed to write results")?,
            Err(_) => bail!("Output writer panicked"),
        }
        Ok(total)
    })
}

pub fn cmd_match(
    entries: EntriesArgs,
    inputs: Vec<PathBuf>,
    threads: usize,
    format: String,
    show_stats: bool,
) -> Result<()> {
    let emit = match format.as_str() {
        "json" => true,
        "summary" => false,
        other => bail!("Unknown output format '{}', expected json or summary", other),
    };

    let load_start = Instant::now();
    let (index, summary) = load_index(&entries)?;
    let load_time = load_start.elapsed();

    if show_stats {
        eprintln!(
            "[INFO] Loaded {} entries ({} blocks) in {:.2?}",
            format_number(summary.entries),
            format_number(summary.blocks),
            load_time
        );
        if threads > 1 {
            eprintln!("[INFO] Mode: Parallel ({} worker threads)", threads);
        } else {
            eprintln!("[INFO] Mode: Sequential (single-threaded)");
        }
    }

    let match_start = Instant::now();
    let stats = if threads > 1 {
        process_parallel(&index, &inputs, threads, emit)?
    } else {
        process_sequential(&index, &inputs, emit)?
    };
    let elapsed = match_start.elapsed();

    if !emit {
        println!("Addresses:  {}", format_number(stats.lines));
        println!("Matched:    {}", format_number(stats.matched));
        println!("Defaulted:  {}", format_number(stats.defaulted));
        println!("Unmatched:  {}", format_number(stats.unmatched));
        println!("Invalid:    {}", format_number(stats.invalid));
    }

    if show_stats {
        let rate = stats.lines as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        eprintln!(
            "[INFO] Processed {} addresses in {:.2?} ({:.0} lookups/sec)",
            format_number(stats.lines),
            elapsed,
            rate
        );
    }

    Ok(())
}
