use anyhow::{bail, Context, Result};
use clap::Args;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use subnettree::{file_reader, Entry, SubnetIndex};
use tracing::{debug, info};

/// Entries-file options shared by every command that builds an index
#[derive(Args, Debug, Clone)]
pub struct EntriesArgs {
    /// Entries files mapping networks to values (can specify multiple, .gz ok)
    #[arg(short = 'e', long = "entries", value_name = "FILE", required = true)]
    pub entries: Vec<PathBuf>,

    /// Entries file format
    /// - text: "<entry> <value>" per line, entry is a.b.c.d[/n] or a.b.c.d-e.f.g.h (default)
    /// - csv: header row with 'entry' and 'value' columns
    #[arg(short = 'f', long = "entries-format", default_value = "text", value_name = "FORMAT")]
    pub format: String,

    /// Value reported for addresses no entry covers
    #[arg(short = 'd', long = "default", value_name = "VALUE")]
    pub default: Option<String>,
}

/// Summary of an index load
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadSummary {
    pub entries: usize,
    pub blocks: usize,
}

/// Build an index from the entries files named in `args`
pub fn load_index(args: &EntriesArgs) -> Result<(SubnetIndex<String>, LoadSummary)> {
    let index = match &args.default {
        Some(default) => SubnetIndex::with_default(default.clone()),
        None => SubnetIndex::new(),
    };
    let mut summary = LoadSummary::default();

    for path in &args.entries {
        let before = summary;
        match args.format.as_str() {
            "text" => load_text(path, &index, &mut summary)?,
            "csv" => load_csv(path, &index, &mut summary)?,
            other => bail!("Unknown entries format '{}', expected text or csv", other),
        }
        info!(
            file = %path.display(),
            entries = summary.entries - before.entries,
            blocks = summary.blocks - before.blocks,
            "loaded entries"
        );
    }

    let stats = index.stats();
    debug!(nodes = stats.nodes, prefixes = stats.prefixes, "index ready");
    Ok((index, summary))
}

/// Split a text line into entry and value at the first whitespace or comma
fn split_text_line(line: &str) -> (&str, Option<&str>) {
    match line.split_once(|c: char| c.is_whitespace() || c == ',') {
        Some((entry, value)) => {
            let value = value.trim();
            (entry, (!value.is_empty()).then_some(value))
        }
        None => (line, None),
    }
}

fn insert_line(
    index: &SubnetIndex<String>,
    entry: &str,
    value: Option<&str>,
    summary: &mut LoadSummary,
) -> Result<()> {
    let entry: Entry = entry.parse()?;
    summary.blocks += index.insert_entry(&entry, value.map(str::to_string))?;
    summary.entries += 1;
    Ok(())
}

fn load_text(path: &Path, index: &SubnetIndex<String>, summary: &mut LoadSummary) -> Result<()> {
    let reader = file_reader::open(path)
        .with_context(|| format!("Failed to open entries file: {}", path.display()))?;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (entry, value) = split_text_line(line);
        insert_line(index, entry, value, summary)
            .with_context(|| format!("{}:{}: bad entry '{}'", path.display(), lineno + 1, line))?;
    }
    Ok(())
}

fn load_csv(path: &Path, index: &SubnetIndex<String>, summary: &mut LoadSummary) -> Result<()> {
    let reader = file_reader::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV headers")?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let Some(entry_col) = column(&["entry", "network", "cidr"]) else {
        bail!("{}: CSV needs an 'entry' column", path.display());
    };
    let Some(value_col) = column(&["value"]) else {
        bail!("{}: CSV needs a 'value' column", path.display());
    };

    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{}: bad CSV row {}", path.display(), row + 2))?;
        let entry = record.get(entry_col).unwrap_or("").trim();
        let value = record
            .get(value_col)
            .map(str::trim)
            .filter(|v| !v.is_empty());

        insert_line(index, entry, value, summary)
            .with_context(|| format!("{}: bad entry on row {}", path.display(), row + 2))?;
    }
    Ok(())
}

/// Line reader over a buffered source using memchr to find newlines.
/// Yields trimmed, non-empty lines into a caller-owned buffer.
pub struct LineScanner<R: io::BufRead> {
    reader: R,
}

impl<R: io::BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the next non-empty line. Returns Ok(false) at EOF.
    pub fn read_line(&mut self, line_buf: &mut Vec<u8>) -> io::Result<bool> {
        loop {
            line_buf.clear();
            let mut saw_data = false;

            loop {
                let buffer = self.reader.fill_buf()?;
                if buffer.is_empty() {
                    break;
                }
                saw_data = true;
                match memchr::memchr(b'\n', buffer) {
                    Some(pos) => {
                        line_buf.extend_from_slice(&buffer[..pos]);
                        self.reader.consume(pos + 1);
                        break;
                    }
                    None => {
                        let len = buffer.len();
                        line_buf.extend_from_slice(buffer);
                        self.reader.consume(len);
                    }
                }
            }

            if !saw_data {
                return Ok(false);
            }

            let Some(start) = line_buf.iter().position(|b| !b.is_ascii_whitespace()) else {
                continue;
            };
            let end = line_buf
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map_or(start, |last| last + 1);
            line_buf.truncate(end);
            line_buf.drain(..start);
            return Ok(true);
        }
    }
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
