use anyhow::{Context, Result};
use serde_json::json;
use subnettree::codec::parse_ipv4;
use subnettree::decompose;

pub fn cmd_decompose(start: String, end: String, json_output: bool) -> Result<()> {
    let first = parse_ipv4(&start).with_context(|| format!("Invalid range start: {}", start))?;
    let last = parse_ipv4(&end).with_context(|| format!("Invalid range end: {}", end))?;
    if last < first {
        anyhow::bail!("Range end {} precedes start {}", end, start);
    }

    let blocks: Vec<_> = decompose(first, last).collect();

    if json_output {
        let out: Vec<_> = blocks
            .iter()
            .map(|b| {
                json!({
                    "cidr": b,
                    "prefix_len": b.prefix_len,
                    "size": b.size(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for block in &blocks {
            println!("{}", block);
        }
    }

    Ok(())
}
