use anyhow::Result;
use serde_json::json;

use crate::cli_utils::{format_number, load_index, EntriesArgs};

pub fn cmd_inspect(entries: EntriesArgs, json_output: bool, list: bool) -> Result<()> {
    let (index, summary) = load_index(&entries)?;
    let stats = index.stats();

    if json_output {
        let mut out = json!({
            "entries": summary.entries,
            "blocks": summary.blocks,
            "stats": stats,
            "default": index.default_value(),
        });
        if list {
            let prefixes: Vec<_> = index
                .entries()
                .into_iter()
                .map(|(block, value)| json!({ "cidr": block, "value": value }))
                .collect();
            out["prefixes"] = json!(prefixes);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Subnet Index");
    println!("============");
    println!("  Entries loaded:  {}", format_number(summary.entries));
    println!("  CIDR blocks:     {}", format_number(summary.blocks));
    println!("  Unique prefixes: {}", format_number(stats.prefixes));
    println!("  Trie nodes:      {}", format_number(stats.nodes));
    match index.default_value() {
        Some(default) => println!("  Default value:   {}", default),
        None => println!("  Default value:   (none)"),
    }

    if list {
        println!();
        for (block, value) in index.entries() {
            println!("{:<18} {}", block.to_string(), value);
        }
    }

    Ok(())
}
