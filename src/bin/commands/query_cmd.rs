use anyhow::{Context, Result};
use serde_json::json;

use crate::cli_utils::{load_index, EntriesArgs};

pub fn cmd_query(entries: EntriesArgs, address: String, quiet: bool) -> Result<()> {
    let (index, _) = load_index(&entries)?;

    let found = index
        .lookup_match(&address)
        .with_context(|| format!("Query failed for: {}", address))?;

    // A covering prefix wins; otherwise fall back to the default value
    let result = match found {
        Some(m) => Some(json!({
            "address": address,
            "value": m.value,
            "cidr": m.block,
            "prefix_len": m.block.prefix_len,
        })),
        None => index.default_value().map(|value| {
            json!({
                "address": address,
                "value": value,
                "default": true,
            })
        }),
    };
    let found = result.is_some();

    if quiet {
        // Quiet mode: no output, just exit code
        std::process::exit(if found { 0 } else { 1 });
    }

    // Always an array, empty when nothing applies
    let results: Vec<_> = result.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&json!(results))?);

    std::process::exit(if found { 0 } else { 1 });
}
