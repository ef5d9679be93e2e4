//! `harbour-layout poke` command
//!
//! Allocates a group inside a scope, applies `--set` writes to one element,
//! then prints every field value and a hex dump of that element.

use anyhow::Result;

use crate::cli::PokeArgs;
use crate::commands;
use harbour_layout::memory::with_scope;
use harbour_layout::util::hash::sha256_bytes;
use harbour_layout::Value;

pub fn execute(args: PokeArgs) -> Result<()> {
    let loaded = commands::load(&args.schema)?;
    let group = loaded.group(&args.group)?;

    let assignments = args
        .sets
        .iter()
        .map(|set| -> Result<(String, Value)> {
            let (path, literal) = set
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("expected PATH=VALUE, got `{}`", set))?;
            let path = path.trim();
            let value = group.parse_value(path, literal)?;
            Ok((path.to_string(), value))
        })
        .collect::<Result<Vec<_>>>()?;

    with_scope(|scope| -> Result<()> {
        let region = scope.allocate_array(&group, args.count)?;
        for (path, value) in &assignments {
            group.write_value_indexed(&region, args.index, path, value)?;
            tracing::debug!("{}[{}].{} = {}", group.name(), args.index, path, value);
        }

        let values = group.values(&region, args.index)?;
        let bytes = region.element(args.index)?.to_vec()?;

        if args.json {
            let mut fields = serde_json::Map::new();
            for (path, value) in &values {
                fields.insert(path.clone(), serde_json::to_value(value)?);
            }
            let output = serde_json::json!({
                "group": group.name(),
                "index": args.index,
                "count": region.element_count(),
                "fields": fields,
                "bytes": hex::encode(&bytes),
                "sha256": sha256_bytes(&bytes),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!(
            "{}[{}] of {} in scope #{}",
            group.name(),
            args.index,
            region.element_count(),
            scope.id()
        );
        let width = values.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
        for (path, value) in &values {
            println!("  {:<width$} = {}", path, value, width = width);
        }
        println!();
        print!("{}", hex_dump(&bytes));
        Ok(())
    })
}

/// Classic 16-bytes-per-line dump with offsets.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        out.push_str(&format!("{:08x}  {}\n", line * 16, hex.join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump() {
        let bytes: Vec<u8> = (0..20).collect();
        let dump = hex_dump(&bytes);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  00 01 02"));
        assert_eq!(lines[1], "00000010  10 11 12 13");
    }
}
