//! `harbour-layout show` command

use anyhow::Result;
use serde::Serialize;

use crate::cli::ShowArgs;
use crate::commands;
use harbour_layout::core::GroupKind;
use harbour_layout::layout::{FieldEntry, GroupLayout};

#[derive(Serialize)]
struct ShowOutput<'a> {
    schema: &'a str,
    target: String,
    groups: Vec<GroupOutput<'a>>,
}

#[derive(Serialize)]
struct GroupOutput<'a> {
    name: &'a str,
    kind: GroupKind,
    size: usize,
    align: usize,
    fingerprint: String,
    fields: Vec<FieldEntry>,
}

impl<'a> GroupOutput<'a> {
    fn new(group: &'a GroupLayout) -> Self {
        GroupOutput {
            name: group.name(),
            kind: group.kind(),
            size: group.size(),
            align: group.align(),
            fingerprint: group.fingerprint(),
            fields: group.offset_map(),
        }
    }
}

pub fn execute(args: ShowArgs) -> Result<()> {
    let loaded = commands::load(&args.schema)?;
    let groups = loaded.select(args.group.as_deref())?;

    if args.json {
        let output = ShowOutput {
            schema: loaded.schema.name(),
            target: loaded.abi.triple.to_string(),
            groups: groups.iter().map(|g| GroupOutput::new(g)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("# target: {}", loaded.abi.describe());
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_group(group);
    }

    Ok(())
}

fn print_group(group: &GroupLayout) {
    println!(
        "{} {} (size {}, align {})",
        group.kind().keyword(),
        group.name(),
        group.size(),
        group.align()
    );

    let entries = group.offset_map();
    let width = entries.iter().map(|e| e.path.len()).max().unwrap_or(0);
    for entry in entries {
        let depth = entry.path.matches('.').count();
        println!(
            "  {:>6}  {:>4}  {:<width$}  {}",
            entry.offset,
            entry.size,
            format!("{}{}", "  ".repeat(depth), entry.path),
            entry.ty,
            width = width + depth * 2
        );
    }
}
