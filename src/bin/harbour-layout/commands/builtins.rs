//! `harbour-layout builtins` command

use anyhow::Result;

use harbour_layout::schema::builtin::{self, BUILTINS};

pub fn execute() -> Result<()> {
    for entry in BUILTINS {
        let schema = builtin::load(entry.name)?;
        let groups: Vec<&str> = schema.group_names().collect();
        println!("builtin:{:<10} {}", entry.name, entry.description);
        println!("  groups: {}", groups.join(", "));
    }

    Ok(())
}
