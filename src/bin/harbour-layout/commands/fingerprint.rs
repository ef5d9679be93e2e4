//! `harbour-layout fingerprint` command

use anyhow::Result;

use crate::cli::FingerprintArgs;
use crate::commands;

pub fn execute(args: FingerprintArgs) -> Result<()> {
    let loaded = commands::load(&args.schema)?;

    for group in loaded.select(args.group.as_deref())? {
        println!("{}  {}", group.fingerprint(), group.name());
    }

    Ok(())
}
