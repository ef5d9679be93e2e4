//! Command implementations

pub mod builtins;
pub mod completions;
pub mod fingerprint;
pub mod poke;
pub mod show;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::SchemaArgs;
use harbour_layout::core::AbiRules;
use harbour_layout::layout::{GroupLayout, LayoutRegistry};
use harbour_layout::util::config;
use harbour_layout::util::diagnostic::{self, suggestions};
use harbour_layout::Schema;

static COLOR: AtomicBool = AtomicBool::new(false);

/// Whether warnings printed by commands use ANSI color.
pub fn set_color(color: bool) {
    COLOR.store(color, Ordering::Relaxed);
}

/// A schema laid out for its resolved target.
pub struct Loaded {
    pub schema: Schema,
    pub abi: AbiRules,
    pub registry: LayoutRegistry,
}

impl Loaded {
    /// The named group, or every group when `name` is `None`.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<Arc<GroupLayout>>> {
        match name {
            Some(name) => Ok(vec![self.group(name)?]),
            None => Ok(self.registry.groups().cloned().collect()),
        }
    }

    pub fn group(&self, name: &str) -> Result<Arc<GroupLayout>> {
        self.registry.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "no group `{}` in schema `{}`\n{}",
                name,
                self.schema.name(),
                suggestions::GROUP_NOT_FOUND
            )
        })
    }
}

/// Find, parse and lay out the schema named on the command line.
pub fn load(args: &SchemaArgs) -> Result<Loaded> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let (config, warnings) = config::load_for(&cwd);
    for warning in &warnings {
        diagnostic::emit(warning, COLOR.load(Ordering::Relaxed));
    }

    let schema = Schema::locate(&args.schema, &config)?;
    let abi = schema.resolve_abi(args.target.as_deref(), &config)?;
    tracing::debug!("laying out `{}` for {}", schema.name(), abi.describe());

    let registry = schema
        .build(&abi)
        .map_err(harbour_layout::Error::from)
        .with_context(|| format!("failed to lay out `{}`", schema.name()))?;

    Ok(Loaded {
        schema,
        abi,
        registry,
    })
}
