//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// harbour-layout - inspect and exercise C ABI struct layouts
#[derive(Parser)]
#[command(name = "harbour-layout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show sizes, alignment and field offsets of a schema's groups
    Show(ShowArgs),

    /// Print layout fingerprints
    Fingerprint(FingerprintArgs),

    /// Allocate a group, write fields and dump the result
    Poke(PokeArgs),

    /// List the builtin schemas
    Builtins,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Schema selection shared by every layout command.
#[derive(Args)]
pub struct SchemaArgs {
    /// Schema file, a name under the configured schema paths, or `builtin:NAME`
    pub schema: String,

    /// Target triple to lay out for (overrides the schema and config)
    #[arg(long, env = "HARBOUR_LAYOUT_TARGET")]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Only show this group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Only fingerprint this group
    #[arg(short, long)]
    pub group: Option<String>,
}

#[derive(Args)]
pub struct PokeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Group to allocate
    #[arg(short, long)]
    pub group: String,

    /// Number of elements to allocate
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub count: i64,

    /// Element to write and dump
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Field assignment, e.g. `var1.u16[1]=0x10` (repeatable)
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub sets: Vec<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
