use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use liquid_sdk::{ObjectId, Value};

#[derive(Parser)]
#[command(
    name = "liquid",
    about = "Liquid: an embedded, encrypted object store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// TOML store configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Object directory; defaults to `.liquid` when no config names one.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Hex key file; defaults to `<data-dir>/.store-key`.
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,

    /// Author recorded on mutations.
    #[arg(long, global = true)]
    pub author: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an object
    Create(CreateArgs),
    /// Show an object
    Get(IdArgs),
    /// Update an object's properties and tags
    Update(UpdateArgs),
    /// Soft-delete an object
    Delete(IdArgs),
    /// List objects matching a filter
    Query(FilterArgs),
    /// Link two objects with a typed relationship
    Link(LinkArgs),
    /// List an object's neighbours
    Related(RelatedArgs),
    /// Show store counts
    Stats,
    /// Write a sync bundle
    Export(ExportArgs),
    /// Merge a sync bundle from another replica
    Import(ImportArgs),
    /// Generate a key file
    Keygen(KeygenArgs),
}

/// `key=value` pairs. Values are read as JSON when they parse, otherwise
/// as plain strings.
#[derive(Args)]
pub struct PropertyArgs {
    #[arg(short = 'p', long = "prop", value_parser = parse_property)]
    pub props: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct CreateArgs {
    pub kind: String,
    #[command(flatten)]
    pub properties: PropertyArgs,
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: ObjectId,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: ObjectId,
    #[command(flatten)]
    pub properties: PropertyArgs,
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct FilterArgs {
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
    #[command(flatten)]
    pub properties: PropertyArgs,
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(Args)]
pub struct LinkArgs {
    pub source: ObjectId,
    pub target: ObjectId,
    pub kind: String,
    #[command(flatten)]
    pub properties: PropertyArgs,
}

#[derive(Args)]
pub struct RelatedArgs {
    pub id: ObjectId,
    #[arg(long = "type")]
    pub kind: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Bundle file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub input: PathBuf,
}

#[derive(Args)]
pub struct KeygenArgs {
    pub output: PathBuf,
    /// Derive the key from a passphrase instead of generating it.
    #[arg(long)]
    pub passphrase: Option<String>,
    #[arg(long)]
    pub force: bool,
}

pub fn parse_property(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty property name in {raw:?}"));
    }
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}
