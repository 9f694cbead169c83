use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use liquid_sdk::{
    Direction, Filter, KeySource, LiquidObject, LiquidStore, MutationMeta, Properties,
    StoreConfig, StoreKey, SyncBundle,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

const DEFAULT_DATA_DIR: &str = ".liquid";
const KEY_FILE_NAME: &str = ".store-key";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    if let Command::Keygen(args) = &cli.command {
        return cmd_keygen(args);
    }
    let store = open_store(&cli)?;
    let out = Output { format: cli.format };
    let author = cli.author;
    let meta = |tags: Vec<String>| MutationMeta {
        author: author.clone(),
        tags: (!tags.is_empty()).then_some(tags),
    };

    match cli.command {
        Command::Create(args) => {
            let object = store.create(args.kind, props(args.properties), &meta(args.tags))?;
            out.object("Created", &object)
        }
        Command::Get(args) => match store.get(&args.id) {
            Some(object) => out.object("Found", &object),
            None => bail!("object not found: {}", args.id),
        },
        Command::Update(args) => {
            let object = store.update(&args.id, props(args.properties), &meta(args.tags))?;
            out.object("Updated", &object)
        }
        Command::Delete(args) => {
            let object = store.soft_delete(&args.id)?;
            out.object("Deleted", &object)
        }
        Command::Query(args) => {
            let objects = store.query(&filter(args));
            out.objects(&objects)
        }
        Command::Link(args) => {
            let rel =
                store.add_relationship(&args.source, &args.target, args.kind, props(args.properties))?;
            out.emit(&rel, || {
                println!(
                    "{} Linked {} -[{}]-> {}",
                    "✓".green().bold(),
                    rel.source_id.short_id().yellow(),
                    rel.kind.cyan(),
                    rel.target_id.short_id().yellow()
                )
            })
        }
        Command::Related(args) => {
            let related = store.get_related_objects(&args.id, args.kind.as_deref());
            out.emit(&related, || {
                for r in &related {
                    let arrow = match r.direction {
                        Direction::Outgoing => "->",
                        Direction::Incoming => "<-",
                    };
                    println!("{} {:<12} {}", arrow, r.relationship.kind.cyan(), object_line(&r.object));
                }
                println!("{} related", related.len().to_string().bold());
            })
        }
        Command::Stats => {
            let stats = store.stats();
            out.emit(&stats, || {
                println!("Objects: {}", stats.total_objects.to_string().bold());
                for (kind, count) in &stats.object_types {
                    println!("  {:<16} {}", kind.cyan(), count);
                }
                println!("Relationships: {}", stats.total_relationships.to_string().bold());
                println!("Changes: {}", stats.total_changes.to_string().bold());
            })
        }
        Command::Export(args) => cmd_export(&store, args),
        Command::Import(args) => cmd_import(&store, &out, &args.input),
        Command::Keygen(_) => Ok(()),
    }
}

/// Build the store from `--config`, then apply command-line overrides.
///
/// A directory store always gets a persistent key: `--key-file`, the
/// configured key, or `<data-dir>/.store-key`.
pub fn open_store(cli: &Cli) -> anyhow::Result<LiquidStore> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    let data_dir = config
        .data_dir
        .get_or_insert_with(|| PathBuf::from(DEFAULT_DATA_DIR))
        .clone();
    if let Some(key_file) = &cli.key_file {
        config.key = KeySource::File(key_file.clone());
    } else if config.key == KeySource::Generate {
        config.key = KeySource::File(data_dir.join(KEY_FILE_NAME));
    }
    debug!(data_dir = %data_dir.display(), "opening store");

    let store = LiquidStore::open(config)
        .with_context(|| format!("opening store at {}", data_dir.display()))?;
    for failure in store.load_failures() {
        eprintln!(
            "{} skipped unreadable record {}: {}",
            "warning:".yellow().bold(),
            failure.record,
            failure.reason
        );
    }
    Ok(store)
}

fn cmd_export(store: &LiquidStore, args: ExportArgs) -> anyhow::Result<()> {
    let bundle = store.export_for_sync(Some(&filter(args.filter)));
    let json = bundle.to_json_pretty()?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} Exported {} objects and {} changes to {}",
                "✓".green().bold(),
                bundle.objects.len(),
                bundle.change_log.len(),
                path.display().to_string().bold()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_import(store: &LiquidStore, out: &Output, input: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let bundle = SyncBundle::from_slice(&bytes)?;
    let report = store.import_from_sync(bundle)?;
    out.emit(&report, || {
        println!(
            "{} Imported {} objects: {} new, {} updated, {} unchanged",
            "✓".green().bold(),
            report.objects_seen(),
            report.adopted,
            report.remote_applied,
            report.local_retained
        );
        println!(
            "  Changes: {} appended, {} already seen",
            report.changes_appended, report.changes_skipped
        );
    })
}

fn cmd_keygen(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            args.output.display()
        );
    }
    let key = match &args.passphrase {
        Some(phrase) => StoreKey::from_passphrase(phrase),
        None => StoreKey::generate(),
    };
    key.save(&args.output)?;
    println!(
        "{} Wrote key {} to {}",
        "✓".green().bold(),
        key.fingerprint().cyan(),
        args.output.display().to_string().bold()
    );
    Ok(())
}

fn props(args: PropertyArgs) -> Properties {
    args.props.into_iter().collect()
}

fn filter(args: FilterArgs) -> Filter {
    let mut filter = Filter::new().include_deleted(args.include_deleted);
    filter.kind = args.kind;
    filter.tags = args.tags;
    filter.properties = props(args.properties);
    filter
}

fn object_line(object: &LiquidObject) -> String {
    let deleted = if object.is_deleted() {
        format!(" {}", "(deleted)".red())
    } else {
        String::new()
    };
    format!(
        "{} {} v{}{}",
        object.id.to_string().yellow(),
        object.kind.bold(),
        object.version(),
        deleted
    )
}

struct Output {
    format: OutputFormat,
}

impl Output {
    /// Print `value` as JSON, or run `text` for human output.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }

    fn object(&self, verb: &str, object: &LiquidObject) -> anyhow::Result<()> {
        self.emit(object, || {
            println!("{} {} {}", "✓".green().bold(), verb, object_line(object));
            for (key, value) in &object.properties {
                let value = serde_json::to_string(value).unwrap_or_default();
                println!("  {key}: {value}");
            }
            if !object.metadata.tags.is_empty() {
                let tags: Vec<&str> = object.metadata.tags.iter().map(String::as_str).collect();
                println!("  tags: {}", tags.join(", ").cyan());
            }
        })
    }

    fn objects(&self, objects: &[LiquidObject]) -> anyhow::Result<()> {
        self.emit(&objects, || {
            for object in objects {
                println!("{}", object_line(object));
            }
            println!("{} objects", objects.len().to_string().bold());
        })
    }
}
