use anyhow::{Context, Result};
use awsrecon::config::Config;
use awsrecon::reconcile::id::{self, SCHEMES};
use awsrecon::reconcile::tags::{ignore_aws, TagDiff, TagSet};
use awsrecon::reconcile::xml;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Offline tools for the AWS provider reconciliation core
#[derive(Parser, Debug)]
#[command(name = "awsrecon", version, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// AWS region, overrides the saved configuration
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode and decode composite resource IDs
    #[command(subcommand)]
    Id(IdCommand),
    /// Compare broker configuration XML
    #[command(subcommand)]
    Xml(XmlCommand),
    /// Compute tag changes
    #[command(subcommand)]
    Tags(TagsCommand),
    /// Show or change the saved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum IdCommand {
    /// List the composite ID schemes of each resource type
    Schemes,
    /// Join parts into a resource ID
    Encode {
        /// Resource type whose scheme to use
        #[arg(short, long)]
        resource_type: String,
        parts: Vec<String>,
    },
    /// Split a resource ID into its named parts
    Decode {
        #[arg(short, long)]
        resource_type: String,
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum XmlCommand {
    /// Exit 0 when both documents are equivalent, 1 otherwise
    Equivalent { old: PathBuf, new: PathBuf },
    /// Print the canonical form of a document
    Canonical { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum TagsCommand {
    /// Print the additions and removals turning CURRENT into DESIRED
    Diff {
        /// JSON or YAML map of current tags
        current: PathBuf,
        /// JSON or YAML map of desired tags
        desired: PathBuf,
        /// Include aws:-prefixed system tags
        #[arg(long)]
        keep_aws: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    /// Save the default region
    SetRegion {
        #[arg(value_name = "REGION")]
        value: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("awsrecon started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("awsrecon").join("awsrecon.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".awsrecon").join("awsrecon.log");
    }
    PathBuf::from("awsrecon.log")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    match args.command {
        Command::Id(cmd) => run_id(cmd),
        Command::Xml(cmd) => run_xml(cmd),
        Command::Tags(cmd) => run_tags(cmd),
        Command::Config(cmd) => run_config(cmd, args.region),
    }
}

fn scheme(resource_type: &str) -> Result<&'static id::IdScheme> {
    id::scheme_for(resource_type).ok_or_else(|| {
        anyhow::anyhow!(
            "No composite ID scheme for {} (known: {})",
            resource_type,
            SCHEMES
                .iter()
                .map(|s| s.resource_type)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn run_id(cmd: IdCommand) -> Result<()> {
    match cmd {
        IdCommand::Schemes => {
            for scheme in SCHEMES {
                println!("{:<28} {}", scheme.resource_type, scheme.format());
            }
        }
        IdCommand::Encode {
            resource_type,
            parts,
        } => {
            println!("{}", scheme(&resource_type)?.encode(&parts)?);
        }
        IdCommand::Decode { resource_type, id } => {
            let named: serde_json::Map<String, serde_json::Value> = scheme(&resource_type)?
                .decode_named(&id)?
                .into_iter()
                .map(|(name, value)| (name.to_string(), serde_json::Value::String(value)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&named)?);
        }
    }
    Ok(())
}

fn run_xml(cmd: XmlCommand) -> Result<()> {
    match cmd {
        XmlCommand::Equivalent { old, new } => {
            let old = read_file(&old)?;
            let new = read_file(&new)?;
            if xml::equivalent(&old, &new) {
                println!("equivalent");
            } else {
                println!("different");
                std::process::exit(1);
            }
        }
        XmlCommand::Canonical { file } => {
            let content = read_file(&file)?;
            let canonical = xml::canonicalize(&content)
                .with_context(|| format!("Cannot canonicalize {:?}", file))?;
            println!("{}", canonical);
        }
    }
    Ok(())
}

fn run_tags(cmd: TagsCommand) -> Result<()> {
    match cmd {
        TagsCommand::Diff {
            current,
            desired,
            keep_aws,
        } => {
            let mut current = read_tags(&current)?;
            let mut desired = read_tags(&desired)?;
            if !keep_aws {
                current = ignore_aws(&current);
                desired = ignore_aws(&desired);
            }
            let diff = TagDiff::between(&current, &desired);
            tracing::debug!(
                "tag diff: {} additions, {} removals",
                diff.additions.len(),
                diff.removals.len()
            );
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
    }
    Ok(())
}

fn run_config(cmd: ConfigCommand, region_override: Option<String>) -> Result<()> {
    let mut config = Config::load();
    match cmd {
        ConfigCommand::Show => {
            if region_override.is_some() {
                config.region = region_override;
            }
            println!("region:    {}", config.effective_region());
            println!("partition: {}", config.effective_partition());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::SetRegion { value } => {
            config.set_region(&value)?;
            println!("region set to {}", value);
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

fn read_tags(path: &Path) -> Result<TagSet> {
    let content = read_file(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML tags in {:?}", path))
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON tags in {:?}", path))
    }
}
