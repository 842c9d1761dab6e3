//! cloudstub CLI - drive the local object stores from the command line
//!
//! Each invocation is a separate process, so store commands rescan the root
//! before doing anything. Content types and tags are therefore only visible
//! in the output of the command that uploaded them.

use anyhow::Context;
use clap::{Parser, Subcommand};
use cloudstub::{BucketStore, Config, ContainerStore, ObjectRecord, CONTENT_TYPE_KEY};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudstub")]
#[command(about = "Local filesystem emulation of blob and bucket object storage")]
#[command(version)]
struct Cli {
    /// Storage root (overrides config file and CLOUDSTUB_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Container/blob storage
    #[command(subcommand)]
    Container(ContainerCommands),

    /// Bucket/key storage
    #[command(subcommand)]
    Bucket(BucketCommands),

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ContainerCommands {
    /// Upload a local file as a blob
    Upload {
        container: String,
        name: String,
        /// File whose bytes become the blob
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download a blob (to stdout unless --output is given)
    Download {
        container: String,
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a blob (no error if absent)
    Delete { container: String, name: String },

    /// List all blobs
    List,
}

#[derive(Subcommand)]
enum BucketCommands {
    /// Upload a local file as an object
    Upload {
        source: PathBuf,
        bucket: String,
        key: String,
        #[arg(long)]
        content_type: Option<String>,
        /// Metadata tag, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_tag)]
        meta: Vec<(String, String)>,
    },

    /// Download an object to a local path
    Download {
        bucket: String,
        key: String,
        destination: PathBuf,
    },

    /// Delete an object (no error if absent)
    Delete { bucket: String, key: String },

    /// List all objects
    List,

    /// Generate a placeholder presigned URL
    Presign {
        bucket: String,
        key: String,
        /// Seconds until the URL's expiry label (defaults to config)
        #[arg(short, long, allow_hyphen_values = true)]
        expires_in: Option<i64>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "message": format!("{:#}", e)
            }),
        );
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }

    match &cli.command {
        Commands::Container(command) => run_container(cli, &config, command),
        Commands::Bucket(command) => run_bucket(cli, &config, command),
        Commands::Config => {
            output(
                &cli.format,
                &serde_json::json!({
                    "config_file": Config::default_path().map(|p| p.display().to_string()),
                    "root": config.root.display().to_string(),
                    "url_base": config.url_base,
                    "default_expiry_secs": config.default_expiry_secs
                }),
            );
            Ok(())
        }
    }
}

fn run_container(cli: &Cli, config: &Config, command: &ContainerCommands) -> anyhow::Result<()> {
    let store = ContainerStore::new(config.container_root())?;
    store.rebuild_index()?;

    match command {
        ContainerCommands::Upload {
            container,
            name,
            file,
            content_type,
        } => {
            let data = std::fs::read(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            store.upload(&data, container, name, content_type.as_deref())?;
            let record = store
                .get(container, name)
                .context("Uploaded blob missing from index")?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "object": record_json(&record)
                }),
            );
        }

        ContainerCommands::Download {
            container,
            name,
            output: destination,
        } => {
            let data = store.download(container, name)?;
            match destination {
                Some(path) => {
                    std::fs::write(path, &data)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "ok",
                            "path": path.display().to_string(),
                            "size": data.len()
                        }),
                    );
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&data)?;
                    stdout.flush()?;
                }
            }
        }

        ContainerCommands::Delete { container, name } => {
            store.delete(container, name)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "container": container,
                    "name": name
                }),
            );
        }

        ContainerCommands::List => {
            let items: Vec<_> = store.list().values().map(record_json).collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": items.len(),
                    "objects": items
                }),
            );
        }
    }

    Ok(())
}

fn run_bucket(cli: &Cli, config: &Config, command: &BucketCommands) -> anyhow::Result<()> {
    let store = BucketStore::new(config.bucket_root())?.with_url_base(config.url_base.clone());
    store.rebuild_index()?;

    match command {
        BucketCommands::Upload {
            source,
            bucket,
            key,
            content_type,
            meta,
        } => {
            let mut extra: HashMap<String, String> = meta.iter().cloned().collect();
            if let Some(content_type) = content_type {
                extra.insert(CONTENT_TYPE_KEY.to_string(), content_type.clone());
            }
            store.upload_file(source, bucket, key, Some(&extra))?;
            let record = store
                .head_object(bucket, key)
                .context("Uploaded object missing from index")?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "object": record_json(&record)
                }),
            );
        }

        BucketCommands::Download {
            bucket,
            key,
            destination,
        } => {
            store.download_file(bucket, key, destination)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "path": destination.display().to_string()
                }),
            );
        }

        BucketCommands::Delete { bucket, key } => {
            store.delete_object(bucket, key)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "bucket": bucket,
                    "key": key
                }),
            );
        }

        BucketCommands::List => {
            let items: Vec<_> = store.list_objects().values().map(record_json).collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "count": items.len(),
                    "objects": items
                }),
            );
        }

        BucketCommands::Presign {
            bucket,
            key,
            expires_in,
        } => {
            let expires_in = expires_in.unwrap_or(config.default_expiry_secs);
            let url = store.generate_presigned_url(bucket, key, expires_in);
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "url": url,
                    "expires_in": expires_in
                }),
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty tag name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn record_json(record: &ObjectRecord) -> serde_json::Value {
    serde_json::json!({
        "namespace": record.namespace(),
        "name": record.name(),
        "path": record.path.display().to_string(),
        "content_type": record.content_type,
        "metadata": record.metadata,
        "size": record.size,
        "created_at": record.created_at.to_rfc3339()
    })
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Text => println!("{:#}", value),
    }
}
