mod cli;
mod config;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use config::Config;
use ldp_fs_core::{HttpResourceClient, LdpAdapter};

/// Browse and edit an LDP repository as if it were a file store.
///
/// Paths are relative to the repository base URI, e.g. `books/moby-dick.txt`.
/// Binary resources show up as files, everything else as directories.
///
/// Output is auto-JSON when stdout is piped. Force with --json.
#[derive(Parser, Debug)]
#[command(name = "ldp-fs", version)]
struct Args {
    /// Repository base URI (overrides the config file)
    #[arg(long, global = true, env = "LDP_FS_BASE_URI")]
    base_uri: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "LDP_FS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to a TOML config file (default: ~/.ldp-fs.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Force JSON output (auto-enabled when stdout is piped)
    #[arg(long, global = true)]
    json: bool,

    /// Log every request
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the metadata of a resource
    Stat { path: String },

    /// Exit with status 0 if the resource exists, 1 otherwise
    Exists { path: String },

    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Write a file's contents to stdout
    Cat { path: String },

    /// Create or replace a file (reads stdin if no --file or --content)
    Put {
        path: String,

        /// Local file to upload
        #[arg(long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Inline content to upload
        #[arg(long)]
        content: Option<String>,

        /// SHA-1 checksum the repository should verify
        #[arg(long)]
        checksum: Option<String>,
    },

    /// Create a directory
    Mkdir { path: String },

    /// Delete a file or directory
    Rm { path: String },

    /// Copy a file
    Cp { source: String, destination: String },

    /// Move a file (copy then delete, not atomic)
    Mv { source: String, destination: String },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    // Tracing to stderr, stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let json = cli::use_json(args.json);
    if let Err(e) = run(args, json).await {
        cli::handle_error(e, json);
    }
}

async fn run(args: Args, json: bool) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let client_config = config.client_config(args.base_uri.as_deref(), args.token.as_deref())?;
    debug!(base_uri = %client_config.base_uri, "Connecting to repository");

    let client = HttpResourceClient::new(client_config)?;
    let adapter = LdpAdapter::with_client(Arc::new(client));

    match args.command {
        Command::Stat { path } => cli::stat(&adapter, &path, json).await,
        Command::Exists { path } => cli::exists(&adapter, &path, json).await,
        Command::Ls { path, recursive } => cli::list(&adapter, &path, recursive, json).await,
        Command::Cat { path } => cli::cat(&adapter, &path).await,
        Command::Put {
            path,
            file,
            content,
            checksum,
        } => cli::put(&adapter, &path, file, content, checksum, json).await,
        Command::Mkdir { path } => cli::mkdir(&adapter, &path, json).await,
        Command::Rm { path } => cli::remove(&adapter, &path, json).await,
        Command::Cp {
            source,
            destination,
        } => cli::copy(&adapter, &source, &destination, json).await,
        Command::Mv {
            source,
            destination,
        } => cli::rename(&adapter, &source, &destination, json).await,
    }
}
