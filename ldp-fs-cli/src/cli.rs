use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use serde_json::json;
use tracing::info;

use ldp_fs_core::{DeleteOutcome, LdpAdapter, Metadata, StorageAdapter, WriteConfig};

/// Determine whether output should be JSON.
/// JSON is used when: --json flag is set, OR stdout is not a terminal (piped).
pub fn use_json(flag: bool) -> bool {
    flag || !io::stdout().is_terminal()
}

fn kind_indicator(meta: &Metadata) -> &'static str {
    if meta.is_dir() {
        "[d]"
    } else {
        "[f]"
    }
}

fn print_metadata(items: &[Metadata], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for meta in items {
            let size = meta.size.map(|s| s.to_string()).unwrap_or_default();
            println!(
                "{} {:>10} {:<24} {}",
                kind_indicator(meta),
                size,
                meta.mimetype.as_deref().unwrap_or(""),
                meta.path
            );
        }
    }
    Ok(())
}

/// Print a structured error and exit with code 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let msg = format!("{:#}", err);
        eprintln!("{}", json!({ "error": msg }));
    } else {
        eprintln!("error: {:#}", err);
    }
    std::process::exit(1);
}

pub async fn stat(adapter: &LdpAdapter, path: &str, json: bool) -> Result<()> {
    let Some(meta) = adapter.get_metadata(path).await? else {
        bail!("Not found: {}", path);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print_metadata(std::slice::from_ref(&meta), false)?;
        println!("modified: {}", meta.timestamp);
    }
    Ok(())
}

pub async fn exists(adapter: &LdpAdapter, path: &str, json: bool) -> Result<()> {
    let found = adapter.has(path).await?;
    if json {
        println!("{}", json!({ "path": path, "exists": found }));
    } else {
        println!("{}", if found { "yes" } else { "no" });
    }
    if !found {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn list(adapter: &LdpAdapter, path: &str, recursive: bool, json: bool) -> Result<()> {
    let items = adapter.list_contents(path, recursive).await?;
    print_metadata(&items, json)
}

pub async fn cat(adapter: &LdpAdapter, path: &str) -> Result<()> {
    let Some(result) = adapter.read(path).await? else {
        bail!("Not found: {}", path);
    };
    if !result.metadata.is_file() {
        bail!("Not a file: {}", path);
    }
    let mut stdout = io::stdout().lock();
    stdout.write_all(&result.contents)?;
    stdout.flush()?;
    Ok(())
}

pub async fn put(
    adapter: &LdpAdapter,
    path: &str,
    file: Option<PathBuf>,
    content: Option<String>,
    checksum: Option<String>,
    json: bool,
) -> Result<()> {
    let body = match (file, content) {
        (Some(file), _) => Bytes::from(
            tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?,
        ),
        (None, Some(content)) => Bytes::from(content),
        (None, None) => {
            if io::stdin().is_terminal() {
                bail!("No content provided. Pass --file, --content or pipe via stdin.");
            }
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Bytes::from(buf)
        }
    };

    let config = WriteConfig { checksum };
    let Some(meta) = adapter.write(path, body, &config).await? else {
        bail!("Repository rejected write to {}", path);
    };
    info!(path = %path, size = ?meta.size, "Wrote resource");
    if json {
        println!("{}", json!({ "ok": true, "action": "written", "metadata": meta }));
    } else {
        println!("Wrote: {}", path);
    }
    Ok(())
}

pub async fn mkdir(adapter: &LdpAdapter, path: &str, json: bool) -> Result<()> {
    let Some(meta) = adapter.create_dir(path).await? else {
        bail!("Repository rejected directory {}", path);
    };
    if json {
        println!("{}", json!({ "ok": true, "action": "created", "metadata": meta }));
    } else {
        println!("Created: {}", path);
    }
    Ok(())
}

pub async fn remove(adapter: &LdpAdapter, path: &str, json: bool) -> Result<()> {
    let outcome = adapter.delete_resource(path).await?;
    let action = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::AlreadyAbsent => "absent",
        DeleteOutcome::DeletedWithStaleTombstone => "deleted-stale-tombstone",
        DeleteOutcome::Rejected(status) => bail!("Repository refused delete of {}: {}", path, status),
    };
    if json {
        println!(
            "{}",
            json!({ "ok": outcome.is_success(), "path": path, "action": action })
        );
    } else if outcome == DeleteOutcome::DeletedWithStaleTombstone {
        println!("Deleted: {} (tombstone could not be removed)", path);
    } else {
        println!("Deleted: {}", path);
    }
    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn copy(adapter: &LdpAdapter, source: &str, destination: &str, json: bool) -> Result<()> {
    if !adapter.copy(source, destination).await? {
        bail!("Failed to copy {} to {}", source, destination);
    }
    if json {
        println!(
            "{}",
            json!({ "ok": true, "source": source, "destination": destination, "action": "copied" })
        );
    } else {
        println!("Copied: {} -> {}", source, destination);
    }
    Ok(())
}

pub async fn rename(
    adapter: &LdpAdapter,
    source: &str,
    destination: &str,
    json: bool,
) -> Result<()> {
    if !adapter.rename(source, destination).await? {
        // The copy may already exist even though the move failed.
        let copied = adapter.has(destination).await?;
        bail!(
            "Failed to move {} to {} (destination {})",
            source,
            destination,
            if copied { "was written" } else { "untouched" }
        );
    }
    if json {
        println!(
            "{}",
            json!({ "ok": true, "source": source, "destination": destination, "action": "moved" })
        );
    } else {
        println!("Moved: {} -> {}", source, destination);
    }
    Ok(())
}
