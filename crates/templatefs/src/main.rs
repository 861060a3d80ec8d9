//! templatefs CLI
//!
//! Runs single filesystem operations against a directory template store and
//! logs the change batch they produce.
//!
//! Usage:
//!   templatefs [--root DIR] read <NAME>
//!   templatefs [--root DIR] write <NAME> [EXT]    content from stdin
//!   templatefs [--root DIR] stat <NAME>
//!   templatefs [--root DIR] delete <NAME>

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use templatefs::{
    Config, DirTemplateStore, FileSystemProvider, TemplateFileSystem, TemplateQuery,
};
use url::Url;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest wait for the coalesced batch after a mutation
const BATCH_WAIT: Duration = Duration::from_secs(1);

fn print_usage() {
    eprintln!();
    eprintln!("  \x1b[1;96mtemplatefs\x1b[0m - Templates as a virtual filesystem");
    eprintln!();
    eprintln!("  \x1b[1mUSAGE:\x1b[0m");
    eprintln!("    templatefs [--root DIR] read <NAME>          Print template content");
    eprintln!("    templatefs [--root DIR] write <NAME> [EXT]   Write stdin to template");
    eprintln!("    templatefs [--root DIR] stat <NAME>          Show size and timestamps");
    eprintln!("    templatefs [--root DIR] delete <NAME>        Remove template");
    eprintln!("    templatefs --help                            Show this help");
    eprintln!("    templatefs --version                         Show version");
    eprintln!();
}

struct Invocation {
    root: Option<PathBuf>,
    command: String,
    name: String,
    ext: Option<String>,
}

fn parse_args(mut args: Vec<String>) -> Result<Invocation> {
    let mut root = None;
    if args.first().map(String::as_str) == Some("--root") {
        if args.len() < 2 {
            bail!("--root requires a directory");
        }
        root = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let mut args = args.into_iter();
    let command = args.next().context("missing command")?;
    let name = args.next().context("missing template name")?;
    Ok(Invocation {
        root,
        command,
        name,
        ext: args.next(),
    })
}

fn format_secs(time: std::time::SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging (tracing)
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("--help" | "-h" | "help") => {
            print_usage();
            return Ok(());
        }
        Some("--version" | "-v") => {
            println!("templatefs {VERSION}");
            return Ok(());
        }
        _ => {}
    }

    let invocation = match parse_args(args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("\x1b[1;31m[error]\x1b[0m {e}");
            print_usage();
            std::process::exit(2);
        }
    };

    let config = Config::load();
    let root = invocation
        .root
        .unwrap_or_else(|| config.store.resolved_root());
    let store = DirTemplateStore::new(&root)
        .with_context(|| format!("Failed to open template store at {}", root.display()))?;
    tracing::info!(root = %store.root().display(), "Template store opened");

    let fs = TemplateFileSystem::with_config(Arc::new(store), &config.adapter);
    let mut changes = fs.subscribe();

    let mut base = Url::parse("templatefs:/")?;
    base.set_path(&format!("/{}", invocation.name));
    let uri = TemplateQuery::to_uri(&base, &invocation.name, invocation.ext.as_deref());

    let mutated = match invocation.command.as_str() {
        "read" => {
            let content = fs.read_file(&uri)?;
            std::io::stdout().write_all(&content)?;
            false
        }
        "stat" => {
            let stat = fs.stat(&uri)?;
            println!(
                "size={} ctime={} mtime={}",
                stat.size,
                format_secs(stat.ctime),
                format_secs(stat.mtime)
            );
            false
        }
        "write" => {
            let mut content = Vec::new();
            std::io::stdin().read_to_end(&mut content)?;
            fs.write_file(&uri, &content).await?;
            true
        }
        "delete" => {
            fs.delete(&uri).await?;
            true
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
    };

    if mutated {
        match tokio::time::timeout(BATCH_WAIT, changes.recv()).await {
            Ok(Ok(batch)) => {
                for event in batch {
                    tracing::info!(kind = ?event.kind, uri = %event.uri, "Change delivered");
                }
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "Change stream closed"),
            Err(_) => tracing::warn!("No change batch delivered"),
        }
    }

    Ok(())
}
