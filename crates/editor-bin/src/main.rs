//! Thin CLI harness: load a file into a `Document`/`View` and print a
//! quick summary, for manual smoke testing of the buffer core. Not part
//! of the tested surface — the library crates carry the real coverage.

use anyhow::{Context, Result};
use clap::Parser;
use core_model::{Document, View};
use std::path::PathBuf;
use std::sync::Once;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Open a file with the buffer core and report what it found.
#[derive(Parser, Debug)]
#[command(name = "editor", version, about = "Buffer core smoke-test harness")]
struct Args {
    /// File to open. A dynamic scratch buffer is used if omitted.
    path: Option<PathBuf>,
    /// Config file path, overriding discovery of `editor.toml`.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_path = std::path::Path::new("editor.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "editor.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    let ctx = core_config::load_from(args.config.clone());

    let mut doc = match &args.path {
        Some(path) => {
            info!(target: "runtime", path = %path.display(), "opening");
            Document::from_file(path, ctx.default_tab_type)
                .with_context(|| format!("failed to open {}", path.display()))?
        }
        None => {
            info!(target: "runtime", "no path given, starting a dynamic buffer");
            Document::dynamic("untitled", ctx.default_tab_type)
        }
    };

    let view = View::new();

    println!("lines: {}", doc.buffer.line_count());
    println!("language: {:?}", doc.language);
    println!("tab_type: {}", doc.buffer.tab_type);
    println!("tokens: {}", doc.parse.tokens.len());
    println!("cursor: {:?}", view.cursors[0].pos);
    println!("modified: {}", doc.is_modified());

    if let Some(path) = &args.path {
        doc.buffer
            .save_to_file(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        doc.undo.mark_saved();
    }

    Ok(())
}
