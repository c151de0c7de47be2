//! Shared CLI helpers: path expansion, image loading, output printing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::Engine;
use colored::Colorize;

use mohdel_core::{AnswerResult, Catalog, Error, ImageInput};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Mimetype from a file extension.
pub fn mimetype_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// Read an image file and base64-encode it.
pub fn load_image(path: &Path) -> Result<ImageInput> {
    let Some(mimetype) = mimetype_for(path) else {
        bail!("unrecognized image type: {}", path.display());
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(ImageInput::new(mimetype, data))
}

/// Turn a dispatch failure into a CLI error, keeping the retry class visible.
pub fn describe_error(err: Error) -> anyhow::Error {
    match err.code() {
        Some(code) if code.is_retryable() => {
            anyhow::Error::new(err).context("vendor call failed (retryable)")
        }
        Some(_) => anyhow::Error::new(err).context("vendor call failed"),
        None => anyhow::Error::new(err),
    }
}

/// Print an answer to stdout, with token usage when asked.
pub fn print_answer(result: &AnswerResult, show_usage: bool) {
    if result.output.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", result.output);
    }
    if show_usage {
        eprintln!(
            "{}",
            format!(
                "tokens: {} in | {} out | {} thinking",
                result.input_tokens, result.output_tokens, result.thinking_tokens
            )
            .dimmed()
        );
    }
}

/// Print every curated model, one per line.
pub fn print_models(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("{}", "(no curated models)".dimmed());
        return;
    }
    for (id, entry) in catalog.iter() {
        let mut line = format!("{:<48} {:>7}", id, entry.output_token_limit);
        if !entry.label.is_empty() {
            line.push_str(&format!("  {}", entry.label.dimmed()));
        }
        println!("{line}");
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
