//! `kiln init key` and `kiln init config`.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::commands::Context;
use crate::core::config::Config;
use crate::core::keys::{self, DEFAULT_KEY_RELPATH};
use crate::core::rekey::parse_addition;

/// Generates a keypair and prints the public key on stdout.
pub fn run_key(ctx: &Context, path: Option<PathBuf>, encrypt: bool, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => ctx
            .env
            .home
            .as_ref()
            .context("cannot determine home directory for the default key path")?
            .join(DEFAULT_KEY_RELPATH),
    };

    let public_key = keys::generate_keypair(&path, encrypt, force)
        .with_context(|| format!("cannot create key at '{}'", path.display()))?;

    eprintln!("{} Created key at {}", "✓".green(), path.display());
    println!("{public_key}");
    Ok(())
}

/// Writes a fresh config with the supplied recipients.
pub fn run_config(
    ctx: &Context,
    path: Option<PathBuf>,
    recipients: Vec<String>,
    force: bool,
) -> Result<()> {
    let path = path.unwrap_or_else(|| ctx.config_path());
    if path.exists() && !force {
        anyhow::bail!(
            "config '{}' already exists (pass --force to overwrite it)",
            path.display()
        );
    }

    let mut config = Config::new();
    for spec in &recipients {
        let addition = parse_addition(spec)?;
        config.add_recipient(addition.name, addition.public_key);
    }
    config.validate()?;
    config.save(&path)?;

    eprintln!(
        "{} Created config at {} with {} recipient(s)",
        "✓".green(),
        path.display(),
        config.recipients.len()
    );
    Ok(())
}
