//! `kiln rekey` — add recipients and re-encrypt.

use anyhow::Result;
use colored::Colorize;

use crate::commands::Context;
use crate::core::rekey::{self, Addition};

pub fn run(ctx: &Context, file: &str, add_recipient: Vec<String>, force: bool) -> Result<()> {
    let additions = add_recipient
        .iter()
        .map(|spec| rekey::parse_addition(spec))
        .collect::<crate::core::Result<Vec<Addition>>>()?;

    let mut cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;
    let config_path = ctx.config_path();

    rekey::rekey(&identity, &mut cfg, &config_path, file, &additions, force)?;

    let (logical, _) = cfg.get_env_file(file)?;
    eprintln!(
        "{} Rekeyed '{logical}' (+{} recipient(s))",
        "✓".green(),
        additions.len()
    );
    Ok(())
}
