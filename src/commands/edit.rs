//! `kiln edit` — interactive editing of a decrypted file.

use anyhow::Result;
use colored::Colorize;

use crate::commands::Context;
use crate::core::editor::{self, EditOutcome};

pub fn run(ctx: &Context, file: &str, editor_flag: Option<String>) -> Result<()> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    match editor::edit(
        &identity,
        &cfg,
        file,
        editor_flag.as_deref(),
        &ctx.env,
        &ctx.cancel,
    )? {
        EditOutcome::Unchanged => eprintln!("No changes detected"),
        EditOutcome::Saved(count) => {
            eprintln!("{} Saved {count} variable(s)", "✓".green());
        }
    }
    Ok(())
}
