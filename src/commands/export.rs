//! `kiln export` — print every variable in a chosen format.

use anyhow::Result;

use crate::commands::Context;
use crate::core::store;
use crate::formats;

pub fn run(ctx: &Context, file: &str, format: &str) -> Result<()> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    let vars = store::get_all(&identity, &cfg, file)?;
    let exporter = formats::exporter_for(format)?;
    let rendered = exporter.render(&vars)?;
    drop(vars);

    print!("{rendered}");
    Ok(())
}
