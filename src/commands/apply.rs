//! `kiln apply` — substitute variables into a template.

use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::commands::Context;
use crate::core::store;
use crate::core::template::{self, TemplateOptions};
use crate::utils::fs as fsutil;

#[allow(clippy::too_many_arguments)]
pub fn run(
    ctx: &Context,
    template_path: &Path,
    file: &str,
    output: Option<&Path>,
    strict: bool,
    left_delimiter: Option<String>,
    right_delimiter: Option<String>,
) -> Result<()> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    let template_text = std::fs::read_to_string(template_path)
        .with_context(|| format!("cannot read template '{}'", template_path.display()))?;

    let vars = store::get_all(&identity, &cfg, file)?;
    let options = TemplateOptions {
        left_delimiter,
        right_delimiter,
        strict,
    };
    let rendered = template::apply(&template_text, &vars, &options)?;
    drop(vars);

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            fsutil::set_mode(path, 0o644)?;
            eprintln!("{} Rendered template to {}", "✓".green(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
