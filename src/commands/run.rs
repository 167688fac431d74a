//! `kiln run` — spawn a command with decrypted variables injected.

use std::time::Duration;

use anyhow::Result;

use crate::commands::Context;
use crate::core::runner::{self, RunRequest};

#[allow(clippy::too_many_arguments)]
pub fn run(
    ctx: &Context,
    argv: Vec<String>,
    file: &str,
    dry_run: bool,
    timeout: Option<Duration>,
    workdir: Option<String>,
    shell: bool,
) -> Result<i32> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    let request = RunRequest {
        argv,
        dry_run,
        timeout,
        workdir,
        shell,
    };
    let code = runner::execute(&identity, &cfg, file, &request, &ctx.cancel)?;
    Ok(code)
}
