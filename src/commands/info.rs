//! `kiln info` — inspect a file's configuration and health.

use anyhow::Result;

use crate::commands::Context;
use crate::core::store;

pub fn run(ctx: &Context, file: &str, verify: bool) -> Result<()> {
    let cfg = ctx.load_config()?;
    let (logical, entry) = cfg.get_env_file(file)?;
    let path = cfg.resolve_path(entry);

    println!("file: {logical}");
    println!("path: {}", path.display());
    match std::fs::metadata(&path) {
        Ok(meta) => println!("exists: yes ({} bytes)", meta.len()),
        Err(_) => println!("exists: no"),
    }
    println!("access: {}", entry.access.join(", "));
    println!("recipients: {}", recipient_names(&cfg, entry).join(", "));

    if verify {
        let identity = ctx.load_identity(&cfg)?;
        let count = store::check(&identity, &cfg, file)?;
        println!("verified: yes ({count} variable(s))");
    }
    Ok(())
}

/// The declared recipient names the access list expands to, in config order.
fn recipient_names(
    cfg: &crate::core::Config,
    entry: &crate::core::config::FileEntry,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };
    for token in &entry.access {
        if token == "*" {
            for name in cfg.recipients.keys() {
                push(name);
            }
            break;
        }
        if let Some(members) = cfg.groups.get(token) {
            for member in members {
                if cfg.recipients.contains_key(member) {
                    push(member);
                }
            }
        } else if cfg.recipients.contains_key(token) {
            push(token);
        }
    }
    names
}
