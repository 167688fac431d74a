//! `kiln set` — set one variable, or import many from a JSON file.

use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde_json::Value;

use crate::commands::Context;
use crate::core::error::Error;
use crate::core::secret::SecretBuffer;
use crate::core::store;
use crate::core::validate;

/// Maximum entries accepted from a `--from-file` JSON object.
const MAX_JSON_ENTRIES: usize = 1000;

pub fn run(
    ctx: &Context,
    name: Option<String>,
    value: Option<String>,
    file: &str,
    from_file: Option<&Path>,
) -> Result<()> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    if let Some(json_path) = from_file {
        if name.is_some() || value.is_some() {
            anyhow::bail!("--from-file cannot be combined with NAME/VALUE arguments");
        }
        let count = import_json(&identity, &cfg, file, json_path)?;
        let (logical, _) = cfg.get_env_file(file)?;
        eprintln!("{} Imported {count} variable(s) into '{logical}'", "✓".green());
        return Ok(());
    }

    let name = name.context("a variable NAME is required without --from-file")?;
    validate::validate_var_name(&name)?;

    let value = match value {
        Some(value) => SecretBuffer::from(value),
        None => prompt_value(&name)?,
    };

    store::set_one(&identity, &cfg, file, &name, value)?;
    let (logical, _) = cfg.get_env_file(file)?;
    eprintln!("{} Set {name} in '{logical}'", "✓".green());
    Ok(())
}

fn prompt_value(name: &str) -> Result<SecretBuffer> {
    let value = dialoguer::Password::new()
        .with_prompt(format!("Value for {name}"))
        .allow_empty_password(true)
        .interact()
        .context("cannot read the value from the terminal")?;
    Ok(SecretBuffer::from(value))
}

/// Merges a JSON object's entries into the file's existing variables.
fn import_json(
    identity: &crate::core::keys::Identity,
    cfg: &crate::core::config::Config,
    file: &str,
    json_path: &Path,
) -> Result<usize> {
    let raw = std::fs::read_to_string(json_path)
        .map_err(|e| Error::file_access(json_path, e))?;
    let parsed: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::Input(format!("cannot parse JSON: {e}")))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| Error::Input("JSON import expects a top-level object".to_string()))?;

    if object.len() > MAX_JSON_ENTRIES {
        return Err(Error::Input(format!(
            "JSON import is limited to {MAX_JSON_ENTRIES} entries"
        ))
        .into());
    }

    // Merge semantics: existing variables absent from the import survive.
    let mut map = store::get_all(identity, cfg, file)?;
    for (key, value) in object {
        validate::validate_var_name(key)?;
        let rendered = render_json_value(key, value)?;
        validate::validate_env_value(key, rendered.as_bytes())?;
        map.insert(key.clone(), SecretBuffer::from(rendered));
    }
    store::set_all(identity, cfg, file, &map)?;
    Ok(object.len())
}

/// Strings pass through; integral numbers render without decimals; booleans
/// become `true`/`false`; null becomes the empty string. Arrays and nested
/// objects are rejected.
fn render_json_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else {
                Ok(n.to_string())
            }
        }
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(Error::Input(format!(
            "'{key}': arrays and objects are not supported"
        ))
        .into()),
    }
}
