//! `kiln get` — print one variable's value.

use anyhow::Result;

use crate::commands::Context;
use crate::core::error::Error;
use crate::core::store;

pub fn run(ctx: &Context, name: &str, file: &str, format: &str) -> Result<()> {
    let cfg = ctx.load_config()?;
    let identity = ctx.load_identity(&cfg)?;

    let value = store::get_one(&identity, &cfg, file, name)?;

    match format {
        "value" => println!("{}", value.to_string_lossy()),
        "json" => {
            let mut object = serde_json::Map::new();
            object.insert(
                name.to_string(),
                serde_json::Value::String(value.to_string_lossy()),
            );
            println!("{}", serde_json::Value::Object(object));
        }
        other => {
            return Err(Error::Input(format!(
                "unknown get format '{other}' (expected value or json)"
            ))
            .into())
        }
    }
    Ok(())
}
