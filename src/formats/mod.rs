//! Output formats for `kiln export`.

pub mod json;
pub mod shell;
pub mod yaml;

use crate::core::error::{Error, Result};
use crate::core::secret::SecretMap;

/// Renders a decrypted map into a textual export format.
///
/// Implement this trait to add a new output format. Keys are always emitted
/// in lexicographic order.
pub trait Exporter {
    /// Render the map into the target format.
    fn render(&self, vars: &SecretMap) -> Result<String>;

    /// The name used for `--format` selection.
    fn name(&self) -> &str;
}

/// Looks up an exporter by format name.
pub fn exporter_for(format: &str) -> Result<Box<dyn Exporter>> {
    match format {
        "shell" => Ok(Box::new(shell::ShellExporter)),
        "json" => Ok(Box::new(json::JsonExporter)),
        "yaml" => Ok(Box::new(yaml::YamlExporter)),
        other => Err(Error::Input(format!(
            "unknown export format '{other}' (expected shell, json, or yaml)"
        ))),
    }
}
