//! YAML key-value format.

use std::collections::BTreeMap;

use crate::core::error::{Error, Result};
use crate::core::secret::SecretMap;
use crate::formats::Exporter;

pub struct YamlExporter;

impl Exporter for YamlExporter {
    fn render(&self, vars: &SecretMap) -> Result<String> {
        let ordered: BTreeMap<&str, String> = vars
            .iter()
            .map(|(k, v)| (k, v.to_string_lossy()))
            .collect();
        serde_yaml::to_string(&ordered)
            .map_err(|e| Error::operation("YAML rendering", "export", e))
    }

    fn name(&self) -> &str {
        "yaml"
    }
}
