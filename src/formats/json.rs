//! Generic JSON key-value format.

use serde_json::{Map, Value};

use crate::core::error::{Error, Result};
use crate::core::secret::SecretMap;
use crate::formats::Exporter;

pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn render(&self, vars: &SecretMap) -> Result<String> {
        // serde_json::Map preserves insertion order, which is already
        // lexicographic coming out of the SecretMap.
        let mut object = Map::new();
        for (key, value) in vars.iter() {
            object.insert(key.to_string(), Value::String(value.to_string_lossy()));
        }
        serde_json::to_string_pretty(&Value::Object(object))
            .map_err(|e| Error::operation("JSON rendering", "export", e))
    }

    fn name(&self) -> &str {
        "json"
    }
}
