//! POSIX shell `export` lines.

use crate::core::error::Result;
use crate::core::secret::SecretMap;
use crate::formats::Exporter;

pub struct ShellExporter;

impl Exporter for ShellExporter {
    fn render(&self, vars: &SecretMap) -> Result<String> {
        let mut out = String::new();
        for (key, value) in vars.iter() {
            out.push_str("export ");
            out.push_str(key);
            out.push_str("='");
            out.push_str(&single_quote(&value.to_string_lossy()));
            out.push_str("'\n");
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "shell"
    }
}

/// Embeds a value in single quotes: `'` becomes `'\''`.
fn single_quote(value: &str) -> String {
    value.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::secret::SecretBuffer;

    fn map(pairs: &[(&str, &str)]) -> SecretMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), SecretBuffer::new(*v)))
            .collect()
    }

    #[test]
    fn test_sorted_export_lines() {
        let vars = map(&[("PORT", "8080"), ("DATABASE_URL", "postgres://localhost/x")]);
        let out = ShellExporter.render(&vars).unwrap();
        assert_eq!(
            out,
            "export DATABASE_URL='postgres://localhost/x'\nexport PORT='8080'\n"
        );
    }

    #[test]
    fn test_single_quotes_escaped() {
        let vars = map(&[("MSG", "it's fine")]);
        let out = ShellExporter.render(&vars).unwrap();
        assert_eq!(out, "export MSG='it'\\''s fine'\n");
    }

    #[test]
    fn test_empty_map_renders_nothing() {
        assert_eq!(ShellExporter.render(&SecretMap::new()).unwrap(), "");
    }
}
