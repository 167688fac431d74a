//! Template substitution backed by a decrypted environment map.
//!
//! With both delimiters supplied, the single pattern is
//! `left ⟨ws⟩ NAME ⟨ws⟩ right`. With neither, `${NAME}` is tried first and
//! then `$NAME`. In strict mode the names of unresolved variables are
//! collected and the whole operation fails after the full pass; otherwise
//! unresolved matches are left verbatim.

use std::collections::BTreeSet;

use regex::{Captures, Regex};
use zeroize::Zeroize;

use crate::core::error::{Error, Result};
use crate::core::secret::SecretMap;

const NAME_PATTERN: &str = "[A-Za-z_][A-Za-z0-9_]*";

/// Substitution options.
#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    pub left_delimiter: Option<String>,
    pub right_delimiter: Option<String>,
    pub strict: bool,
}

/// Applies `vars` to `template`, returning the substituted text.
///
/// Substitution is a single pass over the template, so substituted values
/// are never re-scanned for further matches.
pub fn apply(template: &str, vars: &SecretMap, options: &TemplateOptions) -> Result<String> {
    let pattern = build_pattern(options)?;
    let mut missing: BTreeSet<String> = BTreeSet::new();

    let substituted = pattern.replace_all(template, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match vars.get(name) {
            Some(value) => value.to_string_lossy(),
            None => {
                missing.insert(name.to_string());
                caps[0].to_string()
            }
        }
    });
    let mut output = substituted.into_owned();

    if options.strict && !missing.is_empty() {
        output.zeroize();
        let names: Vec<String> = missing.into_iter().collect();
        return Err(Error::Input(format!(
            "missing variables: {}",
            names.join(", ")
        )));
    }

    Ok(output)
}

fn build_pattern(options: &TemplateOptions) -> Result<Regex> {
    match (&options.left_delimiter, &options.right_delimiter) {
        (Some(left), Some(right)) => {
            if left.is_empty() || right.is_empty() {
                return Err(Error::validation("delimiter", "must not be empty"));
            }
            let pattern = format!(
                r"{}\s*({NAME_PATTERN})\s*{}",
                regex::escape(left),
                regex::escape(right)
            );
            Regex::new(&pattern)
                .map_err(|e| Error::Input(format!("cannot build delimiter pattern: {e}")))
        }
        // ${NAME} first (no whitespace inside the braces), then bare $NAME.
        (None, None) => Ok(Regex::new(&format!(
            r"\$\{{({NAME_PATTERN})\}}|\$({NAME_PATTERN})"
        ))
        .unwrap()),
        _ => Err(Error::validation(
            "delimiter",
            "supply both --left-delimiter and --right-delimiter or neither",
        )),
    }
}
