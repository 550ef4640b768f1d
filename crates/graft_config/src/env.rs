//! `${VAR}` environment interpolation over raw configuration text.

use regex::Regex;

use crate::error::ConfigError;

/// `${NAME}` or `${NAME:default}`.
const REFERENCE: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}";

/// Replaces every `${NAME}` or `${NAME:default}` in `content`.
///
/// `lookup` resolves variable names. An unresolved variable without a
/// default is an error. Text that is not a well-formed reference (for
/// example a lone `$`) is copied through unchanged.
pub fn interpolate(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(REFERENCE).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for caps in re.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&content[last..whole.start()]);
        match (lookup(name.as_str()), caps.get(2)) {
            (Some(value), _) => out.push_str(&value),
            (None, Some(default)) => out.push_str(default.as_str()),
            (None, None) => {
                return Err(ConfigError::UndefinedVariable(name.as_str().to_string()))
            }
        }
        last = whole.end();
    }

    out.push_str(&content[last..]);
    Ok(out)
}
