//! Environment-variable substitution on raw input lines.

use crate::env::Environment;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Upper bound on substitution passes for a single line.
pub const MAX_EXPANSION_PASSES: usize = 64;

/// Expansion stops growing a line beyond this many bytes.
pub const MAX_EXPANDED_LEN: usize = 64 * 1024;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z0-9_]+)\}|([A-Za-z0-9_]+))").expect("valid reference pattern")
});

fn reference_name<'h>(caps: &Captures<'h>) -> &'h str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Replace `$NAME` and `${NAME}` references with their values.
///
/// Each pass takes the leftmost reference and substitutes every reference to
/// that same name. Values may contain further references, so passes repeat
/// until none remain. Unset variables expand to the empty string.
///
/// Self-referencing values cannot loop forever: expansion also stops at a
/// fixed point, after [`MAX_EXPANSION_PASSES`] passes, or once the line
/// exceeds [`MAX_EXPANDED_LEN`] bytes. In those cases the partially expanded
/// line is returned as is.
pub fn expand(line: &str, env: &Environment) -> String {
    let mut current = line.to_owned();

    for _ in 0..MAX_EXPANSION_PASSES {
        let Some(name) = REFERENCE
            .captures(&current)
            .map(|caps| reference_name(&caps).to_owned())
        else {
            return current;
        };

        let value = env.get_var(&name).unwrap_or_default();
        let next = REFERENCE
            .replace_all(&current, |caps: &Captures| {
                if reference_name(caps) == name {
                    value.to_owned()
                } else {
                    caps[0].to_owned()
                }
            })
            .into_owned();

        if next == current {
            tracing::warn!(variable = %name, "variable expands to itself, stopping expansion");
            return current;
        }
        if next.len() > MAX_EXPANDED_LEN {
            tracing::warn!(variable = %name, len = next.len(), "expanded line too long, stopping expansion");
            return next;
        }
        current = next;
    }

    if REFERENCE.is_match(&current) {
        tracing::warn!(passes = MAX_EXPANSION_PASSES, "expansion pass limit reached");
    }
    current
}
