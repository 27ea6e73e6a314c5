//! Parsing of numeric lists given on the command line or stdin.

use std::io::Read;

use anyhow::{anyhow, bail, Context, Result};

/// Split on commas and/or whitespace and parse every token as a number.
///
/// Only the shape is checked here; finiteness is left to the engine.
pub fn parse_values(raw: &str) -> Result<Vec<f64>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .enumerate()
        .map(|(i, tok)| {
            tok.parse::<f64>()
                .map_err(|_| anyhow!("malformed sample: value {i} ({tok:?}) is not a number"))
        })
        .collect()
}

/// Parse `name=1,2,3` into a named sample.
pub fn parse_named(raw: &str) -> Result<(String, Vec<f64>)> {
    let (name, values) = raw
        .split_once('=')
        .with_context(|| format!("expected NAME=VALUES, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("variable name is empty in {raw:?}");
    }
    let values = parse_values(values).with_context(|| format!("variable {name}"))?;
    Ok((name.to_string(), values))
}

/// Use the argument if given, otherwise read the whole of stdin.
pub fn values_or_stdin(arg: Option<String>) -> Result<Vec<f64>> {
    let raw = match arg {
        Some(s) => s,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read values from stdin")?;
            buf
        }
    };
    parse_values(&raw)
}
