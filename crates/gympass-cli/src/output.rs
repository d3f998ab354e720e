//! Printing command replies.
//!
//! User-facing output uses writeln! to stdout; logs go to stderr.

use std::io::{self, Write};

use serde::Serialize;

use gympass_core::commands::{CommandResult, Reply};

/// Print a reply's message, or the whole reply as JSON.
pub fn emit<T: Serialize>(json: bool, result: CommandResult<T>) -> anyhow::Result<()> {
    emit_with(json, result, |_| Vec::new())
}

/// Like [`emit`], with one line per row after the message.
pub fn emit_rows<T: Serialize>(
    json: bool,
    result: CommandResult<Vec<T>>,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    emit_with(json, result, |rows| rows.iter().map(&row).collect())
}

/// Like [`emit`], with the extra lines produced by `lines`.
pub fn emit_with<T: Serialize>(
    json: bool,
    result: CommandResult<T>,
    lines: impl Fn(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    let reply = result.map_err(anyhow::Error::msg)?;
    write_reply(&mut io::stdout().lock(), json, &reply, lines)
}

fn write_reply<T: Serialize>(
    out: &mut impl Write,
    json: bool,
    reply: &Reply<T>,
    rows: impl Fn(&T) -> Vec<String>,
) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(reply)?)?;
        return Ok(());
    }

    writeln!(out, "{}", reply.message)?;
    for line in rows(&reply.data) {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}
