//! Trace-file loader.
//!
//! This module parses the plain-text traces the CLI feeds to each core. It performs:
//! 1. **Line parsing:** One operation per line, `#` comments and blanks ignored.
//! 2. **Two formats:** Mnemonic (`ld 0x1000`, `st 0x1000 42`) and the numeric
//!    form used by classic trace corpora (`0 0x1000`, `1 0x1000 42`).
//! 3. **Per-core discovery:** `core<i>.trace` files in a directory, one per core;
//!    a missing file yields an empty trace.

use std::fs;
use std::io;
use std::path::Path;

use crate::core::{MemOp, OpKind};

fn parse_error(path: &Path, line_no: usize, msg: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}:{}: {}", path.display(), line_no, msg),
    )
}

fn parse_addr(token: &str) -> Option<u32> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        token.parse().ok()
    }
}

/// Parses one trace file into a core's operation list.
///
/// # Errors
///
/// Returns an `InvalidData` error naming the file and line for any malformed
/// entry, or the underlying I/O error if the file cannot be read.
pub fn load_trace(path: &Path) -> io::Result<Vec<MemOp>> {
    let text = fs::read_to_string(path)?;
    let mut ops = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let op_token = tokens.next().unwrap_or("");
        let kind = match op_token {
            "ld" | "0" => OpKind::Load,
            "st" | "1" => OpKind::Store,
            other => {
                return Err(parse_error(
                    path,
                    line_no,
                    &format!("unknown operation '{}'", other),
                ));
            }
        };

        let addr = tokens
            .next()
            .and_then(parse_addr)
            .ok_or_else(|| parse_error(path, line_no, "missing or malformed address"))?;

        let data = match (kind, tokens.next()) {
            (OpKind::Store, Some(token)) => token
                .parse()
                .map_err(|_| parse_error(path, line_no, "malformed store value"))?,
            (OpKind::Store, None) => 0,
            (OpKind::Load, Some(_)) => {
                return Err(parse_error(path, line_no, "load takes no value"));
            }
            (OpKind::Load, None) => 0,
        };

        if tokens.next().is_some() {
            return Err(parse_error(path, line_no, "trailing tokens"));
        }

        ops.push(MemOp { kind, addr, data });
    }
    Ok(ops)
}

/// Loads `core<i>.trace` for each core from `dir`.
///
/// A core whose trace file does not exist gets an empty trace; malformed
/// files are errors.
pub fn load_core_traces(dir: &Path, num_cores: usize) -> io::Result<Vec<Vec<MemOp>>> {
    let mut traces = Vec::with_capacity(num_cores);
    for i in 0..num_cores {
        let path = dir.join(format!("core{}.trace", i));
        if path.exists() {
            traces.push(load_trace(&path)?);
        } else {
            log::debug!("no trace file for core {} ({})", i, path.display());
            traces.push(Vec::new());
        }
    }
    Ok(traces)
}
