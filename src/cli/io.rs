//! JSON I/O handling for the CLI
//!
//! - Input: a single JSON object
//! - Output: a single JSON object per line
//!
//! The `*_from` / `*_to` variants take explicit streams; the plain ones
//! bind stdin and stdout.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    read_request_from(io::stdin().lock())
}

/// Read a JSON request from the first non-empty line of `input`
pub fn read_request_from(input: impl BufRead) -> CliResult<Value> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        return Ok(serde_json::from_str(&line)?);
    }
    Err(CliError::io_error("Empty input"))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_response_to(&mut io::stdout().lock(), data)
}

pub fn write_response_to(out: &mut impl Write, data: Value) -> CliResult<()> {
    write_line(out, &json!({"status": "ok", "data": data}))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, field: Option<&str>) -> CliResult<()> {
    write_error_to(&mut io::stdout().lock(), code, message, field)
}

pub fn write_error_to(
    out: &mut impl Write,
    code: &str,
    message: &str,
    field: Option<&str>,
) -> CliResult<()> {
    let mut response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let Some(field) = field {
        response["field"] = json!(field);
    }
    write_line(out, &response)
}

fn write_line(out: &mut impl Write, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
