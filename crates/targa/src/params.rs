//! `?` placeholder substitution for the MySQL text protocol.
//!
//! The driver takes complete SQL text, so parameters are rendered as escaped
//! literals before the statement is sent.

use targa_core::{Error, Result, Value};

/// Replace every `?` placeholder in `sql` with the escaped literal of the
/// matching parameter, in order.
///
/// Placeholders inside `'...'`, `"..."` and `` `...` `` sections are left
/// alone. The number of placeholders must equal the number of parameters.
#[allow(clippy::result_large_err)]
pub fn substitute(sql: &str, params: &[Value]) -> Result<String> {
    let positions = placeholder_positions(sql);
    if positions.len() != params.len() {
        return Err(Error::Params {
            expected: positions.len(),
            provided: params.len(),
        });
    }
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let mut result = String::with_capacity(sql.len() + params.len() * 16);
    let mut last = 0;
    for (pos, param) in positions.into_iter().zip(params) {
        result.push_str(&sql[last..pos]);
        result.push_str(&format_value(param));
        last = pos + 1;
    }
    result.push_str(&sql[last..]);
    Ok(result)
}

/// Count the `?` placeholders outside quoted sections.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}

/// Byte offsets of `?` placeholders outside quoted sections.
fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match quote {
            None => match ch {
                '?' => positions.push(i),
                '\'' | '"' | '`' => quote = Some(ch),
                _ => {}
            },
            Some(q) => {
                if ch == '\\' && q != '`' {
                    // Backslash escapes the next character inside string literals.
                    chars.next();
                } else if ch == q {
                    // A doubled quote is an escaped quote, not the end.
                    if chars.peek().is_some_and(|&(_, next)| next == q) {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
        }
    }

    positions
}

/// Escape a string for use in MySQL text protocol.
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => result.push_str("''"),
            '\\' => result.push_str("\\\\"),
            '\0' => result.push_str("\\0"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\x1a' => result.push_str("\\Z"),
            _ => result.push(ch),
        }
    }
    result.push('\'');
    result
}

/// Render bytes as a hex literal (`X'0A1B'`).
pub fn escape_bytes(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut result = String::with_capacity(data.len() * 2 + 3);
    result.push_str("X'");
    for byte in data {
        let _ = write!(result, "{byte:02X}");
    }
    result.push('\'');
    result
}

fn format_float(f: f64) -> String {
    if f.is_finite() {
        f.to_string()
    } else {
        // MySQL has no NaN or infinity.
        "NULL".to_string()
    }
}

fn is_numeric_literal(s: &str) -> bool {
    !s.is_empty()
        && s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Render a value as a SQL literal.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::Float(f) => format_float(f64::from(*f)),
        Value::Double(f) => format_float(*f),
        Value::Decimal(s) if is_numeric_literal(s) => s.clone(),
        Value::Decimal(s) | Value::Text(s) => escape_string(s),
        Value::Bytes(b) => escape_bytes(b),
        Value::Json(j) => escape_string(&j.to_string()),
    }
}
