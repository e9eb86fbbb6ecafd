use anyhow::{bail, Context, Result};
use sweeble_core::constants::CURSOR_MARKER;

/// Parse `LINE:COL`, both 1-based.
pub fn parse_line_col(s: &str) -> Result<(usize, usize)> {
    let (line, col) = s.split_once(':').context("expected LINE:COL")?;
    let line: usize = line.trim().parse().context("invalid line")?;
    let col: usize = col.trim().parse().context("invalid column")?;
    if line == 0 || col == 0 {
        bail!("line and column start at 1");
    }
    Ok((line, col))
}

/// Decide the cursor for `raw` file contents.
///
/// An embedded cursor marker is removed and, unless an explicit position is given,
/// marks the cursor. Without either the cursor goes to the end of the text.
/// Returns the text to edit and the cursor as a character offset into it.
pub fn place_cursor(raw: &str, offset: Option<usize>, at: Option<(usize, usize)>) -> Result<(String, usize)> {
    let (text, marker) = match raw.find(CURSOR_MARKER) {
        Some(byte) => {
            let mut text = String::with_capacity(raw.len() - CURSOR_MARKER.len());
            text.push_str(&raw[..byte]);
            text.push_str(&raw[byte + CURSOR_MARKER.len()..]);
            (text, Some(raw[..byte].chars().count()))
        }
        None => (raw.to_string(), None),
    };
    let len = text.chars().count();

    let cursor = if let Some(offset) = offset {
        if offset > len {
            bail!("offset {} is past the end of the file ({} characters)", offset, len);
        }
        offset
    } else if let Some((line, col)) = at {
        line_col_offset(&text, line, col)?
    } else {
        marker.unwrap_or(len)
    };
    Ok((text, cursor))
}

fn line_col_offset(text: &str, line: usize, col: usize) -> Result<usize> {
    let mut start = 0;
    for (index, content) in text.split('\n').enumerate() {
        let width = content.chars().count();
        if index + 1 == line {
            if col - 1 > width {
                bail!("column {} is past the end of line {} ({} characters)", col, line, width);
            }
            return Ok(start + col - 1);
        }
        start += width + 1;
    }
    bail!("line {} is past the end of the file", line)
}
