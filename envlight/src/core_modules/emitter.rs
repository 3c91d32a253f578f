// THEORY:
// The emitter is the last stage: it writes the projected lights as a JSON array, one
// object per line, in the order the merger produced them. Each object is serialized by
// serde; only the array framing is written by hand so the document stays line-oriented
// and diff-friendly.

use crate::core_modules::projection::EmittedLight;
use crate::error::{ExtractError, Result};
use std::io::Write;

/// Writes `lights` to `out`. An empty list is written as `[]`.
pub fn write_lights<W: Write>(lights: &[EmittedLight], out: &mut W) -> Result<()> {
    if lights.is_empty() {
        out.write_all(b"[]\n")?;
        return Ok(());
    }

    out.write_all(b"[\n")?;
    for (i, light) in lights.iter().enumerate() {
        if i > 0 {
            out.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut *out, light).map_err(|e| ExtractError::Write(e.into()))?;
    }
    out.write_all(b"\n]\n")?;
    Ok(())
}

/// Renders `lights` to an in-memory JSON document.
pub fn to_json_string(lights: &[EmittedLight]) -> Result<String> {
    let mut buffer = Vec::new();
    write_lights(lights, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExtractError::Write(std::io::Error::other(e)))
}
