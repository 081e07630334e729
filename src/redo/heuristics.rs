//! Display heuristics for opaque payload bytes.
//!
//! Most record payloads are raw row bytes whose true layout needs index
//! metadata the redo log does not carry. These helpers make such bytes
//! legible anyway: [`readable_strings`] pulls out printable ASCII runs, and
//! [`split_fields`] walks the bytes guessing a plausible column split
//! (length-prefixed string, big-endian integer, tiny integer, hex tail).
//!
//! Both are strictly display-level. They never influence record lengths,
//! byte consumption, or grouping, and callers can skip them entirely.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

/// Minimum printable-run length worth reporting.
const MIN_RUN: usize = 3;
/// Runs longer than this are truncated with an ellipsis.
const MAX_RUN_DISPLAY: usize = 30;
/// Longest length prefix considered for a guessed varchar.
const MAX_VARCHAR_LEN: u8 = 100;
/// Upper bound for a "plausible" 4-byte integer (IDs, counters).
const MAX_PLAUSIBLE_INT: u32 = 100_000;
/// Upper bound for a guessed tiny integer (enums, flags).
const MAX_PLAUSIBLE_TINYINT: u8 = 200;
/// Safety cap on the positional walk.
const MAX_GUESSED_FIELDS: usize = 16;

/// Extract printable ASCII runs of length >= 3, joined by `|`.
///
/// Runs longer than 30 characters are truncated with `...`. Returns `None`
/// when the data contains no qualifying run.
///
/// # Examples
///
/// ```
/// use redoscope::redo::heuristics::readable_strings;
///
/// let data = b"\x01\x02alice\x00\x00bob-smith\xff";
/// assert_eq!(readable_strings(data).unwrap(), "alice|bob-smith");
/// assert_eq!(readable_strings(&[0x01, 0x02, 0x03]), None);
/// ```
pub fn readable_strings(data: &[u8]) -> Option<String> {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();

    for &b in data {
        if (32..=126).contains(&b) {
            current.push(b as char);
        } else {
            if current.len() >= MIN_RUN {
                runs.push(truncate_run(&current));
            }
            current.clear();
        }
    }
    if current.len() >= MIN_RUN {
        runs.push(truncate_run(&current));
    }

    if runs.is_empty() {
        None
    } else {
        Some(runs.join("|"))
    }
}

fn truncate_run(run: &str) -> String {
    if run.len() > MAX_RUN_DISPLAY {
        format!("{}...", &run[..MAX_RUN_DISPLAY])
    } else {
        run.to_string()
    }
}

/// A guessed field from the positional walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuessedField {
    /// Slot annotation: `field_N_{varchar|int|tinyint|hex}`.
    pub label: String,
    /// Rendered value.
    pub value: String,
}

/// Walk opaque bytes guessing a typed column split.
///
/// Per slot, in order of preference: a 1-byte length prefix (<= 100)
/// followed by that many mostly-printable bytes becomes a varchar; a
/// big-endian u32 in a plausible range becomes an int; a small single byte
/// becomes a tinyint; anything else ends the walk with the leading 8 bytes
/// as hex.
pub fn split_fields(data: &[u8]) -> Vec<GuessedField> {
    let mut fields = Vec::new();
    let mut offset = 0;

    while offset < data.len() && fields.len() < MAX_GUESSED_FIELDS {
        let rest = &data[offset..];
        let n = fields.len();

        if let Some((text, used)) = try_varchar(rest) {
            fields.push(GuessedField {
                label: format!("field_{}_varchar", n),
                value: format!("'{}'", text),
            });
            offset += used;
            continue;
        }

        if rest.len() >= 4 {
            let v = BigEndian::read_u32(&rest[..4]);
            if v > 0 && v < MAX_PLAUSIBLE_INT {
                fields.push(GuessedField {
                    label: format!("field_{}_int", n),
                    value: v.to_string(),
                });
                offset += 4;
                continue;
            }
        }

        if rest[0] > 0 && rest[0] < MAX_PLAUSIBLE_TINYINT {
            fields.push(GuessedField {
                label: format!("field_{}_tinyint", n),
                value: rest[0].to_string(),
            });
            offset += 1;
            continue;
        }

        // No guess fits; show the leading bytes and stop.
        let tail = &rest[..rest.len().min(8)];
        fields.push(GuessedField {
            label: format!("field_{}_hex", n),
            value: tail.iter().map(|b| format!("{:02x}", b)).collect(),
        });
        break;
    }

    fields
}

fn try_varchar(data: &[u8]) -> Option<(String, usize)> {
    let len = *data.first()? as usize;
    if len == 0 || len > MAX_VARCHAR_LEN as usize || data.len() < len + 1 {
        return None;
    }
    let candidate = &data[1..len + 1];
    if !is_meaningful(candidate) {
        return None;
    }
    let text: String = candidate
        .iter()
        .map(|&b| {
            if (32..=126).contains(&b) {
                b as char
            } else {
                '?'
            }
        })
        .collect();
    Some((text, len + 1))
}

/// At least 70% printable and at least two bytes long.
fn is_meaningful(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    let printable = data.iter().filter(|b| (32..=126).contains(*b)).count();
    printable * 10 >= data.len() * 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readable_strings_runs() {
        assert_eq!(
            readable_strings(b"\x00abc\x01defg\x02").unwrap(),
            "abc|defg"
        );
        // Two-character runs are noise.
        assert_eq!(readable_strings(b"\x00ab\x01cd\x02"), None);
        assert_eq!(readable_strings(&[]), None);
    }

    #[test]
    fn test_readable_strings_truncates_long_runs() {
        let data: Vec<u8> = std::iter::repeat(b'x').take(40).collect();
        let out = readable_strings(&data).unwrap();
        assert_eq!(out, format!("{}...", "x".repeat(30)));
    }

    #[test]
    fn test_readable_strings_run_at_end() {
        assert_eq!(readable_strings(b"\x00\x01commit").unwrap(), "commit");
    }

    #[test]
    fn test_split_fields_varchar() {
        let mut data = vec![5u8];
        data.extend_from_slice(b"alice");
        let fields = split_fields(&data);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label, "field_0_varchar");
        assert_eq!(fields[0].value, "'alice'");
    }

    #[test]
    fn test_split_fields_int_then_tinyint() {
        // 0x00000539 = 1337 (plausible int), then 7 (tinyint).
        let data = [0x00, 0x00, 0x05, 0x39, 0x07];
        let fields = split_fields(&data);
        assert_eq!(fields[0].label, "field_0_int");
        assert_eq!(fields[0].value, "1337");
        assert_eq!(fields[1].label, "field_1_tinyint");
        assert_eq!(fields[1].value, "7");
    }

    #[test]
    fn test_split_fields_hex_fallback_stops_walk() {
        // 0xFFFFFFFF is not a plausible int, 0xFF not a tinyint.
        let data = [0xFF; 12];
        let fields = split_fields(&data);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label, "field_0_hex");
        assert_eq!(fields[0].value, "ffffffffffffffff");
    }

    #[test]
    fn test_split_fields_varchar_needs_meaningful_bytes() {
        // Length prefix 4 followed by non-printable bytes: not a varchar.
        // 0x04 is a valid tinyint guess instead.
        let data = [0x04, 0x00, 0x01, 0x02, 0x03];
        let fields = split_fields(&data);
        assert_eq!(fields[0].label, "field_0_tinyint");
    }

    #[test]
    fn test_split_fields_empty() {
        assert!(split_fields(&[]).is_empty());
    }
}
