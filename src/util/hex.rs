//! Hex formatting helpers for payload display.

/// Format a u32 as hex with 0x prefix (checksums, values).
pub fn format_hex32(value: u32) -> String {
    format!("0x{:08x}", value)
}

/// Format bytes as a compact hex string (e.g., "4a2f00ff").
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Produce a hex dump of `data` with 16 bytes per line, an offset column
/// starting at `base_offset`, and an ASCII sidebar:
///
/// ```text
/// 00000000  xx xx xx xx xx xx xx xx  xx xx xx xx xx xx xx xx  |................|
/// ```
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut lines = Vec::with_capacity(data.len().div_ceil(16));

    for (i, chunk) in data.chunks(16).enumerate() {
        let mut line = format!("{:08x}  ", base_offset + (i * 16) as u64);

        for col in 0..16 {
            if col == 8 {
                line.push(' ');
            }
            match chunk.get(col) {
                Some(b) => line.push_str(&format!("{:02x} ", b)),
                None => line.push_str("   "),
            }
        }

        line.push_str(" |");
        for &b in chunk {
            line.push(if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            });
        }
        for _ in chunk.len()..16 {
            line.push(' ');
        }
        line.push('|');

        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(&[0x4a, 0x2f, 0x00, 0xff]), "4a2f00ff");
        assert_eq!(format_bytes(&[]), "");
    }

    #[test]
    fn test_format_hex32() {
        assert_eq!(format_hex32(0xCAFE), "0x0000cafe");
    }

    #[test]
    fn test_hex_dump_full_line() {
        let data: Vec<u8> = (0..16).collect();
        let out = hex_dump(&data, 0);
        assert!(out.starts_with("00000000  "));
        assert!(out.contains("00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f"));
    }

    #[test]
    fn test_hex_dump_partial_line_and_offset() {
        let out = hex_dump(b"Hello", 0x200);
        assert!(out.starts_with("00000200  "));
        assert!(out.contains("48 65 6c 6c 6f"));
        assert!(out.contains("|Hello"));
    }

    #[test]
    fn test_hex_dump_nonprintable_sidebar() {
        let out = hex_dump(&[0x00, 0x07, 0x7f, 0xff], 0);
        assert!(out.contains("|...."));
    }
}
