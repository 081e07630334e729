use std::io::Write;

use colored::Colorize;

use crate::cli::wprintln;
use crate::redo::analysis::{analyze_file, MAX_RECORDS};
use crate::redo::format::LogFormat;
use crate::redo::heuristics::readable_strings;
use crate::RedoError;

pub struct SearchOptions {
    pub file: String,
    pub text: String,
    pub format: LogFormat,
}

pub fn execute(opts: &SearchOptions, writer: &mut dyn Write) -> Result<(), RedoError> {
    if opts.text.is_empty() {
        return Err(RedoError::Argument("Search text must not be empty".into()));
    }

    let analysis = analyze_file(&opts.file, opts.format, MAX_RECORDS)?;
    let needle = opts.text.as_bytes();

    wprintln!(
        writer,
        "{} {:?} in {} ({} records)",
        "Searching for".bold(),
        opts.text,
        opts.file,
        analysis.records.len()
    )?;
    wprintln!(writer)?;

    let mut hits = 0usize;
    for (i, rec) in analysis.records.iter().enumerate() {
        let Some(bytes) = rec.payload_bytes() else {
            continue;
        };
        if !contains(bytes, needle) {
            continue;
        }
        hits += 1;
        wprintln!(
            writer,
            "  record {:>6}  lsn={:<12} {:<38} group={}",
            i + 1,
            rec.start_lsn,
            rec.kind.to_string(),
            rec.group_id
        )?;
        if let Some(strings) = readable_strings(bytes) {
            wprintln!(writer, "    strings: {}", strings.green())?;
        }
    }

    wprintln!(writer)?;
    if hits == 0 {
        wprintln!(writer, "No payload contains {:?}", opts.text)?;
    } else {
        wprintln!(writer, "{} matching records", hits)?;
    }
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        assert!(contains(b"sample insert data", b"insert"));
        assert!(!contains(b"sample", b"insert"));
        assert!(contains(b"abc", b"abc"));
        assert!(!contains(b"ab", b"abc"));
    }
}
