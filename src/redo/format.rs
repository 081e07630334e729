//! Log file format detection.
//!
//! Two on-disk layouts reach the analyzer: real MySQL redo logs
//! (block-structured, with the 2048-byte dual-checkpoint header) and the
//! flat fixture files the test harness produces. Real captures are
//! megabytes at minimum while fixtures stay tiny, so auto-detection keys on
//! a 1 MB size threshold. The choice can also be forced explicitly.

use serde::Serialize;

use crate::RedoError;

/// File size above which auto-detection assumes the MySQL block format.
pub const MYSQL_SIZE_THRESHOLD: u64 = 1_000_000;

/// Which reader to use for a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// MySQL block-structured redo log.
    Mysql,
    /// Flat fixture format from the synthetic test harness.
    Fixture,
    /// Decide by file size.
    Auto,
}

impl LogFormat {
    /// Resolve `Auto` against a concrete file size.
    pub fn resolve(self, file_size: u64) -> ResolvedFormat {
        match self {
            LogFormat::Mysql => ResolvedFormat::Mysql,
            LogFormat::Fixture => ResolvedFormat::Fixture,
            LogFormat::Auto => {
                if file_size > MYSQL_SIZE_THRESHOLD {
                    ResolvedFormat::Mysql
                } else {
                    ResolvedFormat::Fixture
                }
            }
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = RedoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(LogFormat::Mysql),
            "fixture" => Ok(LogFormat::Fixture),
            "auto" => Ok(LogFormat::Auto),
            other => Err(RedoError::Argument(format!(
                "Unknown log format '{}' (expected mysql, fixture, or auto)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogFormat::Mysql => "mysql",
            LogFormat::Fixture => "fixture",
            LogFormat::Auto => "auto",
        };
        write!(f, "{}", s)
    }
}

/// A format decision with `Auto` resolved away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedFormat {
    Mysql,
    Fixture,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_threshold() {
        assert_eq!(LogFormat::Auto.resolve(303), ResolvedFormat::Fixture);
        assert_eq!(LogFormat::Auto.resolve(1_000_000), ResolvedFormat::Fixture);
        assert_eq!(LogFormat::Auto.resolve(1_000_001), ResolvedFormat::Mysql);
        assert_eq!(LogFormat::Auto.resolve(3_300_000), ResolvedFormat::Mysql);
    }

    #[test]
    fn test_explicit_formats_ignore_size() {
        assert_eq!(LogFormat::Mysql.resolve(100), ResolvedFormat::Mysql);
        assert_eq!(LogFormat::Fixture.resolve(50_000_000), ResolvedFormat::Fixture);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("mysql".parse::<LogFormat>().unwrap(), LogFormat::Mysql);
        assert_eq!("fixture".parse::<LogFormat>().unwrap(), LogFormat::Fixture);
        assert_eq!("auto".parse::<LogFormat>().unwrap(), LogFormat::Auto);
        assert!("innodb".parse::<LogFormat>().is_err());
    }
}
