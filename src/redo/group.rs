//! Mini-transaction grouping.
//!
//! InnoDB applies redo records in atomic groups (mini-transactions, MTRs)
//! delimited on the wire by an `MLOG_MULTI_REC_END` marker. This module is
//! the post-pass that partitions a decoded record sequence along those
//! markers: every record between the first record after a group boundary and
//! the next marker, inclusive, gets the same group ID, with start/end flags
//! on the run's first record and on the marker.
//!
//! The grouping is conservative: records trailing the last marker keep group
//! 0 (single records with no enclosing group), and an orphan marker with no
//! preceding records is preserved at group 0 rather than dropped.

use crate::redo::record::LogRecord;

/// Assign group IDs and boundary flags in place. Returns the number of
/// groups formed.
pub fn assign_groups(records: &mut [LogRecord]) -> u32 {
    let mut next_group_id = 0u32;
    let mut group_start: Option<usize> = None;

    for i in 0..records.len() {
        if records[i].kind.is_multi_rec_end() {
            match group_start.take() {
                Some(start) => {
                    next_group_id += 1;
                    for rec in &mut records[start..=i] {
                        rec.group_id = next_group_id;
                    }
                    records[start].is_group_start = true;
                    records[i].is_group_end = true;
                }
                None => {
                    // Orphan end marker; keep it, ungrouped.
                    records[i].group_id = 0;
                }
            }
        } else if group_start.is_none() {
            group_start = Some(i);
        }
    }

    // Records after the last marker are single records.
    if let Some(start) = group_start {
        for rec in &mut records[start..] {
            rec.group_id = 0;
        }
    }

    next_group_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redo::mlog::MlogType;
    use crate::redo::record::RecordKind;

    fn record(code: u8, lsn: u64) -> LogRecord {
        LogRecord::new(RecordKind::Mlog(MlogType::from_u8(code)), lsn)
    }

    fn sequence(codes: &[u8]) -> Vec<LogRecord> {
        codes
            .iter()
            .enumerate()
            .map(|(i, &c)| record(c, 1000 + i as u64))
            .collect()
    }

    #[test]
    fn test_two_groups() {
        // 1BYTE, 2BYTES, END | 4BYTES, REC_INSERT_8027, END
        let mut records = sequence(&[1, 2, 31, 4, 9, 31]);
        let groups = assign_groups(&mut records);
        assert_eq!(groups, 2);

        for rec in &records[0..3] {
            assert_eq!(rec.group_id, 1);
        }
        for rec in &records[3..6] {
            assert_eq!(rec.group_id, 2);
        }

        assert!(records[0].is_group_start);
        assert!(records[2].is_group_end);
        assert!(records[3].is_group_start);
        assert!(records[5].is_group_end);

        // Exactly one start and one end per group.
        assert_eq!(records.iter().filter(|r| r.is_group_start).count(), 2);
        assert_eq!(records.iter().filter(|r| r.is_group_end).count(), 2);
    }

    #[test]
    fn test_groups_are_contiguous_runs() {
        let mut records = sequence(&[1, 1, 1, 31, 2, 31, 4]);
        assign_groups(&mut records);

        let ids: Vec<u32> = records.iter().map(|r| r.group_id).collect();
        assert_eq!(ids, vec![1, 1, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn test_trailing_records_stay_ungrouped() {
        let mut records = sequence(&[1, 31, 2, 4, 8]);
        let groups = assign_groups(&mut records);
        assert_eq!(groups, 1);
        assert_eq!(records[2].group_id, 0);
        assert_eq!(records[3].group_id, 0);
        assert_eq!(records[4].group_id, 0);
        assert!(!records[2].is_group_start);
    }

    #[test]
    fn test_orphan_end_marker_preserved() {
        let mut records = sequence(&[31, 1, 2, 31]);
        let groups = assign_groups(&mut records);
        assert_eq!(groups, 1);

        // The leading marker closes nothing and stays at group 0.
        assert_eq!(records[0].group_id, 0);
        assert!(!records[0].is_group_end);

        assert_eq!(records[1].group_id, 1);
        assert!(records[1].is_group_start);
        assert!(records[3].is_group_end);
    }

    #[test]
    fn test_no_markers_no_groups() {
        let mut records = sequence(&[1, 2, 4, 8]);
        assert_eq!(assign_groups(&mut records), 0);
        assert!(records.iter().all(|r| r.group_id == 0));
        assert!(records.iter().all(|r| !r.is_group_start && !r.is_group_end));
    }

    #[test]
    fn test_empty_sequence() {
        let mut records: Vec<LogRecord> = Vec::new();
        assert_eq!(assign_groups(&mut records), 0);
    }

    #[test]
    fn test_back_to_back_markers() {
        let mut records = sequence(&[1, 31, 31, 2, 31]);
        let groups = assign_groups(&mut records);
        assert_eq!(groups, 2);
        // The second marker immediately follows a completed group, so it
        // is an orphan.
        assert_eq!(records[2].group_id, 0);
        assert_eq!(records[3].group_id, 2);
        assert_eq!(records[4].group_id, 2);
    }
}
