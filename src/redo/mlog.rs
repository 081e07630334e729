//! MLOG record type taxonomy.
//!
//! The first byte of every redo log record is a type code drawn from MySQL's
//! `mlog_id_t` (`mtr0types.h`). The assignments are fixed by MySQL 8.0: types
//! suffixed `_8027` are the pre-8.0.28 record formats, and 8.0.28 added new
//! codes (67-76) for records carrying row-versioning information. Codes 0 and
//! anything above 76 never appear in a valid record and are what the
//! dispatcher keys its resynchronization on.
//!
//! [`MlogType::from_u8`] maps a wire code to a variant, [`MlogType::name`]
//! gives the MySQL source name, and [`MlogType::operation_class`] buckets a
//! type into the coarse insert/update/delete classification used for
//! filtering.

use serde::Serialize;

/// Highest type code assigned by MySQL 8.0.
pub const MLOG_MAX_TYPE: u8 = 76;

/// Returns true if `code` is inside the assigned `mlog_id_t` range.
///
/// Used by the record dispatcher to decide whether a byte can start a record;
/// out-of-range bytes trigger a single-byte resync instead of a parse.
pub fn is_valid_type_code(code: u8) -> bool {
    (1..=MLOG_MAX_TYPE).contains(&code)
}

/// Coarse operation classification for consumer-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    Insert,
    Update,
    Delete,
    Other,
}

impl std::fmt::Display for OperationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationClass::Insert => "insert",
            OperationClass::Update => "update",
            OperationClass::Delete => "delete",
            OperationClass::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Redo log record types from MySQL `mtr0types.h`.
///
/// Codes inside [1, 76] that MySQL leaves unassigned (3, 5-7, 12, 23, 47,
/// 54-56, 60) are preserved as `Unknown(code)` so they survive round-trips
/// through display and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MlogType {
    /// Write 1 byte to a page (type 1).
    OneByte,
    /// Write 2 bytes to a page (type 2).
    TwoBytes,
    /// Write 4 bytes to a page (type 4).
    FourBytes,
    /// Write 8 bytes to a page (type 8).
    EightBytes,

    /// Insert record, pre-8.0.28 format (type 9).
    RecInsert8027,
    /// Clustered index delete-mark, pre-8.0.28 format (type 10).
    RecClustDeleteMark8027,
    /// Secondary index delete-mark (type 11).
    RecSecDeleteMark,
    /// Update in place, pre-8.0.28 format (type 13).
    RecUpdateInPlace8027,
    /// Delete record, pre-8.0.28 format (type 14).
    RecDelete8027,
    /// Delete from end of page list, pre-8.0.28 format (type 15).
    ListEndDelete8027,
    /// Delete from start of page list, pre-8.0.28 format (type 16).
    ListStartDelete8027,
    /// End-copy of created page list, pre-8.0.28 format (type 17).
    ListEndCopyCreated8027,
    /// Page reorganize, pre-8.0.28 format (type 18).
    PageReorganize8027,

    /// Create a page (type 19).
    PageCreate,
    /// Insert undo log record (type 20).
    UndoInsert,
    /// Erase undo log page end (type 21).
    UndoEraseEnd,
    /// Initialize undo log header (type 22).
    UndoInit,
    /// Reuse undo log header (type 24).
    UndoHdrReuse,
    /// Create undo log header (type 25).
    UndoHdrCreate,
    /// Set minimum record mark (type 26).
    RecMinMark,
    /// Initialize insert buffer bitmap (type 27).
    IbufBitmapInit,
    /// LSN marker, debug only (type 28).
    Lsn,
    /// Initialize file page, deprecated (type 29).
    InitFilePage,
    /// Write a string to a page (type 30).
    WriteString,
    /// End of a multi-record mini-transaction (type 31).
    MultiRecEnd,
    /// Dummy record for padding (type 32).
    DummyRecord,
    /// Create a tablespace file (type 33).
    FileCreate,
    /// Rename a tablespace file (type 34).
    FileRename,
    /// Delete a tablespace file (type 35).
    FileDelete,

    /// Set minimum record mark, compact format (type 36).
    CompRecMinMark,
    /// Create compact page (type 37).
    CompPageCreate,
    /// Insert record, compact format, pre-8.0.28 (type 38).
    CompRecInsert8027,
    /// Clustered delete-mark, compact format, pre-8.0.28 (type 39).
    CompRecClustDeleteMark8027,
    /// Secondary delete-mark, compact format (type 40).
    CompRecSecDeleteMark,
    /// Update in place, compact format, pre-8.0.28 (type 41).
    CompRecUpdateInPlace8027,
    /// Delete record, compact format, pre-8.0.28 (type 42).
    CompRecDelete8027,
    /// Delete from end of list, compact format, pre-8.0.28 (type 43).
    CompListEndDelete8027,
    /// Delete from start of list, compact format, pre-8.0.28 (type 44).
    CompListStartDelete8027,
    /// End-copy created, compact format, pre-8.0.28 (type 45).
    CompListEndCopyCreated8027,
    /// Page reorganize, compact format, pre-8.0.28 (type 46).
    CompPageReorganize8027,

    /// Write node pointer in compressed page (type 48).
    ZipWriteNodePtr,
    /// Write BLOB pointer in compressed page (type 49).
    ZipWriteBlobPtr,
    /// Write header in compressed page (type 50).
    ZipWriteHeader,
    /// Compress a page (type 51).
    ZipPageCompress,
    /// Compress page with no data, pre-8.0.28 (type 52).
    ZipPageCompressNoData8027,
    /// Reorganize compressed page, pre-8.0.28 (type 53).
    ZipPageReorganize8027,

    /// Create R-Tree page (type 57).
    PageCreateRtree,
    /// Create compact R-Tree page (type 58).
    CompPageCreateRtree,
    /// Initialize file page v2 (type 59).
    InitFilePage2,
    /// Index load notification (type 61).
    IndexLoad,
    /// Table dynamic metadata (type 62).
    TableDynamicMeta,
    /// Create SDI page (type 63).
    PageCreateSdi,
    /// Create compact SDI page (type 64).
    CompPageCreateSdi,
    /// Extend a tablespace file (type 65).
    FileExtend,
    /// Test record, unit tests only (type 66).
    Test,

    /// Insert record with row versioning (type 67).
    RecInsert,
    /// Clustered index delete-mark with row versioning (type 68).
    RecClustDeleteMark,
    /// Delete record with row versioning (type 69).
    RecDelete,
    /// Update in place with row versioning (type 70).
    RecUpdateInPlace,
    /// End-copy of created page list with row versioning (type 71).
    ListEndCopyCreated,
    /// Page reorganize with row versioning (type 72).
    PageReorganize,
    /// Compressed page reorganize with row versioning (type 73).
    ZipPageReorganize,
    /// Compress page with no data, with row versioning (type 74).
    ZipPageCompressNoData,
    /// Delete from end of page list with row versioning (type 75).
    ListEndDelete,
    /// Delete from start of page list with row versioning (type 76).
    ListStartDelete,

    /// In-range code with no `mlog_id_t` name.
    Unknown(u8),
}

impl MlogType {
    /// Map a wire type code to its variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use redoscope::redo::mlog::MlogType;
    ///
    /// assert_eq!(MlogType::from_u8(1), MlogType::OneByte);
    /// assert_eq!(MlogType::from_u8(9), MlogType::RecInsert8027);
    /// assert_eq!(MlogType::from_u8(31), MlogType::MultiRecEnd);
    /// assert_eq!(MlogType::from_u8(12), MlogType::Unknown(12));
    /// ```
    pub fn from_u8(code: u8) -> Self {
        match code {
            1 => MlogType::OneByte,
            2 => MlogType::TwoBytes,
            4 => MlogType::FourBytes,
            8 => MlogType::EightBytes,
            9 => MlogType::RecInsert8027,
            10 => MlogType::RecClustDeleteMark8027,
            11 => MlogType::RecSecDeleteMark,
            13 => MlogType::RecUpdateInPlace8027,
            14 => MlogType::RecDelete8027,
            15 => MlogType::ListEndDelete8027,
            16 => MlogType::ListStartDelete8027,
            17 => MlogType::ListEndCopyCreated8027,
            18 => MlogType::PageReorganize8027,
            19 => MlogType::PageCreate,
            20 => MlogType::UndoInsert,
            21 => MlogType::UndoEraseEnd,
            22 => MlogType::UndoInit,
            24 => MlogType::UndoHdrReuse,
            25 => MlogType::UndoHdrCreate,
            26 => MlogType::RecMinMark,
            27 => MlogType::IbufBitmapInit,
            28 => MlogType::Lsn,
            29 => MlogType::InitFilePage,
            30 => MlogType::WriteString,
            31 => MlogType::MultiRecEnd,
            32 => MlogType::DummyRecord,
            33 => MlogType::FileCreate,
            34 => MlogType::FileRename,
            35 => MlogType::FileDelete,
            36 => MlogType::CompRecMinMark,
            37 => MlogType::CompPageCreate,
            38 => MlogType::CompRecInsert8027,
            39 => MlogType::CompRecClustDeleteMark8027,
            40 => MlogType::CompRecSecDeleteMark,
            41 => MlogType::CompRecUpdateInPlace8027,
            42 => MlogType::CompRecDelete8027,
            43 => MlogType::CompListEndDelete8027,
            44 => MlogType::CompListStartDelete8027,
            45 => MlogType::CompListEndCopyCreated8027,
            46 => MlogType::CompPageReorganize8027,
            48 => MlogType::ZipWriteNodePtr,
            49 => MlogType::ZipWriteBlobPtr,
            50 => MlogType::ZipWriteHeader,
            51 => MlogType::ZipPageCompress,
            52 => MlogType::ZipPageCompressNoData8027,
            53 => MlogType::ZipPageReorganize8027,
            57 => MlogType::PageCreateRtree,
            58 => MlogType::CompPageCreateRtree,
            59 => MlogType::InitFilePage2,
            61 => MlogType::IndexLoad,
            62 => MlogType::TableDynamicMeta,
            63 => MlogType::PageCreateSdi,
            64 => MlogType::CompPageCreateSdi,
            65 => MlogType::FileExtend,
            66 => MlogType::Test,
            67 => MlogType::RecInsert,
            68 => MlogType::RecClustDeleteMark,
            69 => MlogType::RecDelete,
            70 => MlogType::RecUpdateInPlace,
            71 => MlogType::ListEndCopyCreated,
            72 => MlogType::PageReorganize,
            73 => MlogType::ZipPageReorganize,
            74 => MlogType::ZipPageCompressNoData,
            75 => MlogType::ListEndDelete,
            76 => MlogType::ListStartDelete,
            v => MlogType::Unknown(v),
        }
    }

    /// The wire type code of this variant.
    pub fn code(&self) -> u8 {
        match self {
            MlogType::OneByte => 1,
            MlogType::TwoBytes => 2,
            MlogType::FourBytes => 4,
            MlogType::EightBytes => 8,
            MlogType::RecInsert8027 => 9,
            MlogType::RecClustDeleteMark8027 => 10,
            MlogType::RecSecDeleteMark => 11,
            MlogType::RecUpdateInPlace8027 => 13,
            MlogType::RecDelete8027 => 14,
            MlogType::ListEndDelete8027 => 15,
            MlogType::ListStartDelete8027 => 16,
            MlogType::ListEndCopyCreated8027 => 17,
            MlogType::PageReorganize8027 => 18,
            MlogType::PageCreate => 19,
            MlogType::UndoInsert => 20,
            MlogType::UndoEraseEnd => 21,
            MlogType::UndoInit => 22,
            MlogType::UndoHdrReuse => 24,
            MlogType::UndoHdrCreate => 25,
            MlogType::RecMinMark => 26,
            MlogType::IbufBitmapInit => 27,
            MlogType::Lsn => 28,
            MlogType::InitFilePage => 29,
            MlogType::WriteString => 30,
            MlogType::MultiRecEnd => 31,
            MlogType::DummyRecord => 32,
            MlogType::FileCreate => 33,
            MlogType::FileRename => 34,
            MlogType::FileDelete => 35,
            MlogType::CompRecMinMark => 36,
            MlogType::CompPageCreate => 37,
            MlogType::CompRecInsert8027 => 38,
            MlogType::CompRecClustDeleteMark8027 => 39,
            MlogType::CompRecSecDeleteMark => 40,
            MlogType::CompRecUpdateInPlace8027 => 41,
            MlogType::CompRecDelete8027 => 42,
            MlogType::CompListEndDelete8027 => 43,
            MlogType::CompListStartDelete8027 => 44,
            MlogType::CompListEndCopyCreated8027 => 45,
            MlogType::CompPageReorganize8027 => 46,
            MlogType::ZipWriteNodePtr => 48,
            MlogType::ZipWriteBlobPtr => 49,
            MlogType::ZipWriteHeader => 50,
            MlogType::ZipPageCompress => 51,
            MlogType::ZipPageCompressNoData8027 => 52,
            MlogType::ZipPageReorganize8027 => 53,
            MlogType::PageCreateRtree => 57,
            MlogType::CompPageCreateRtree => 58,
            MlogType::InitFilePage2 => 59,
            MlogType::IndexLoad => 61,
            MlogType::TableDynamicMeta => 62,
            MlogType::PageCreateSdi => 63,
            MlogType::CompPageCreateSdi => 64,
            MlogType::FileExtend => 65,
            MlogType::Test => 66,
            MlogType::RecInsert => 67,
            MlogType::RecClustDeleteMark => 68,
            MlogType::RecDelete => 69,
            MlogType::RecUpdateInPlace => 70,
            MlogType::ListEndCopyCreated => 71,
            MlogType::PageReorganize => 72,
            MlogType::ZipPageReorganize => 73,
            MlogType::ZipPageCompressNoData => 74,
            MlogType::ListEndDelete => 75,
            MlogType::ListStartDelete => 76,
            MlogType::Unknown(v) => *v,
        }
    }

    /// MySQL source name for this record type.
    pub fn name(&self) -> &str {
        match self {
            MlogType::OneByte => "MLOG_1BYTE",
            MlogType::TwoBytes => "MLOG_2BYTES",
            MlogType::FourBytes => "MLOG_4BYTES",
            MlogType::EightBytes => "MLOG_8BYTES",
            MlogType::RecInsert8027 => "MLOG_REC_INSERT_8027",
            MlogType::RecClustDeleteMark8027 => "MLOG_REC_CLUST_DELETE_MARK_8027",
            MlogType::RecSecDeleteMark => "MLOG_REC_SEC_DELETE_MARK",
            MlogType::RecUpdateInPlace8027 => "MLOG_REC_UPDATE_IN_PLACE_8027",
            MlogType::RecDelete8027 => "MLOG_REC_DELETE_8027",
            MlogType::ListEndDelete8027 => "MLOG_LIST_END_DELETE_8027",
            MlogType::ListStartDelete8027 => "MLOG_LIST_START_DELETE_8027",
            MlogType::ListEndCopyCreated8027 => "MLOG_LIST_END_COPY_CREATED_8027",
            MlogType::PageReorganize8027 => "MLOG_PAGE_REORGANIZE_8027",
            MlogType::PageCreate => "MLOG_PAGE_CREATE",
            MlogType::UndoInsert => "MLOG_UNDO_INSERT",
            MlogType::UndoEraseEnd => "MLOG_UNDO_ERASE_END",
            MlogType::UndoInit => "MLOG_UNDO_INIT",
            MlogType::UndoHdrReuse => "MLOG_UNDO_HDR_REUSE",
            MlogType::UndoHdrCreate => "MLOG_UNDO_HDR_CREATE",
            MlogType::RecMinMark => "MLOG_REC_MIN_MARK",
            MlogType::IbufBitmapInit => "MLOG_IBUF_BITMAP_INIT",
            MlogType::Lsn => "MLOG_LSN",
            MlogType::InitFilePage => "MLOG_INIT_FILE_PAGE",
            MlogType::WriteString => "MLOG_WRITE_STRING",
            MlogType::MultiRecEnd => "MLOG_MULTI_REC_END",
            MlogType::DummyRecord => "MLOG_DUMMY_RECORD",
            MlogType::FileCreate => "MLOG_FILE_CREATE",
            MlogType::FileRename => "MLOG_FILE_RENAME",
            MlogType::FileDelete => "MLOG_FILE_DELETE",
            MlogType::CompRecMinMark => "MLOG_COMP_REC_MIN_MARK",
            MlogType::CompPageCreate => "MLOG_COMP_PAGE_CREATE",
            MlogType::CompRecInsert8027 => "MLOG_COMP_REC_INSERT_8027",
            MlogType::CompRecClustDeleteMark8027 => "MLOG_COMP_REC_CLUST_DELETE_MARK_8027",
            MlogType::CompRecSecDeleteMark => "MLOG_COMP_REC_SEC_DELETE_MARK",
            MlogType::CompRecUpdateInPlace8027 => "MLOG_COMP_REC_UPDATE_IN_PLACE_8027",
            MlogType::CompRecDelete8027 => "MLOG_COMP_REC_DELETE_8027",
            MlogType::CompListEndDelete8027 => "MLOG_COMP_LIST_END_DELETE_8027",
            MlogType::CompListStartDelete8027 => "MLOG_COMP_LIST_START_DELETE_8027",
            MlogType::CompListEndCopyCreated8027 => "MLOG_COMP_LIST_END_COPY_CREATED_8027",
            MlogType::CompPageReorganize8027 => "MLOG_COMP_PAGE_REORGANIZE_8027",
            MlogType::ZipWriteNodePtr => "MLOG_ZIP_WRITE_NODE_PTR",
            MlogType::ZipWriteBlobPtr => "MLOG_ZIP_WRITE_BLOB_PTR",
            MlogType::ZipWriteHeader => "MLOG_ZIP_WRITE_HEADER",
            MlogType::ZipPageCompress => "MLOG_ZIP_PAGE_COMPRESS",
            MlogType::ZipPageCompressNoData8027 => "MLOG_ZIP_PAGE_COMPRESS_NO_DATA_8027",
            MlogType::ZipPageReorganize8027 => "MLOG_ZIP_PAGE_REORGANIZE_8027",
            MlogType::PageCreateRtree => "MLOG_PAGE_CREATE_RTREE",
            MlogType::CompPageCreateRtree => "MLOG_COMP_PAGE_CREATE_RTREE",
            MlogType::InitFilePage2 => "MLOG_INIT_FILE_PAGE2",
            MlogType::IndexLoad => "MLOG_INDEX_LOAD",
            MlogType::TableDynamicMeta => "MLOG_TABLE_DYNAMIC_META",
            MlogType::PageCreateSdi => "MLOG_PAGE_CREATE_SDI",
            MlogType::CompPageCreateSdi => "MLOG_COMP_PAGE_CREATE_SDI",
            MlogType::FileExtend => "MLOG_FILE_EXTEND",
            MlogType::Test => "MLOG_TEST",
            MlogType::RecInsert => "MLOG_REC_INSERT",
            MlogType::RecClustDeleteMark => "MLOG_REC_CLUST_DELETE_MARK",
            MlogType::RecDelete => "MLOG_REC_DELETE",
            MlogType::RecUpdateInPlace => "MLOG_REC_UPDATE_IN_PLACE",
            MlogType::ListEndCopyCreated => "MLOG_LIST_END_COPY_CREATED",
            MlogType::PageReorganize => "MLOG_PAGE_REORGANIZE",
            MlogType::ZipPageReorganize => "MLOG_ZIP_PAGE_REORGANIZE",
            MlogType::ZipPageCompressNoData => "MLOG_ZIP_PAGE_COMPRESS_NO_DATA",
            MlogType::ListEndDelete => "MLOG_LIST_END_DELETE",
            MlogType::ListStartDelete => "MLOG_LIST_START_DELETE",
            MlogType::Unknown(_) => "UNKNOWN",
        }
    }

    /// Classify this type as insert, update, delete, or other.
    ///
    /// # Examples
    ///
    /// ```
    /// use redoscope::redo::mlog::{MlogType, OperationClass};
    ///
    /// assert_eq!(MlogType::RecInsert8027.operation_class(), OperationClass::Insert);
    /// assert_eq!(MlogType::CompRecUpdateInPlace8027.operation_class(), OperationClass::Update);
    /// assert_eq!(MlogType::RecSecDeleteMark.operation_class(), OperationClass::Delete);
    /// assert_eq!(MlogType::MultiRecEnd.operation_class(), OperationClass::Other);
    /// ```
    pub fn operation_class(&self) -> OperationClass {
        match self.code() {
            9 | 38 => OperationClass::Insert,
            13 | 41 => OperationClass::Update,
            10 | 11 | 14 | 15 | 16 | 39 | 40 | 42 | 43 | 44 => OperationClass::Delete,
            _ => OperationClass::Other,
        }
    }
}

impl std::fmt::Display for MlogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MlogType::Unknown(v) => write!(f, "UNKNOWN({})", v),
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_write_codes() {
        assert_eq!(MlogType::from_u8(1), MlogType::OneByte);
        assert_eq!(MlogType::from_u8(2), MlogType::TwoBytes);
        assert_eq!(MlogType::from_u8(4), MlogType::FourBytes);
        assert_eq!(MlogType::from_u8(8), MlogType::EightBytes);
    }

    #[test]
    fn test_record_op_codes() {
        assert_eq!(MlogType::from_u8(9), MlogType::RecInsert8027);
        assert_eq!(MlogType::from_u8(13), MlogType::RecUpdateInPlace8027);
        assert_eq!(MlogType::from_u8(14), MlogType::RecDelete8027);
        assert_eq!(MlogType::from_u8(31), MlogType::MultiRecEnd);
        assert_eq!(MlogType::from_u8(38), MlogType::CompRecInsert8027);
        assert_eq!(MlogType::from_u8(62), MlogType::TableDynamicMeta);
        assert_eq!(MlogType::from_u8(67), MlogType::RecInsert);
        assert_eq!(MlogType::from_u8(76), MlogType::ListStartDelete);
    }

    #[test]
    fn test_unassigned_codes_are_unknown() {
        for code in [3u8, 5, 6, 7, 12, 23, 47, 54, 55, 56, 60] {
            assert_eq!(MlogType::from_u8(code), MlogType::Unknown(code));
        }
    }

    #[test]
    fn test_code_roundtrip() {
        for code in 1..=MLOG_MAX_TYPE {
            assert_eq!(MlogType::from_u8(code).code(), code);
        }
    }

    #[test]
    fn test_type_code_range() {
        assert!(!is_valid_type_code(0));
        assert!(is_valid_type_code(1));
        assert!(is_valid_type_code(76));
        assert!(!is_valid_type_code(77));
        assert!(!is_valid_type_code(0x89)); // type 9 with the high bit set
    }

    #[test]
    fn test_operation_classes() {
        assert_eq!(MlogType::from_u8(9).operation_class(), OperationClass::Insert);
        assert_eq!(MlogType::from_u8(38).operation_class(), OperationClass::Insert);
        assert_eq!(MlogType::from_u8(13).operation_class(), OperationClass::Update);
        assert_eq!(MlogType::from_u8(41).operation_class(), OperationClass::Update);
        for code in [10u8, 11, 14, 15, 16, 39, 40, 42, 43, 44] {
            assert_eq!(MlogType::from_u8(code).operation_class(), OperationClass::Delete);
        }
        assert_eq!(MlogType::from_u8(1).operation_class(), OperationClass::Other);
        assert_eq!(MlogType::from_u8(31).operation_class(), OperationClass::Other);
        assert_eq!(MlogType::from_u8(67).operation_class(), OperationClass::Other);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", MlogType::OneByte), "MLOG_1BYTE");
        assert_eq!(format!("{}", MlogType::RecInsert8027), "MLOG_REC_INSERT_8027");
        assert_eq!(format!("{}", MlogType::Unknown(12)), "UNKNOWN(12)");
    }
}
