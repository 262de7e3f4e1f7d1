//! Typed results and fixed-layout record parsers.
//!
//! Every accessor on [`Client`](crate::Client) returns one of the types in
//! this module. The parsers are pure functions over result payloads so they
//! can be used independently of a connection.
//!
//! # Keyed records
//!
//! Range reads (macros, parameters, diagnostics) return a [`KeyedRecord`]:
//! a map from key to [`Reading`], where [`Reading::Unavailable`] marks a key
//! the controller answered with an error or without data.

use std::collections::BTreeMap;

use crate::numeric::{decode_number, ElementWidth, FocasValue, ENCODED_NUMBER_SIZE};
use crate::utils::{ascii_field, be_i16, be_i32, be_u16, be_u32, latin1_until_nul};

/// Result length of the system identity read.
pub const SYSTEM_IDENTITY_SIZE: usize = 0x12;
/// Result length of the status read.
pub const STATUS_SNAPSHOT_SIZE: usize = 0x0E;
/// Size of one directory record.
pub const DIRECTORY_RECORD_SIZE: usize = 128;
/// Size of one program listing record.
pub const PROGRAM_RECORD_SIZE: usize = 72;
/// Per-entry header of parameter and diagnostic records.
const TYPED_RECORD_HEADER: usize = 8;
/// Axis count meaning "all axes".
pub const ALL_AXES: i16 = -1;

/// Controller identity, read once at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemIdentity {
    /// Additional info flags.
    pub add_info: u16,
    /// Maximum number of controlled axes.
    pub max_axis: u16,
    /// CNC type, e.g. `"31"`.
    pub cnc_type: String,
    /// Machine type, e.g. `"M"`.
    pub mt_type: String,
    /// Series code.
    pub series: String,
    /// Software version.
    pub version: String,
    /// Current number of axes, as text.
    pub axes: String,
}

impl SystemIdentity {
    /// Parses an 18-byte identity result.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != SYSTEM_IDENTITY_SIZE {
            return None;
        }
        Some(Self {
            add_info: be_u16(data, 0)?,
            max_axis: be_u16(data, 2)?,
            cnc_type: ascii_field(&data[4..6]),
            mt_type: ascii_field(&data[6..8]),
            series: ascii_field(&data[8..12]),
            version: ascii_field(&data[12..16]),
            axes: ascii_field(&data[16..18]),
        })
    }
}

impl std::fmt::Display for SystemIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CncType: {}, Series: {}, MaxAxis: {}, Version: {}",
            self.cnc_type, self.series, self.max_axis, self.version
        )
    }
}

/// Controller status flags, read once at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// Automatic mode selection.
    pub auto: u16,
    /// Run status.
    pub run: u16,
    /// Axis motion status.
    pub motion: u16,
    /// M/S/T/B function status.
    pub mstb: u16,
    /// Emergency stop status.
    pub emergency: u16,
    /// Alarm status.
    pub alarm: u16,
    /// Edit status.
    pub edit: u16,
}

impl StatusSnapshot {
    /// Parses a 14-byte status result.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != STATUS_SNAPSHOT_SIZE {
            return None;
        }
        Some(Self {
            auto: be_u16(data, 0)?,
            run: be_u16(data, 2)?,
            motion: be_u16(data, 4)?,
            mstb: be_u16(data, 6)?,
            emergency: be_u16(data, 8)?,
            alarm: be_u16(data, 10)?,
            edit: be_u16(data, 12)?,
        })
    }
}

/// One value of a keyed read.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reading<T> {
    /// The controller returned data for the key.
    Value(T),
    /// The key returned an error or no data.
    Unavailable,
}

impl<T> Reading<T> {
    /// Returns the value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Returns `true` for [`Reading::Unavailable`].
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Map from key to reading.
pub type KeyedRecord<T> = BTreeMap<i32, Reading<T>>;

/// Program numbers of the running and main programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramNumbers {
    /// Currently running program number.
    pub running: i32,
    /// Main program number.
    pub main: i32,
}

impl ProgramNumbers {
    /// Parses the program number result (at least 8 bytes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        Some(Self {
            running: be_i32(data, 0)?,
            main: be_i32(data, 4)?,
        })
    }
}

/// The block being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutingBlock {
    /// Block number.
    pub block: i32,
    /// Program text around the executing block.
    pub text: String,
}

impl ExecutingBlock {
    /// Parses the executing block result (more than 4 bytes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() <= 4 {
            return None;
        }
        Some(Self {
            block: be_i32(data, 0)?,
            text: String::from_utf8_lossy(&data[4..]).into_owned(),
        })
    }
}

/// A calendar date and time reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerDateTime {
    /// Year.
    pub year: u16,
    /// Month (1-12).
    pub month: u16,
    /// Day of month (1-31).
    pub day: u16,
    /// Hour (0-23).
    pub hour: u16,
    /// Minute (0-59).
    pub minute: u16,
    /// Second (0-59).
    pub second: u16,
}

impl ControllerDateTime {
    /// Builds a date-time, or `None` if any field is out of range.
    pub fn new(year: u16, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> Option<Self> {
        let valid = (1..=9999).contains(&year)
            && (1..=12).contains(&month)
            && (1..=days_in_month(year, month)).contains(&day)
            && hour < 24
            && minute < 60
            && second < 60;
        valid.then_some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Reads six consecutive u16 fields (year, month, day, hour, minute, second).
    pub(crate) fn from_fields(buf: &[u8], offset: usize) -> Option<Self> {
        Self::new(
            be_u16(buf, offset)?,
            be_u16(buf, offset + 2)?,
            be_u16(buf, offset + 4)?,
            be_u16(buf, offset + 6)?,
            be_u16(buf, offset + 8)?,
            be_u16(buf, offset + 10)?,
        )
    }
}

impl std::fmt::Display for ControllerDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn days_in_month(year: u16, month: u16) -> u16 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    /// A program file.
    File,
    /// A sub-directory.
    Directory,
}

/// Directory and file counts of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryInfo {
    /// Number of sub-directories.
    pub dirs: i32,
    /// Number of files.
    pub files: i32,
}

impl DirectoryInfo {
    /// Parses the directory info result (at least 8 bytes).
    pub fn parse(data: &[u8]) -> Option<Self> {
        Some(Self {
            dirs: be_i32(data, 0)?,
            files: be_i32(data, 4)?,
        })
    }

    /// Total entry count.
    pub fn total(&self) -> i32 {
        self.dirs.saturating_add(self.files)
    }
}

/// One entry of a directory listing.
///
/// Directories carry no timestamp, size or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryEntry {
    /// Entry name.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Last modification time; `None` when the fields are not a valid date.
    pub timestamp: Option<ControllerDateTime>,
    /// Size in bytes as reported by the directory service.
    pub size: Option<u32>,
    /// Program comment.
    pub comment: Option<String>,
}

impl DirectoryEntry {
    /// Parses one 128-byte directory record.
    ///
    /// Layout: type u16 at 0, date-time at 2, size u32 at 20, attribute u32
    /// at 24, name (36 bytes) at 28, comment (52 bytes) at 64.
    pub fn parse(record: &[u8]) -> Option<Self> {
        if record.len() < DIRECTORY_RECORD_SIZE {
            return None;
        }
        let name = latin1_until_nul(&record[28..64]);

        if be_u16(record, 0)? == 0 {
            return Some(Self {
                name,
                kind: EntryKind::Directory,
                timestamp: None,
                size: None,
                comment: None,
            });
        }

        Some(Self {
            name,
            kind: EntryKind::File,
            timestamp: ControllerDateTime::from_fields(record, 2),
            size: be_u32(record, 20),
            comment: Some(latin1_until_nul(&record[64..116])),
        })
    }
}

/// Parses consecutive 128-byte directory records; a trailing partial record is ignored.
pub fn parse_directory(data: &[u8]) -> Vec<DirectoryEntry> {
    data.chunks_exact(DIRECTORY_RECORD_SIZE)
        .filter_map(DirectoryEntry::parse)
        .collect()
}

/// One registered program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramListingEntry {
    /// Program number.
    pub number: u32,
    /// Program size in bytes.
    pub size: u32,
    /// Program comment.
    pub comment: String,
}

/// Parses consecutive 72-byte program records; a trailing partial record is ignored.
pub fn parse_program_listing(data: &[u8]) -> Vec<ProgramListingEntry> {
    data.chunks_exact(PROGRAM_RECORD_SIZE)
        .map(|record| ProgramListingEntry {
            number: u32::from_be_bytes([record[0], record[1], record[2], record[3]]),
            size: u32::from_be_bytes([record[4], record[5], record[6], record[7]]),
            comment: latin1_until_nul(&record[8..PROGRAM_RECORD_SIZE]),
        })
        .collect()
}

/// A parameter or diagnostic entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedRecord {
    /// Wire type tag selecting the element decoding.
    pub value_type: u16,
    /// Axis count declared by the entry; [`ALL_AXES`] for all axes.
    pub axis_count: i16,
    /// Decoded elements; `None` for an element with an unknown type tag.
    pub values: Vec<Option<FocasValue>>,
}

/// Parses stride-packed parameter/diagnostic entries.
///
/// Each entry is `key (i32) | axis count (i16) | type (u16)` followed by
/// `max_axis` elements of `width` bytes. An entry declaring [`ALL_AXES`]
/// or zero axes (a non-axis value) yields its first element only; otherwise
/// up to the declared axis count.
pub fn parse_typed_records(
    data: &[u8],
    max_axis: u16,
    width: ElementWidth,
) -> BTreeMap<i32, TypedRecord> {
    let size = width.bytes();
    let stride = usize::from(max_axis) * size + TYPED_RECORD_HEADER;
    let mut records = BTreeMap::new();

    let mut pos = 0;
    while pos + TYPED_RECORD_HEADER <= data.len() {
        let (Some(key), Some(axis_count), Some(value_type)) =
            (be_i32(data, pos), be_i16(data, pos + 4), be_u16(data, pos + 6))
        else {
            break;
        };

        let take = if axis_count == ALL_AXES {
            1
        } else {
            usize::try_from(axis_count).unwrap_or(0).max(1)
        };

        let values = data[pos + TYPED_RECORD_HEADER..(pos + stride).min(data.len())]
            .chunks_exact(size)
            .take(usize::from(max_axis).min(take))
            .map(|element| FocasValue::decode(value_type, width, element))
            .collect();

        records.insert(
            key,
            TypedRecord {
                value_type,
                axis_count,
                values,
            },
        );
        pos += stride;
    }

    records
}

/// Parses PMC data into `address -> value` with element width `1 << data_type`.
///
/// An unknown data type (above 2) yields an empty map.
pub fn parse_pmc(data: &[u8], first: i32, data_type: u8) -> BTreeMap<i32, u32> {
    let width = match data_type {
        0 => 1,
        1 => 2,
        2 => 4,
        _ => return BTreeMap::new(),
    };
    data.chunks_exact(width)
        .enumerate()
        .filter_map(|(index, chunk)| {
            let value = match chunk {
                [b] => u32::from(*b),
                [a, b] => u32::from(u16::from_be_bytes([*a, *b])),
                [a, b, c, d] => u32::from_be_bytes([*a, *b, *c, *d]),
                _ => return None,
            };
            let address = first.checked_add(i32::try_from(index * width).ok()?)?;
            Some((address, value))
        })
        .collect()
}

/// Parses a length-prefixed list of encoded numbers (axis position items).
pub fn parse_number_list(payload: &[u8]) -> Vec<Option<f64>> {
    let Some(length) = be_u16(payload, 0) else {
        return Vec::new();
    };
    (2..usize::from(length) + 2)
        .step_by(ENCODED_NUMBER_SIZE)
        .take_while(|pos| pos + ENCODED_NUMBER_SIZE <= payload.len())
        .map(|pos| decode_number(payload, pos))
        .collect()
}

/// Parses a length-prefixed single encoded number (batched macro item).
///
/// Returns `Unavailable` when the declared length leaves no room for a value.
pub fn parse_prefixed_number(payload: &[u8]) -> Reading<Option<f64>> {
    match be_u16(payload, 0) {
        Some(length) if length > 2 => Reading::Value(decode_number(payload, 2)),
        _ => Reading::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_record(kind: u16, name: &str, comment: &str) -> Vec<u8> {
        let mut record = vec![0u8; DIRECTORY_RECORD_SIZE];
        record[0..2].copy_from_slice(&kind.to_be_bytes());
        for (i, field) in [2024u16, 3, 15, 13, 45, 30].iter().enumerate() {
            record[2 + i * 2..4 + i * 2].copy_from_slice(&field.to_be_bytes());
        }
        record[20..24].copy_from_slice(&1234u32.to_be_bytes());
        record[28..28 + name.len()].copy_from_slice(name.as_bytes());
        record[64..64 + comment.len()].copy_from_slice(comment.as_bytes());
        record
    }

    #[test]
    fn test_system_identity_parse() {
        let mut data = vec![0x00, 0x01, 0x00, 0x03];
        data.extend_from_slice(b"31 MG004A1.0 3");
        data.truncate(SYSTEM_IDENTITY_SIZE);
        data.resize(SYSTEM_IDENTITY_SIZE, b' ');
        let identity = SystemIdentity::parse(&data).unwrap();
        assert_eq!(identity.add_info, 1);
        assert_eq!(identity.max_axis, 3);
        assert_eq!(identity.cnc_type, "31");
        assert_eq!(identity.mt_type, "M");
        assert_eq!(identity.series, "G004");
        assert_eq!(identity.version, "A1.0");
        assert_eq!(identity.axes, "3");
        assert!(identity.to_string().contains("MaxAxis: 3"));
        assert!(SystemIdentity::parse(&data[..17]).is_none());
    }

    #[test]
    fn test_status_parse() {
        let data: Vec<u8> = (1u16..=7).flat_map(|v| v.to_be_bytes()).collect();
        let status = StatusSnapshot::parse(&data).unwrap();
        assert_eq!(status.auto, 1);
        assert_eq!(status.run, 2);
        assert_eq!(status.edit, 7);
        assert!(StatusSnapshot::parse(&data[..12]).is_none());
    }

    #[test]
    fn test_directory_entry_file() {
        let record = directory_record(0x0001, "O0011", "(TEST PART)");
        let entry = DirectoryEntry::parse(&record).unwrap();
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.name, "O0011");
        assert_eq!(entry.size, Some(1234));
        assert_eq!(entry.comment.as_deref(), Some("(TEST PART)"));
        assert_eq!(
            entry.timestamp,
            ControllerDateTime::new(2024, 3, 15, 13, 45, 30)
        );
    }

    #[test]
    fn test_directory_entry_directory() {
        let record = directory_record(0x0000, "PATH1", "ignored");
        let entry = DirectoryEntry::parse(&record).unwrap();
        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.name, "PATH1");
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.size, None);
        assert_eq!(entry.comment, None);
    }

    #[test]
    fn test_directory_entry_invalid_date() {
        let mut record = directory_record(1, "O1", "");
        record[4..6].copy_from_slice(&13u16.to_be_bytes());
        let entry = DirectoryEntry::parse(&record).unwrap();
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.comment.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_directory_ignores_partial_record() {
        let mut data = directory_record(1, "O1", "");
        data.extend_from_slice(&directory_record(0, "SUB", ""));
        data.extend_from_slice(&[0u8; 40]);
        let entries = parse_directory(&data);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "SUB");
    }

    #[test]
    fn test_parse_program_listing() {
        let mut data = Vec::new();
        for (number, size, comment) in [(1u32, 100u32, "(FIRST)"), (9000, 2048, "")] {
            let mut record = vec![0u8; PROGRAM_RECORD_SIZE];
            record[0..4].copy_from_slice(&number.to_be_bytes());
            record[4..8].copy_from_slice(&size.to_be_bytes());
            record[8..8 + comment.len()].copy_from_slice(comment.as_bytes());
            data.extend_from_slice(&record);
        }
        let entries = parse_program_listing(&data);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].comment, "(FIRST)");
        assert_eq!(entries[1].number, 9000);
        assert_eq!(entries[1].size, 2048);
    }

    #[test]
    fn test_typed_records_four_byte() {
        let mut data = Vec::new();
        // key 6711, all axes, type 3 (int)
        data.extend_from_slice(&6711i32.to_be_bytes());
        data.extend_from_slice(&(-1i16).to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        for v in [10i32, 20, 30] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        // key 1320, 2 axes, type 2 (short)
        data.extend_from_slice(&1320i32.to_be_bytes());
        data.extend_from_slice(&2i16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        for v in [-5i32, 6, 7] {
            data.extend_from_slice(&v.to_be_bytes());
        }

        let records = parse_typed_records(&data, 3, ElementWidth::Four);
        assert_eq!(records.len(), 2);
        assert_eq!(records[&6711].values, vec![Some(FocasValue::Int(10))]);
        assert_eq!(records[&6711].axis_count, ALL_AXES);
        assert_eq!(
            records[&1320].values,
            vec![Some(FocasValue::Short(-5)), Some(FocasValue::Short(6))]
        );
    }

    #[test]
    fn test_typed_records_eight_byte_real() {
        let mut data = Vec::new();
        data.extend_from_slice(&4920i32.to_be_bytes());
        data.extend_from_slice(&1i16.to_be_bytes());
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0x30, 0x39, 0, 10, 0, 1]);
        data.extend_from_slice(&[0, 0, 0, 0, 0, 10, 0xFF, 0xFF]);

        let records = parse_typed_records(&data, 2, ElementWidth::Eight);
        assert_eq!(records[&4920].values, vec![Some(FocasValue::Real(Some(1234.5)))]);
    }

    fn typed_entry(key: i32, axis_count: i16, value_type: u16, elements: [i32; 3]) -> Vec<u8> {
        let mut data = key.to_be_bytes().to_vec();
        data.extend_from_slice(&axis_count.to_be_bytes());
        data.extend_from_slice(&value_type.to_be_bytes());
        for v in elements {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data
    }

    #[test]
    fn test_typed_records_non_axis_and_single_axis() {
        let mut data = typed_entry(6711, 0, 3, [1234, 0, 0]);
        data.extend_from_slice(&typed_entry(1825, 1, 3, [5000, 6000, 7000]));

        let records = parse_typed_records(&data, 3, ElementWidth::Four);
        assert_eq!(records[&6711].axis_count, 0);
        assert_eq!(records[&6711].values, vec![Some(FocasValue::Int(1234))]);
        assert_eq!(records[&1825].values, vec![Some(FocasValue::Int(5000))]);
    }

    #[test]
    fn test_typed_records_axis_count_clamped_to_max_axis() {
        let data = typed_entry(1420, 8, 3, [1, 2, 3]);
        let records = parse_typed_records(&data, 3, ElementWidth::Four);
        assert_eq!(
            records[&1420].values,
            vec![
                Some(FocasValue::Int(1)),
                Some(FocasValue::Int(2)),
                Some(FocasValue::Int(3))
            ]
        );
    }

    #[test]
    fn test_typed_records_truncated_entry() {
        let mut data = Vec::new();
        data.extend_from_slice(&100i32.to_be_bytes());
        data.extend_from_slice(&3i16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 7]);
        let records = parse_typed_records(&data, 3, ElementWidth::Four);
        assert_eq!(records[&100].values, vec![Some(FocasValue::Byte(7))]);
    }

    #[test]
    fn test_parse_pmc_widths() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(
            parse_pmc(&data, 27, 0),
            BTreeMap::from([(27, 1), (28, 2), (29, 3), (30, 4)])
        );
        assert_eq!(
            parse_pmc(&data, 100, 1),
            BTreeMap::from([(100, 0x0102), (102, 0x0304)])
        );
        assert_eq!(parse_pmc(&data, 8, 2), BTreeMap::from([(8, 0x0102_0304)]));
    }

    #[test]
    fn test_parse_pmc_unknown_type_is_empty() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert!(parse_pmc(&data, 0, 3).is_empty());
        assert!(parse_pmc(&data, 0, 64).is_empty());
        assert!(parse_pmc(&data, 0, u8::MAX).is_empty());
    }

    #[test]
    fn test_parse_number_list() {
        let mut payload = 16u16.to_be_bytes().to_vec();
        payload.extend_from_slice(&[0, 0, 0x27, 0x10, 0, 10, 0, 3]);
        payload.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xF6, 0, 10, 0, 1]);
        payload.extend_from_slice(&[0, 0, 0, 1, 0, 10, 0, 0]);
        assert_eq!(parse_number_list(&payload), vec![Some(10.0), Some(-1.0)]);
        assert!(parse_number_list(&[0x00]).is_empty());
    }

    #[test]
    fn test_parse_prefixed_number() {
        let mut payload = 8u16.to_be_bytes().to_vec();
        payload.extend_from_slice(&[0, 0, 0, 42, 0, 10, 0, 0]);
        assert_eq!(parse_prefixed_number(&payload), Reading::Value(Some(42.0)));
        assert_eq!(parse_prefixed_number(&[0, 2]), Reading::Unavailable);
        assert_eq!(parse_prefixed_number(&[]), Reading::Unavailable);
    }

    #[test]
    fn test_date_time_validation() {
        assert!(ControllerDateTime::new(2024, 2, 29, 0, 0, 0).is_some());
        assert!(ControllerDateTime::new(2023, 2, 29, 0, 0, 0).is_none());
        assert!(ControllerDateTime::new(2024, 1, 1, 24, 0, 0).is_none());
        assert_eq!(
            ControllerDateTime::new(2024, 1, 2, 3, 4, 5).unwrap().to_string(),
            "2024-01-02 03:04:05"
        );
    }

    #[test]
    fn test_reading_accessors() {
        let reading = Reading::Value(3);
        assert_eq!(reading.value(), Some(&3));
        assert!(Reading::<i32>::Unavailable.is_unavailable());
    }
}
