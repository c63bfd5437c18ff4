//! Classification of source files into date groups.
//!
//! Each eligible file gets a sort key: the date encoded in its first eight
//! characters (`YYYYMMDD`) when present and valid, otherwise its modification
//! time. Files are sorted by that key and bucketed by calendar date.
//!
//! # Examples
//!
//! ```
//! use datesort::classifier::{DateKey, sort_key_from_name};
//!
//! let key = sort_key_from_name("20240115_report.txt").unwrap();
//! assert_eq!(DateKey::from(key).to_string(), "2024_01_15");
//! assert!(sort_key_from_name("notes.txt").is_none());
//! ```

use crate::error::{SortError, SortResult};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})").expect("date prefix pattern is valid")
});

/// Timestamp used to order and bucket a file.
pub type SortKey = NaiveDateTime;

/// Calendar date identifying a group and its destination directory (`YYYY_MM_DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<SortKey> for DateKey {
    fn from(key: SortKey) -> Self {
        Self(key.date())
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y_%m_%d"))
    }
}

/// Parses a `YYYYMMDD` prefix into a midnight timestamp.
///
/// Returns `None` when the name does not start with eight ASCII digits, or when
/// the digits are not a real calendar date (`99999999`, `20240230`, year `0000`).
pub fn sort_key_from_name(name: &str) -> Option<SortKey> {
    let caps = DATE_PREFIX.captures(name)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reads a file's last-modified time as local wall-clock time.
pub fn sort_key_from_mtime(path: &Path) -> SortResult<SortKey> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| SortError::MetadataFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

/// Computes the sort key for one source entry.
///
/// A name with an eight-digit prefix that is not a valid date falls back to the
/// modification time.
pub fn sort_key_for(name: &str, path: &Path) -> SortResult<SortKey> {
    if let Some(key) = sort_key_from_name(name) {
        return Ok(key);
    }
    if DATE_PREFIX.is_match(name) {
        debug!(file = name, "date prefix is not a calendar date, using mtime");
    }
    sort_key_from_mtime(path)
}

/// Files sharing one calendar date, ordered by sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub key: DateKey,
    pub files: Vec<OsString>,
}

impl DateGroup {
    /// File names as displayable strings.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect()
    }
}

/// Date groups in first-seen order under the global sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedFiles {
    groups: Vec<DateGroup>,
    index: HashMap<DateKey, usize>,
}

impl GroupedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file to its date group, opening the group if it is new.
    pub fn push(&mut self, key: DateKey, file: OsString) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].files.push(file),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(DateGroup {
                    key,
                    files: vec![file],
                });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups.iter()
    }

    pub fn get(&self, key: &DateKey) -> Option<&DateGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files across all groups.
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

struct SourceEntry {
    name: OsString,
    key: SortKey,
}

/// A symlink counts as a directory only when its target is one; a dangling
/// link is treated as a file.
fn is_directory(path: &Path, file_type: fs::FileType) -> bool {
    if file_type.is_symlink() {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    } else {
        file_type.is_dir()
    }
}

/// Lists the direct children of `source_dir` and groups them by date.
///
/// Directories and the entry whose path equals `log_file` are skipped.
/// The listing is ordered by file name before the stable sort by key, so files
/// with equal keys keep file-name order.
///
/// # Arguments
///
/// * `source_dir` - Directory whose direct children are classified
/// * `log_file` - Path of the audit log, never classified even if it sits in `source_dir`
///
/// # Errors
///
/// Returns `SortError::SourceUnreadable` if the directory cannot be listed and
/// `SortError::MetadataFailed` if an entry cannot be inspected.
pub fn classify(source_dir: &Path, log_file: &Path) -> SortResult<GroupedFiles> {
    let entries = fs::read_dir(source_dir).map_err(|e| SortError::SourceUnreadable {
        path: source_dir.to_path_buf(),
        source: e,
    })?;

    let mut listing: Vec<(OsString, PathBuf, fs::FileType)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SortError::SourceUnreadable {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| SortError::MetadataFailed {
            path: entry.path(),
            source: e,
        })?;
        listing.push((entry.file_name(), entry.path(), file_type));
    }
    listing.sort_by(|a, b| a.0.cmp(&b.0));

    let mut eligible: Vec<SourceEntry> = Vec::with_capacity(listing.len());
    for (name, path, file_type) in listing {
        if path == log_file || is_directory(&path, file_type) {
            continue;
        }

        let key = sort_key_for(&name.to_string_lossy(), &path)?;
        debug!(file = %name.to_string_lossy(), %key, "classified");
        eligible.push(SourceEntry { name, key });
    }

    eligible.sort_by_key(|e| e.key);

    let mut grouped = GroupedFiles::new();
    for entry in eligible {
        grouped.push(DateKey::from(entry.key), entry.name);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn local_time(date: &str) -> SystemTime {
        let naive = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap();
        let local = naive.and_local_timezone(Local).single().unwrap();
        SystemTime::UNIX_EPOCH + Duration::from_secs(local.timestamp() as u64)
    }

    fn touch(dir: &Path, name: &str, mtime: &str) {
        let file = File::create(dir.join(name)).unwrap();
        file.set_modified(local_time(mtime)).unwrap();
    }

    fn key(s: &str) -> DateKey {
        DateKey::new(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    #[test]
    fn test_sort_key_from_name() {
        let parsed = sort_key_from_name("20240115_report.txt").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-15 00:00:00");
        assert_eq!(
            sort_key_from_name("20240229").unwrap().date(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_sort_key_from_name_rejects_non_dates() {
        assert!(sort_key_from_name("notes.txt").is_none());
        assert!(sort_key_from_name("2024011").is_none());
        assert!(sort_key_from_name("2024-01-15.txt").is_none());
        assert!(sort_key_from_name("99999999.txt").is_none());
        assert!(sort_key_from_name("20230229.txt").is_none());
        assert!(sort_key_from_name("00000101.txt").is_none());
        assert!(sort_key_from_name("２０２４０１１５.txt").is_none());
    }

    #[test]
    fn test_date_key_format() {
        assert_eq!(key("2024-01-05").to_string(), "2024_01_05");
    }

    #[test]
    fn test_invalid_prefix_falls_back_to_mtime() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "99999999.dat", "2023-06-10 08:00:00");

        let key = sort_key_for("99999999.dat", &temp_dir.path().join("99999999.dat")).unwrap();
        assert_eq!(key.to_string(), "2023-06-10 08:00:00");
    }

    #[test]
    fn test_classify_groups_by_date() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "20240115_report.txt", "2030-01-01 00:00:00");
        touch(dir, "notes.txt", "2024-02-01 09:15:00");
        touch(dir, "20240115_data.csv", "2030-01-01 00:00:00");

        let groups = classify(dir, &dir.join("log.txt")).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.total_files(), 3);
        let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["2024_01_15", "2024_02_01"]);
        assert_eq!(
            groups.get(&key("2024-01-15")).unwrap().file_names(),
            vec!["20240115_data.csv", "20240115_report.txt"]
        );
        assert_eq!(
            groups.get(&key("2024-02-01")).unwrap().file_names(),
            vec!["notes.txt"]
        );
    }

    #[test]
    fn test_classify_orders_within_group_by_time() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "a_evening.jpg", "2024-03-03 21:00:00");
        touch(dir, "b_morning.jpg", "2024-03-03 07:00:00");
        touch(dir, "20240303_midnight.jpg", "2030-01-01 00:00:00");

        let groups = classify(dir, &dir.join("log.txt")).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.get(&key("2024-03-03")).unwrap().file_names(),
            vec!["20240303_midnight.jpg", "b_morning.jpg", "a_evening.jpg"]
        );
    }

    #[test]
    fn test_classify_skips_directories_and_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::create_dir(dir.join("20240101_folder")).unwrap();
        touch(dir, "log.txt", "2024-01-01 00:00:00");
        touch(dir, "20240101_kept.txt", "2024-01-01 00:00:00");

        let groups = classify(dir, &dir.join("log.txt")).unwrap();

        assert_eq!(groups.total_files(), 1);
        assert_eq!(
            groups.get(&key("2024-01-01")).unwrap().file_names(),
            vec!["20240101_kept.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_keeps_dangling_link_with_date_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::os::unix::fs::symlink(dir.join("nowhere"), dir.join("20240116_link")).unwrap();
        fs::create_dir(dir.join("real_dir")).unwrap();
        std::os::unix::fs::symlink(dir.join("real_dir"), dir.join("20240117_dir_link")).unwrap();

        let groups = classify(dir, &dir.join("log.txt")).unwrap();

        assert_eq!(groups.total_files(), 1);
        assert_eq!(
            groups.get(&key("2024-01-16")).unwrap().file_names(),
            vec!["20240116_link"]
        );
    }

    #[test]
    fn test_classify_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let groups = classify(temp_dir.path(), &temp_dir.path().join("log.txt")).unwrap();
        assert!(groups.is_empty());
        assert_eq!(groups.total_files(), 0);
    }

    #[test]
    fn test_classify_missing_directory() {
        let result = classify(Path::new("/non/existent/path"), Path::new("/log.txt"));
        assert!(matches!(result, Err(SortError::SourceUnreadable { .. })));
    }

    #[test]
    fn test_grouped_files_preserves_first_seen_order() {
        let mut groups = GroupedFiles::new();
        groups.push(key("2024-05-01"), OsString::from("b"));
        groups.push(key("2024-01-01"), OsString::from("a"));
        groups.push(key("2024-05-01"), OsString::from("c"));

        let keys: Vec<DateKey> = groups.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![key("2024-05-01"), key("2024-01-01")]);
        assert_eq!(groups.get(&key("2024-05-01")).unwrap().file_names(), vec!["b", "c"]);
    }
}
