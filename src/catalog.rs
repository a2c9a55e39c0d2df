/*!
归档目录：一个日志流的已知文件列表。

按修改时间降序排列，下标0始终是正在写入的活动文件。条目数不超过 `max_archives + 1`。
每次排序之后，任何不比后一个（更旧的）条目新的条目都会被逻辑上推后1秒，
保证列表严格降序；这个调整只存在于内存中，不会修改磁盘上的时间戳。
*/

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, FileOp, Result};

/// 一个物理文件的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// 文件路径
    pub path: PathBuf,
    /// 字节数，追加写入时在内存中累加，不逐次 `stat`
    pub size: u64,
    /// 修改时间（Unix秒）
    pub modified: i64,
}

impl FileInfo {
    /// 读取文件元数据
    ///
    /// 路径不存在或指向目录时返回错误。
    pub fn stat<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| Error::file(FileOp::Stat, path, e))?;
        if meta.is_dir() {
            return Err(Error::file(
                FileOp::Stat,
                path,
                std::io::Error::other("is a directory, not a file"),
            ));
        }
        let modified = meta
            .modified()
            .map_err(|e| Error::file(FileOp::Stat, path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            modified: DateTime::<Utc>::from(modified).timestamp(),
        })
    }
}

/// 有界、按时间降序的文件列表
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<FileInfo>,
    capacity: usize,
}

impl Catalog {
    /// 扫描目录，返回名为 `base_name` 或 `base_name.<后缀>` 的文件
    ///
    /// 结果按修改时间降序排列，时间相同时按文件名降序（归档后缀是时间戳）。
    /// 扫描过程中文件消失等 `stat` 失败视为硬错误。
    pub fn scan<P: AsRef<Path>>(directory: P, base_name: &str) -> Result<Vec<FileInfo>> {
        let directory = directory.as_ref();
        let prefix = format!("{}.", base_name);
        let mut files = Vec::new();

        let entries =
            fs::read_dir(directory).map_err(|e| Error::file(FileOp::ReadDir, directory, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::file(FileOp::ReadDir, directory, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name != base_name && !name.starts_with(&prefix) {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            files.push(FileInfo::stat(&path)?);
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.cmp(&a.path))
        });
        Ok(files)
    }

    /// 从已有条目构建目录，超出容量的最旧条目被截断（磁盘文件保持不动）
    pub fn new(capacity: usize, entries: Vec<FileInfo>) -> Self {
        let capacity = capacity.max(1);
        let mut catalog = Self { entries, capacity };
        catalog.sort();
        catalog.entries.truncate(capacity);
        catalog
    }

    /// 最大条目数
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否已满
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// 全部条目，从新到旧
    pub fn entries(&self) -> &[FileInfo] {
        &self.entries
    }

    /// 最新条目（活动文件）
    pub fn head(&self) -> Option<&FileInfo> {
        self.entries.first()
    }

    /// 最新条目的可变引用，用于累加写入字节数
    pub fn head_mut(&mut self) -> Option<&mut FileInfo> {
        self.entries.first_mut()
    }

    /// 是否包含指定路径
    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// 按顺序插入条目
    ///
    /// 已满时返回 [`Error::CapacityExceeded`]，调用方必须先淘汰再插入。
    /// 与已有条目时间相同时插入到它们前面（视为更新）。
    pub fn insert(&mut self, info: FileInfo) -> Result<()> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.modified <= info.modified)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, info);
        self.normalize();
        Ok(())
    }

    /// 移除并返回最旧的条目，由调用方删除对应文件
    pub fn evict_oldest(&mut self) -> Option<FileInfo> {
        self.entries.pop()
    }

    /// 替换指定位置的条目并重新排序，返回旧条目；下标越界时返回 `None`
    pub fn update(&mut self, index: usize, info: FileInfo) -> Option<FileInfo> {
        let slot = self.entries.get_mut(index)?;
        let old = std::mem::replace(slot, info);
        self.sort();
        Some(old)
    }

    fn sort(&mut self) {
        // 稳定排序：时间相同的条目保持原有相对位置
        self.entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        self.normalize();
    }

    fn normalize(&mut self) {
        for i in (1..self.entries.len()).rev() {
            let older = self.entries[i].modified;
            if self.entries[i - 1].modified <= older {
                self.entries[i - 1].modified = older + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, modified: i64) -> FileInfo {
        FileInfo {
            path: PathBuf::from(name),
            size: 0,
            modified,
        }
    }

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog
            .entries()
            .iter()
            .map(|e| e.path.to_str().unwrap())
            .collect()
    }

    fn assert_strictly_descending(catalog: &Catalog) {
        for pair in catalog.entries().windows(2) {
            assert!(pair[0].modified > pair[1].modified, "{:?}", catalog);
        }
    }

    #[test]
    fn test_new_sorts_and_truncates() {
        let catalog = Catalog::new(
            3,
            vec![info("b", 20), info("d", 40), info("a", 10), info("c", 30)],
        );
        assert_eq!(names(&catalog), vec!["d", "c", "b"]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.is_full());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut catalog = Catalog::new(4, vec![info("c", 30), info("a", 10)]);
        catalog.insert(info("b", 20)).unwrap();
        catalog.insert(info("d", 40)).unwrap();
        assert_eq!(names(&catalog), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_insert_at_capacity_is_rejected() {
        let mut catalog = Catalog::new(2, vec![info("b", 20), info("a", 10)]);
        let err = catalog.insert(info("c", 30)).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { capacity: 2 }));
        assert_eq!(names(&catalog), vec!["b", "a"]);

        let evicted = catalog.evict_oldest().unwrap();
        assert_eq!(evicted.path, PathBuf::from("a"));
        catalog.insert(info("c", 30)).unwrap();
        assert_eq!(names(&catalog), vec!["c", "b"]);
    }

    #[test]
    fn test_ties_are_nudged_strictly_descending() {
        let catalog = Catalog::new(4, vec![info("new", 5), info("mid", 5), info("old", 5)]);
        assert_eq!(names(&catalog), vec!["new", "mid", "old"]);
        assert_eq!(catalog.entries()[0].modified, 7);
        assert_eq!(catalog.entries()[1].modified, 6);
        assert_eq!(catalog.entries()[2].modified, 5);
        assert_strictly_descending(&catalog);
    }

    #[test]
    fn test_insert_tie_goes_first() {
        let mut catalog = Catalog::new(3, vec![info("archive", 100)]);
        catalog.insert(info("live", 100)).unwrap();
        assert_eq!(names(&catalog), vec!["live", "archive"]);
        assert_strictly_descending(&catalog);
    }

    #[test]
    fn test_update_resorts() {
        let mut catalog = Catalog::new(3, vec![info("live", 30), info("x", 20), info("y", 10)]);
        let old = catalog.update(0, info("renamed", 5)).unwrap();
        assert_eq!(old.path, PathBuf::from("live"));
        assert_eq!(names(&catalog), vec!["x", "y", "renamed"]);
        assert!(catalog.update(7, info("z", 1)).is_none());
    }

    #[test]
    fn test_scan_matches_base_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "app.log",
            "app.log.20240101-000000",
            "app.log.20240102-000000",
            "other.log",
            "app.logger",
        ] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        fs::create_dir(dir.path().join("app.log.d")).unwrap();

        let files = Catalog::scan(dir.path(), "app.log").unwrap();
        let mut found: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        found.sort();
        assert_eq!(
            found,
            vec!["app.log", "app.log.20240101-000000", "app.log.20240102-000000"]
        );
        for pair in files.windows(2) {
            assert!(pair[0].modified >= pair[1].modified);
        }
        let live = files
            .iter()
            .find(|f| f.path.ends_with("app.log"))
            .unwrap();
        assert_eq!(live.size, "app.log".len() as u64);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::scan(dir.path().join("missing"), "app.log").unwrap_err();
        assert!(matches!(err, Error::File { op: FileOp::ReadDir, .. }));
    }

    #[test]
    fn test_stat_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileInfo::stat(dir.path()).is_err());
        assert!(FileInfo::stat(dir.path().join("nope")).is_err());
    }
}
