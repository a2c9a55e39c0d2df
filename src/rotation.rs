/*!
按大小触发的日志文件轮转。

活动文件为 `<目录>/<文件名><扩展名>`，归档文件为活动文件名加上 `.<YYYYMMDD-HHMMSS>`。
轮转只在唯一的写入上下文中执行（同步模式下的调用线程，或异步模式下的后台线程），
因此不需要单独的轮转锁。

## 轮转步骤

1. 刷新并关闭活动文件
2. 将活动文件重命名为带时间戳的归档名
3. 重新读取归档文件元数据，更新目录条目并重新排序
4. 超出保留数量时淘汰最旧的归档并删除文件（删除失败只上报，不中断轮转）
5. 在原路径打开新的活动文件并插入目录头部
6. 恢复写入

步骤1-3与5中的任何文件系统错误都会中止轮转并返回给调用方，此后管理器不再持有文件句柄。
*/

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{Catalog, FileInfo};
use crate::error::{Error, ErrorKind, FileOp, Result};
use crate::report::ErrorSink;
use crate::sink::{FileSink, Sink};

/// 归档文件名中的时间戳格式
pub const ARCHIVE_STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// 轮转配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// 日志目录
    pub directory: PathBuf,
    /// 文件名（不含扩展名）
    pub file_name: String,
    /// 扩展名（含点号，如 `.log`）
    pub extension: String,
    /// 单个文件的最大字节数，0表示不轮转
    pub max_file_size: u64,
    /// 保留的归档数量（不含活动文件）
    pub max_archives: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "app".to_string(),
            extension: ".log".to_string(),
            max_file_size: 10 * 1024 * 1024,
            max_archives: 5,
        }
    }
}

impl RotationConfig {
    /// 创建轮转配置，大小与数量使用默认值
    pub fn new(
        directory: impl Into<PathBuf>,
        file_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
            extension: extension.into(),
            ..Self::default()
        }
    }

    /// 设置单个文件的最大字节数
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// 设置保留的归档数量
    pub fn max_archives(mut self, count: usize) -> Self {
        self.max_archives = count;
        self
    }

    /// 活动文件名，如 `app.log`
    pub fn base_name(&self) -> String {
        format!("{}{}", self.file_name, self.extension)
    }

    /// 活动文件路径
    pub fn base_path(&self) -> PathBuf {
        self.directory.join(self.base_name())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(Error::Config("log file name must not be empty"));
        }
        if self.base_name().contains(['/', '\\']) {
            return Err(Error::Config(
                "log file name must not contain path separators",
            ));
        }
        Ok(())
    }
}

/// 轮转管理器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// 正常写入，活动文件已打开
    Writing,
    /// 轮转中，只在一次调用内部出现
    Rotating,
    /// 已关闭或轮转失败，不再持有文件句柄
    Closed,
}

/// 轮转管理器
///
/// 持有活动文件句柄和归档目录，实现 [`Sink`]，写入前按需轮转。
pub struct RotationManager {
    config: RotationConfig,
    base_name: String,
    base_path: PathBuf,
    buffer_size: usize,
    catalog: Catalog,
    live: Option<FileSink>,
    state: RotationState,
    last_stamp: Option<NaiveDateTime>,
    rotations: u64,
    errors: Arc<dyn ErrorSink>,
}

impl RotationManager {
    /// 初始化：扫描目录，重建归档目录，以追加模式打开（或创建）活动文件
    ///
    /// 超出保留数量的旧归档不再被跟踪，但留在磁盘上。
    pub fn open(
        config: RotationConfig,
        buffer_size: usize,
        errors: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        config.validate()?;

        let directory = config.directory.as_path();
        if !directory.as_os_str().is_empty() && !directory.exists() {
            fs::create_dir_all(directory)
                .map_err(|e| Error::file(FileOp::CreateDir, directory, e))?;
        }
        let scan_dir = if directory.as_os_str().is_empty() {
            Path::new(".")
        } else {
            directory
        };

        let base_name = config.base_name();
        let base_path = config.base_path();

        let mut archives = Catalog::scan(scan_dir, &base_name)?;
        let live = archives
            .iter()
            .position(|f| f.path.file_name() == Some(OsStr::new(&base_name)))
            .map(|index| archives.remove(index));
        archives.truncate(config.max_archives);

        let last_stamp = archives
            .iter()
            .filter_map(|f| archive_stamp(&f.path, &base_name))
            .max();

        let sink = FileSink::with_buffer_size(&base_path, buffer_size)?;
        let mut live = match live {
            Some(info) => info,
            None => FileInfo::stat(&base_path)?,
        };
        live.path = base_path.clone();
        if let Some(newest) = archives.first()
            && live.modified <= newest.modified
        {
            live.modified = newest.modified + 1;
        }

        let mut entries = Vec::with_capacity(archives.len() + 1);
        entries.push(live);
        entries.extend(archives);
        let catalog = Catalog::new(config.max_archives + 1, entries);

        Ok(Self {
            config,
            base_name,
            base_path,
            buffer_size,
            catalog,
            live: Some(sink),
            state: RotationState::Writing,
            last_stamp,
            rotations: 0,
            errors,
        })
    }

    /// 轮转配置
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// 归档目录（下标0为活动文件）
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 活动文件路径
    pub fn live_path(&self) -> &Path {
        &self.base_path
    }

    /// 当前状态
    pub fn state(&self) -> RotationState {
        self.state
    }

    /// 本实例执行过的轮转次数
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// 活动文件的当前字节数
    pub fn current_size(&self) -> u64 {
        self.catalog.head().map_or(0, |head| head.size)
    }

    /// 写入 `pending` 字节前是否需要轮转
    ///
    /// 超过上限的单条记录即使落在空文件上也会触发一次轮转，随后整条写入新文件。
    pub fn needs_rotation(&self, pending: u64) -> bool {
        let max = self.config.max_file_size;
        let current = self.current_size();
        max != 0 && current.saturating_add(pending) > max
    }

    /// 按需轮转，返回是否发生了轮转
    pub fn rotate_if_needed(&mut self, pending: u64) -> Result<bool> {
        if !self.needs_rotation(pending) {
            return Ok(false);
        }
        self.rotate()?;
        Ok(true)
    }

    /// 立即轮转
    pub fn rotate(&mut self) -> Result<()> {
        let Some(mut live) = self.live.take() else {
            return Err(Error::Closed);
        };
        self.state = RotationState::Rotating;

        match live.close().and_then(|()| self.rotate_closed()) {
            Ok(sink) => {
                self.live = Some(sink);
                self.state = RotationState::Writing;
                self.rotations += 1;
                Ok(())
            }
            Err(err) => {
                self.state = RotationState::Closed;
                Err(err)
            }
        }
    }

    fn rotate_closed(&mut self) -> Result<FileSink> {
        let archive_path = self.next_archive_path();
        fs::rename(&self.base_path, &archive_path)
            .map_err(|e| Error::file(FileOp::Rename, &self.base_path, e))?;

        let mut archived = FileInfo::stat(&archive_path)?;
        if let Some(head) = self.catalog.head() {
            archived.modified = archived.modified.max(head.modified);
        }
        if self.catalog.is_empty() {
            self.catalog.insert(archived)?;
        } else {
            self.catalog.update(0, archived);
        }

        // 为新的活动文件留出位置
        while self.catalog.len() >= self.catalog.capacity() {
            let Some(oldest) = self.catalog.evict_oldest() else {
                break;
            };
            self.remove_archive(&oldest);
        }

        let sink = FileSink::with_buffer_size(&self.base_path, self.buffer_size)?;
        let mut live = FileInfo::stat(&self.base_path)?;
        if let Some(head) = self.catalog.head()
            && live.modified <= head.modified
        {
            live.modified = head.modified + 1;
        }
        self.catalog.insert(live)?;
        Ok(sink)
    }

    fn remove_archive(&self, info: &FileInfo) {
        if let Err(err) = fs::remove_file(&info.path) {
            let err = Error::file(FileOp::Remove, &info.path, err);
            self.errors.report(ErrorKind::FileSystem, &err.to_string());
        }
    }

    fn next_archive_path(&mut self) -> PathBuf {
        let now = Local::now().naive_local();
        let mut stamp = now.with_nanosecond(0).unwrap_or(now);
        if let Some(last) = self.last_stamp
            && stamp <= last
        {
            stamp = last + TimeDelta::seconds(1);
        }

        loop {
            let path = self.archive_path(&stamp);
            if !path.exists() && !self.catalog.contains_path(&path) {
                self.last_stamp = Some(stamp);
                return path;
            }
            stamp += TimeDelta::seconds(1);
        }
    }

    fn archive_path(&self, stamp: &NaiveDateTime) -> PathBuf {
        let name = format!("{}.{}", self.base_name, stamp.format(ARCHIVE_STAMP_FORMAT));
        self.config.directory.join(name)
    }
}

impl Sink for RotationManager {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let pending = data.len() as u64;
        self.rotate_if_needed(pending)?;

        let live = self.live.as_mut().ok_or(Error::Closed)?;
        live.write(data)?;
        if let Some(head) = self.catalog.head_mut() {
            head.size += pending;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.live.as_mut() {
            Some(live) => live.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state = RotationState::Closed;
        match self.live.take() {
            Some(mut live) => live.close(),
            None => Ok(()),
        }
    }
}

/// 从归档文件名中解析时间戳
fn archive_stamp(path: &Path, base_name: &str) -> Option<NaiveDateTime> {
    let name = path.file_name()?.to_str()?;
    let suffix = name.strip_prefix(base_name)?.strip_prefix('.')?;
    NaiveDateTime::parse_from_str(suffix, ARCHIVE_STAMP_FORMAT).ok()
}
