/*!
日志输出目标。

输出目标只被一个写入上下文持有（同步模式下受写入锁保护，异步模式下属于后台线程），
因此接口使用 `&mut self`，实现内部不需要再加锁。
*/

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, FileOp, Result};

/// 默认写缓冲区大小
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// 输出目标接口
pub trait Sink: Send {
    /// 写入一行已格式化的日志
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// 刷新输出缓冲区
    fn flush(&mut self) -> Result<()>;

    /// 刷新并关闭输出目标，之后的写入返回 [`Error::Closed`]
    fn close(&mut self) -> Result<()>;
}

/// 标准输出目标
#[derive(Debug, Default)]
pub struct ConsoleSink {
    closed: bool,
}

impl ConsoleSink {
    /// 创建新的控制台输出目标
    pub fn new() -> Self {
        Self { closed: false }
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        io::stdout().lock().write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            io::stdout().flush()?;
        }
        Ok(())
    }
}

/// 文件输出目标
///
/// 以追加模式打开，外部的 `tail` 之类读者能看到一致的数据流。
/// 每次写入之后立即刷新应用层缓冲区，崩溃时最多丢失操作系统层的缓冲。
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// 以默认缓冲区大小打开文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// 以指定缓冲区大小打开文件，必要时创建父目录
    pub fn with_buffer_size<P: AsRef<Path>>(path: P, buffer_size: usize) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| Error::file(FileOp::CreateDir, parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::file(FileOp::Open, path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::with_capacity(buffer_size, file)),
        })
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件是否仍处于打开状态
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Sink for FileSink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::Closed)?;
        writer
            .write_all(data)
            .map_err(|e| Error::file(FileOp::Write, &self.path, e))?;
        writer
            .flush()
            .map_err(|e| Error::file(FileOp::Flush, &self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer
                .flush()
                .map_err(|e| Error::file(FileOp::Flush, &self.path, e)),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| Error::file(FileOp::Flush, &self.path, e))?;
        }
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// 内存输出目标（用于测试和调试）
///
/// 克隆出的句柄共享同一块缓冲区。
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// 创建新的内存输出目标
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取缓冲区内容
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 以字符串形式获取缓冲区内容
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// 按行获取缓冲区内容
    pub fn lines(&self) -> Vec<String> {
        self.contents_string().lines().map(str::to_string).collect()
    }

    /// 清空缓冲区
    pub fn clear(&self) {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Sink for MemorySink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 复合输出目标（同时写入多个输出目标）
///
/// 某个目标失败时其余目标照常写入，返回第一个错误。
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Box<dyn Sink>>,
}

impl CompositeSink {
    /// 创建新的复合输出目标
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// 添加输出目标
    pub fn add_sink(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// 链式添加输出目标
    pub fn with(mut self, sink: Box<dyn Sink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// 输出目标数量
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// 是否没有输出目标
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&mut self, mut op: impl FnMut(&mut dyn Sink) -> Result<()>) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = op(sink.as_mut())
                && first_err.is_none()
            {
                first_err = Some(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Sink for CompositeSink {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.each(|sink| sink.write(data))
    }

    fn flush(&mut self) -> Result<()> {
        self.each(|sink| sink.flush())
    }

    fn close(&mut self) -> Result<()> {
        self.each(|sink| sink.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");

        let mut sink = FileSink::open(&path).unwrap();
        sink.write(b"first\n").unwrap();
        // 每次写入后立即可见
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
        sink.close().unwrap();

        let mut sink = FileSink::with_buffer_size(&path, 64).unwrap();
        sink.write(b"second\n").unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_file_sink_write_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path().join("a.log")).unwrap();
        sink.close().unwrap();
        assert!(!sink.is_open());
        assert!(matches!(sink.write(b"late\n"), Err(Error::Closed)));
        // 重复关闭是无操作
        assert!(sink.close().is_ok());
    }

    #[test]
    fn test_file_sink_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        // 目录不能作为文件打开
        let err = FileSink::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::File { op: FileOp::Open, .. }));
    }

    #[test]
    fn test_memory_sink_shared_buffer() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.write(b"a\n").unwrap();
        handle.write(b"b\n").unwrap();
        assert_eq!(sink.lines(), vec!["a", "b"]);

        sink.clear();
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_composite_sink_fans_out() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let mut composite = CompositeSink::new()
            .with(Box::new(first.clone()))
            .with(Box::new(second.clone()));
        assert_eq!(composite.len(), 2);

        composite.write(b"both\n").unwrap();
        assert_eq!(first.contents_string(), "both\n");
        assert_eq!(second.contents_string(), "both\n");
    }

    #[test]
    fn test_composite_sink_continues_after_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut closed = FileSink::open(dir.path().join("c.log")).unwrap();
        closed.close().unwrap();

        let memory = MemorySink::new();
        let mut composite = CompositeSink::new()
            .with(Box::new(closed))
            .with(Box::new(memory.clone()));

        assert!(matches!(composite.write(b"x\n"), Err(Error::Closed)));
        assert_eq!(memory.contents_string(), "x\n");
    }
}
