/*!
日志库的错误处理模块。

错误分为三类：资源耗尽、文件系统故障与误用，见 [`ErrorKind`]。
初始化与轮转失败通过 [`Result`] 返回给调用方；后台写入失败只能通过错误接收器观察。
*/

use std::fmt;
use std::io;
use std::path::PathBuf;

/// 错误分类，传给错误接收器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 资源耗尽，如内存不足或无法创建线程
    ResourceExhausted,
    /// 文件系统故障（open/stat/rename/remove）
    FileSystem,
    /// 误用，如在关闭后写入或配置无效
    Misuse,
}

impl ErrorKind {
    /// 获取分类的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::FileSystem => "file system",
            ErrorKind::Misuse => "misuse",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 失败的文件系统操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// 打开文件
    Open,
    /// 读取元数据
    Stat,
    /// 重命名
    Rename,
    /// 删除
    Remove,
    /// 遍历目录
    ReadDir,
    /// 创建目录
    CreateDir,
    /// 写入
    Write,
    /// 刷新
    Flush,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileOp::Open => "open",
            FileOp::Stat => "stat",
            FileOp::Rename => "rename",
            FileOp::Remove => "remove",
            FileOp::ReadDir => "read directory",
            FileOp::CreateDir => "create directory",
            FileOp::Write => "write",
            FileOp::Flush => "flush",
        };
        f.write_str(s)
    }
}

/// 日志库的错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 进程级日志器已经注册
    #[error("logger already initialized")]
    AlreadyInitialized,

    /// 日志器或输出目标已经关闭
    #[error("log stream closed")]
    Closed,

    /// 配置错误，如无效的配置值
    #[error("configuration error: {0}")]
    Config(&'static str),

    /// 归档目录已满，插入前必须先淘汰
    #[error("archive catalog full (capacity {capacity})")]
    CapacityExceeded {
        /// 目录容量
        capacity: usize,
    },

    /// 针对某个路径的文件系统操作失败
    #[error("failed to {op} {}: {source}", .path.display())]
    File {
        /// 失败的操作
        op: FileOp,
        /// 操作的路径
        path: PathBuf,
        /// 底层I/O错误
        #[source]
        source: io::Error,
    },

    /// 不带路径的I/O错误，如写入标准输出失败
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 无法创建后台工作线程
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// 后台工作线程异常退出
    #[error("worker thread panicked")]
    WorkerPanicked,
}

impl Error {
    /// 构造文件系统错误
    pub fn file(op: FileOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::File {
            op,
            path: path.into(),
            source,
        }
    }

    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::File { source, .. } | Error::Io(source) => {
                if source.kind() == io::ErrorKind::OutOfMemory {
                    ErrorKind::ResourceExhausted
                } else {
                    ErrorKind::FileSystem
                }
            }
            Error::WorkerSpawn(_) => ErrorKind::ResourceExhausted,
            Error::AlreadyInitialized
            | Error::Closed
            | Error::Config(_)
            | Error::CapacityExceeded { .. }
            | Error::WorkerPanicked => ErrorKind::Misuse,
        }
    }
}

/// 结果类型别名，简化错误处理
pub type Result<T> = std::result::Result<T, Error>;
