/*!
日志记录结构。

消息在调用线程上完成格式化，记录构造后不可变，可以安全地跨线程移动。
*/

use chrono::{DateTime, Local};
use std::fmt;

use crate::Level;

/// 调用位置：源文件、函数名、行号
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    file: &'static str,
    function: &'static str,
    line: u32,
}

impl Location {
    /// 创建调用位置，通常由日志宏生成
    #[inline]
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// 源文件路径
    #[inline]
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// 函数名
    #[inline]
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// 行号
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// 日志记录结构体
///
/// 时间戳在构造时捕获（即发出或入队的时刻），而不是在后台线程写出时。
#[derive(Clone, Debug)]
pub struct Record {
    level: Level,
    timestamp: DateTime<Local>,
    location: Location,
    message: String,
}

impl Record {
    /// 创建新的日志记录，时间戳取当前本地时间
    #[inline]
    pub fn new(level: Level, location: Location, message: String) -> Self {
        Self::with_timestamp(level, Local::now(), location, message)
    }

    /// 使用给定时间戳创建日志记录
    #[inline]
    pub fn with_timestamp(
        level: Level,
        timestamp: DateTime<Local>,
        location: Location,
        message: String,
    ) -> Self {
        Self {
            level,
            timestamp,
            location,
            message,
        }
    }

    /// 获取日志级别
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// 获取时间戳
    #[inline]
    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    /// 获取调用位置
    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// 获取文件路径
    #[inline]
    pub fn file(&self) -> &'static str {
        self.location.file
    }

    /// 获取函数名
    #[inline]
    pub fn function(&self) -> &'static str {
        self.location.function
    }

    /// 获取行号
    #[inline]
    pub fn line(&self) -> u32 {
        self.location.line
    }

    /// 获取消息内容
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 消费记录并返回消息内容
    #[inline]
    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}:{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.location.file,
            self.location.line,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = Record::new(
            Level::Info,
            Location::new("src/test_file.rs", "handler", 42),
            "Test message".to_string(),
        );

        assert_eq!(record.level(), Level::Info);
        assert_eq!(record.file(), "src/test_file.rs");
        assert_eq!(record.function(), "handler");
        assert_eq!(record.line(), 42);
        assert_eq!(record.message(), "Test message");
        assert!(record.timestamp().timestamp() > 0);
    }

    #[test]
    fn test_record_timestamp_captured_at_construction() {
        let before = Local::now();
        let record = Record::new(
            Level::Warn,
            Location::new("a.rs", "f", 1),
            "late".to_string(),
        );
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(*record.timestamp() >= before);
        assert!(*record.timestamp() < Local::now());
    }

    #[test]
    fn test_record_into_message() {
        let record = Record::new(
            Level::Error,
            Location::new("test.rs", "main", 10),
            "Error message".to_string(),
        );

        let message = record.into_message();
        assert_eq!(message, "Error message");
    }
}
