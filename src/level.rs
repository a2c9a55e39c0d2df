//! 日志级别定义

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// 日志级别枚举，按严重程度递增排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// 调试级别 - 调试信息，用于开发阶段
    Debug = 0,
    /// 信息级别 - 常规信息，用于生产环境
    #[default]
    Info = 1,
    /// 警告级别 - 警告信息，需要关注但不会影响程序运行
    Warn = 2,
    /// 错误级别 - 错误信息，需要立即处理
    Error = 3,
}

impl Level {
    /// 获取级别的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// 左对齐并补齐到5个字符的级别名，对应 `%l`
    pub fn padded(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO ",
            Level::Warn => "WARN ",
            Level::Error => "ERROR",
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    /// 从字符串解析级别（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            _ => Err(Error::Config("unknown log level")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

impl From<Level> for log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => log::LevelFilter::Trace,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error => log::LevelFilter::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_level_padded() {
        assert_eq!(Level::Warn.padded(), "WARN ");
        assert_eq!(Level::Info.padded(), "INFO ");
        assert_eq!(format!("{:5}", Level::Warn), Level::Warn.padded());
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("warn".parse::<Level>().ok(), Some(Level::Warn));
        assert_eq!(" Error ".parse::<Level>().ok(), Some(Level::Error));
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_from_log_crate() {
        assert_eq!(Level::from(log::Level::Trace), Level::Debug);
        assert_eq!(Level::from(log::Level::Warn), Level::Warn);
    }
}
