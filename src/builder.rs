/*!
日志器配置与构建器。

[`Config`] 是纯数据配置，[`LoggerBuilder`] 提供流畅的构建接口，并允许注入
自定义的格式化器、输出目标和错误接收器。所有校验都在 `build()` 中完成。
*/

use std::sync::Arc;

use crate::Level;
use crate::error::{Error, Result};
use crate::format::{DEFAULT_PATTERN, Formatter, PatternFormatter};
use crate::logger::Logger;
use crate::report::{ErrorLog, ErrorSink};
use crate::rotation::{RotationConfig, RotationManager};
use crate::sink::{CompositeSink, ConsoleSink, DEFAULT_BUFFER_SIZE, Sink};

/// 默认队列容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// 输出目标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// 标准输出
    #[default]
    Stdout,
    /// 轮转文件
    File,
    /// 同时输出到标准输出和轮转文件
    Both,
}

impl Output {
    fn from_flags(console: bool, file: bool) -> Self {
        match (console, file) {
            (true, true) => Output::Both,
            (false, true) => Output::File,
            _ => Output::Stdout,
        }
    }

    /// 是否包含标准输出
    pub fn has_console(&self) -> bool {
        matches!(self, Output::Stdout | Output::Both)
    }

    /// 是否包含文件
    pub fn has_file(&self) -> bool {
        matches!(self, Output::File | Output::Both)
    }
}

/// 日志器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 输出目标
    pub output: Output,
    /// 最低日志级别
    pub level: Level,
    /// 格式模板
    pub pattern: String,
    /// 是否使用异步模式
    pub async_mode: bool,
    /// 异步队列容量
    pub queue_capacity: usize,
    /// 文件写缓冲区大小
    pub buffer_size: usize,
    /// 文件轮转配置，输出包含文件时必须提供
    pub rotation: Option<RotationConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: Output::Stdout,
            level: Level::Info,
            pattern: DEFAULT_PATTERN.to_string(),
            async_mode: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            rotation: None,
        }
    }
}

impl Config {
    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.async_mode && self.queue_capacity == 0 {
            return Err(Error::Config("queue capacity must be at least 1"));
        }
        if self.output.has_file() {
            let rotation = self
                .rotation
                .as_ref()
                .ok_or(Error::Config("file output requires a rotation config"))?;
            rotation.validate()?;
        }
        Ok(())
    }
}

/// 日志器构建器
pub struct LoggerBuilder {
    config: Config,
    output_set: bool,
    formatter: Option<Arc<dyn Formatter>>,
    sink: Option<Box<dyn Sink>>,
    error_sink: Option<Arc<dyn ErrorSink>>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl LoggerBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有配置开始构建
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            output_set: false,
            formatter: None,
            sink: None,
            error_sink: None,
        }
    }

    /// 当前配置
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 设置日志级别
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// 设置为调试级别 (便捷方法)
    pub fn with_debug_level(self) -> Self {
        self.level(Level::Debug)
    }

    /// 设置格式模板
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    /// 设置自定义格式化器，优先于格式模板
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// 设置输出目标
    pub fn output(mut self, output: Output) -> Self {
        self.config.output = output;
        self.output_set = true;
        self
    }

    fn add_output(mut self, console: bool, file: bool) -> Self {
        let current = self.config.output;
        let (has_console, has_file) = if self.output_set {
            (current.has_console(), current.has_file())
        } else {
            (false, false)
        };
        self.output(Output::from_flags(has_console || console, has_file || file))
    }

    /// 增加控制台输出 (便捷方法)
    ///
    /// 与 [`with_file_output`](Self::with_file_output) 组合时与调用顺序无关。
    pub fn with_console_output(self) -> Self {
        self.add_output(true, false)
    }

    /// 增加轮转文件输出 (便捷方法)
    pub fn with_file_output(mut self, rotation: RotationConfig) -> Self {
        self.config.rotation = Some(rotation);
        self.add_output(false, true)
    }

    /// 设置轮转配置（不改变输出目标）
    pub fn rotation(mut self, rotation: RotationConfig) -> Self {
        self.config.rotation = Some(rotation);
        self
    }

    /// 设置单个文件的最大字节数，需要先设置轮转配置
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        let rotation = self.config.rotation.take().unwrap_or_default();
        self.config.rotation = Some(rotation.max_file_size(bytes));
        self
    }

    /// 设置保留的归档数量
    pub fn max_archives(mut self, count: usize) -> Self {
        let rotation = self.config.rotation.take().unwrap_or_default();
        self.config.rotation = Some(rotation.max_archives(count));
        self
    }

    /// 使用异步模式
    pub fn asynchronous(mut self) -> Self {
        self.config.async_mode = true;
        self
    }

    /// 使用同步模式
    pub fn synchronous(mut self) -> Self {
        self.config.async_mode = false;
        self
    }

    /// 设置队列容量
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// 设置文件写缓冲区大小
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    /// 设置自定义输出目标，替代按 [`Output`] 打开的输出
    pub fn sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 设置错误接收器，默认为 [`ErrorLog`]
    pub fn error_sink(mut self, error_sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = Some(error_sink);
        self
    }

    /// 构建日志器
    ///
    /// 输出包含文件时在这里扫描目录并打开活动文件，失败直接返回。
    pub fn build(self) -> Result<Logger> {
        let Self {
            config,
            formatter,
            sink,
            error_sink,
            ..
        } = self;
        config.validate()?;

        let errors = error_sink.unwrap_or_else(|| Arc::new(ErrorLog::default()));
        let formatter =
            formatter.unwrap_or_else(|| Arc::new(PatternFormatter::new(config.pattern.as_str())));
        let sink = match sink {
            Some(sink) => sink,
            None => open_output(&config, &errors)?,
        };

        Logger::start(
            config.level,
            config.async_mode.then_some(config.queue_capacity),
            formatter,
            sink,
            errors,
        )
    }
}

fn open_output(config: &Config, errors: &Arc<dyn ErrorSink>) -> Result<Box<dyn Sink>> {
    let open_file = || -> Result<RotationManager> {
        let rotation = config
            .rotation
            .clone()
            .ok_or(Error::Config("file output requires a rotation config"))?;
        RotationManager::open(rotation, config.buffer_size, errors.clone())
    };

    let sink: Box<dyn Sink> = match config.output {
        Output::Stdout => Box::new(ConsoleSink::new()),
        Output::File => Box::new(open_file()?),
        Output::Both => Box::new(
            CompositeSink::new()
                .with(Box::new(ConsoleSink::new()))
                .with(Box::new(open_file()?)),
        ),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggerBuilder::new();
        let config = builder.config();
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.output, Output::Stdout);
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert!(config.async_mode);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.rotation.is_none());
    }

    #[test]
    fn test_builder_configuration_methods() {
        let builder = LoggerBuilder::new()
            .with_debug_level()
            .pattern("%m")
            .synchronous()
            .queue_capacity(16)
            .buffer_size(512)
            .max_file_size(2048)
            .max_archives(7);

        let config = builder.config();
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.pattern, "%m");
        assert!(!config.async_mode);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.buffer_size, 512);
        let rotation = config.rotation.as_ref().unwrap();
        assert_eq!(rotation.max_file_size, 2048);
        assert_eq!(rotation.max_archives, 7);
    }

    #[test]
    fn test_console_and_file_order_insensitive() {
        let rotation = RotationConfig::new("logs", "app", ".log");
        let a = LoggerBuilder::new()
            .with_console_output()
            .with_file_output(rotation.clone());
        let b = LoggerBuilder::new()
            .with_file_output(rotation)
            .with_console_output();
        assert_eq!(a.config().output, Output::Both);
        assert_eq!(b.config().output, Output::Both);

        let file_only = LoggerBuilder::new().with_file_output(RotationConfig::default());
        assert_eq!(file_only.config().output, Output::File);
    }

    #[test]
    fn test_validation() {
        let zero_queue = LoggerBuilder::new().queue_capacity(0).build();
        assert!(matches!(zero_queue, Err(Error::Config(_))));

        // 同步模式不使用队列
        let sync = LoggerBuilder::new().synchronous().queue_capacity(0).build();
        assert!(sync.is_ok());

        let no_rotation = LoggerBuilder::new().output(Output::File).build();
        assert!(matches!(no_rotation, Err(Error::Config(_))));

        let empty_name = LoggerBuilder::new()
            .with_file_output(RotationConfig::new("logs", "", ".log"))
            .build();
        assert!(matches!(empty_name, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let logger = LoggerBuilder::new()
            .synchronous()
            .with_file_output(RotationConfig::new(dir.path(), "svc", ".log"))
            .build()
            .unwrap();
        assert!(!logger.is_async());
        assert!(dir.path().join("svc.log").is_file());
    }

    #[test]
    fn test_logger_new_from_config() {
        let config = Config {
            level: Level::Warn,
            async_mode: false,
            ..Config::default()
        };
        let logger = Logger::new(config).unwrap();
        assert_eq!(logger.level(), Level::Warn);
        assert!(!logger.is_async());
    }
}
