/*!
可嵌入的日志库：同步或异步写入、可配置的行格式、按大小轮转并限制归档数量。

## 组成

- [`Logger`]：级别过滤、构造记录、按模式选择同步写入或放入分发队列
- [`DispatchQueue`]：固定容量的环形队列，满时丢弃最旧的记录，生产者从不阻塞
- [`PatternFormatter`]：把记录渲染成一行文本
- [`RotationManager`]：活动文件超过大小上限时重命名为带时间戳的归档，淘汰最旧的归档
- [`Catalog`]：一个日志流的文件列表，按修改时间严格降序
- [`ErrorSink`]：错误遥测，默认实现 [`ErrorLog`] 保留最近的错误事件

## 使用示例

```no_run
use rotalog_rs::{Level, Logger, RotationConfig, info, warn};

let rotation = RotationConfig::new("logs", "app", ".log")
    .max_file_size(10 * 1024 * 1024)
    .max_archives(5);

let logger = Logger::builder()
    .level(Level::Info)
    .with_file_output(rotation)
    .with_console_output()
    .build()?;

info!(logger, "server started on port {}", 8080);
warn!(logger, "cache miss ratio {:.2}", 0.42);

logger.shutdown()?;
# Ok::<(), rotalog_rs::Error>(())
```
*/

#![warn(missing_docs)]

pub mod builder;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod level;
pub mod logger;
pub mod macros;
pub mod record;
pub mod report;
pub mod rotation;
pub mod sink;
mod writer;

// 公共API导出
pub use crate::builder::{Config, DEFAULT_QUEUE_CAPACITY, LoggerBuilder, Output};
pub use crate::catalog::{Catalog, FileInfo};
pub use crate::dispatch::{DispatchQueue, Enqueue};
pub use crate::error::{Error, ErrorKind, FileOp, Result};
pub use crate::format::{DEFAULT_PATTERN, Formatter, PatternFormatter};
pub use crate::level::Level;
pub use crate::logger::{Logger, Stats};
// 宏通过#[macro_export]自动导出
pub use crate::record::{Location, Record};
pub use crate::report::{ErrorEvent, ErrorLog, ErrorSink, StderrErrorSink};
pub use crate::rotation::{RotationConfig, RotationManager, RotationState};
pub use crate::sink::{CompositeSink, ConsoleSink, FileSink, MemorySink, Sink};
