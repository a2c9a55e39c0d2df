/*!
日志器门面。

`Logger` 是一个普通的拥有型实例，没有全局可变状态。运行时标志决定写入方式：

- 同步模式：调用线程在写入锁内完成格式化、轮转和写入
- 异步模式：调用线程构造记录后放入分发队列，由唯一的后台线程格式化并写出

两种模式共用同一个写入上下文，相同的记录产生逐字节相同的输出。

## 使用示例

```no_run
use rotalog_rs::{Level, Logger, RotationConfig, info};

let logger = Logger::builder()
    .level(Level::Debug)
    .with_file_output(RotationConfig::new("logs", "server", ".log").max_archives(3))
    .build()
    .unwrap();

info!(logger, "listening on {}", 8080);
logger.shutdown().unwrap();
```
*/

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread;

use crate::builder::{Config, LoggerBuilder};
use crate::dispatch::{DispatchQueue, Enqueue, Worker};
use crate::error::{Error, ErrorKind, Result};
use crate::format::Formatter;
use crate::report::ErrorSink;
use crate::sink::Sink;
use crate::writer::{Counters, Writer};
use crate::{Level, Location, Record};

/// 发送/写入/丢弃/失败统计
///
/// 每条被接受的记录最终恰好落入写入、丢弃、失败三者之一。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// 通过级别过滤并被接受的记录数
    pub sent: usize,
    /// 成功写出的记录数
    pub written: usize,
    /// 队列溢出时被丢弃的记录数
    pub dropped: usize,
    /// 写入失败的记录数
    pub failed: usize,
}

impl Stats {
    /// 尚未有结果的记录数
    pub fn pending(&self) -> usize {
        self.sent
            .saturating_sub(self.written + self.dropped + self.failed)
    }
}

enum Mode {
    Sync(Mutex<Option<Writer>>),
    Async {
        queue: Arc<DispatchQueue>,
        worker: Mutex<Option<Worker>>,
    },
}

/// 日志器
pub struct Logger {
    level: Level,
    mode: Mode,
    errors: Arc<dyn ErrorSink>,
    counters: Arc<Counters>,
    closed: AtomicBool,
}

static INSTALLED: OnceLock<Logger> = OnceLock::new();

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Logger {
    /// 创建新的构建器
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// 按配置创建日志器
    pub fn new(config: Config) -> Result<Self> {
        LoggerBuilder::from_config(config).build()
    }

    /// `queue_capacity` 为 `None` 时使用同步模式
    pub(crate) fn start(
        level: Level,
        queue_capacity: Option<usize>,
        formatter: Arc<dyn Formatter>,
        sink: Box<dyn Sink>,
        errors: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        let counters = Arc::new(Counters::default());
        let writer = Writer::new(formatter, sink, errors.clone(), counters.clone());

        let mode = match queue_capacity {
            None => Mode::Sync(Mutex::new(Some(writer))),
            Some(capacity) => {
                let queue = Arc::new(DispatchQueue::new(capacity)?);
                let worker = Worker::spawn(queue.clone(), writer)?;
                Mode::Async {
                    queue,
                    worker: Mutex::new(Some(worker)),
                }
            }
        };

        Ok(Self {
            level,
            mode,
            errors,
            counters,
            closed: AtomicBool::new(false),
        })
    }

    /// 检查是否应该记录指定级别的日志
    pub fn should_log(&self, level: Level) -> bool {
        level >= self.level
    }

    /// 获取日志级别
    pub fn level(&self) -> Level {
        self.level
    }

    /// 是否为异步模式
    pub fn is_async(&self) -> bool {
        matches!(self.mode, Mode::Async { .. })
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 错误接收器
    pub fn error_sink(&self) -> &Arc<dyn ErrorSink> {
        &self.errors
    }

    /// 记录一条日志
    ///
    /// 低于阈值时不做任何事，参数不会被格式化。消息在调用线程上渲染。
    pub fn log(&self, level: Level, location: Location, args: fmt::Arguments<'_>) {
        if !self.should_log(level) {
            return;
        }
        self.log_record(Record::new(level, location, fmt::format(args)));
    }

    /// 记录一条已构造的日志记录
    ///
    /// 关闭之后调用视为误用：上报给错误接收器，记录被忽略且不计入统计。
    /// 与 [`Logger::shutdown`] 并发时同样如此，被接受的记录不会在关闭中丢失。
    pub fn log_record(&self, record: Record) {
        if !self.should_log(record.level()) {
            return;
        }
        if self.is_closed() {
            self.report_closed();
            return;
        }

        match &self.mode {
            Mode::Sync(writer) => match lock(writer).as_mut() {
                Some(writer) => {
                    self.counters.sent.fetch_add(1, Ordering::AcqRel);
                    writer.write_record(&record);
                }
                None => self.report_closed(),
            },
            Mode::Async { queue, .. } => {
                // 先计入发送再入队：已结算数不会超过发送数
                self.counters.sent.fetch_add(1, Ordering::AcqRel);
                match queue.enqueue(record) {
                    Enqueue::Accepted => {}
                    Enqueue::DroppedOldest => {
                        self.counters.dropped.fetch_add(1, Ordering::AcqRel);
                    }
                    Enqueue::Closed => {
                        self.counters.sent.fetch_sub(1, Ordering::AcqRel);
                        self.report_closed();
                    }
                }
            }
        }
    }

    fn report_closed(&self) {
        self.errors
            .report(ErrorKind::Misuse, "log called after shutdown");
    }

    /// 刷新日志
    ///
    /// 异步模式下等待此前接受的记录全部有结果（写入、丢弃或失败）；
    /// 同步模式下直接刷新输出目标。
    pub fn flush(&self) -> Result<()> {
        match &self.mode {
            Mode::Sync(writer) => match lock(writer).as_mut() {
                Some(writer) => writer.flush(),
                None => Ok(()),
            },
            Mode::Async { worker, .. } => {
                let sent = self.counters.sent.load(Ordering::Acquire);
                while self.counters.settled() < sent {
                    let finished = lock(worker).as_ref().is_none_or(Worker::is_finished);
                    if finished {
                        break;
                    }
                    thread::yield_now();
                }
                Ok(())
            }
        }
    }

    /// 优雅关闭日志器
    ///
    /// 停止后台线程，写出队列中剩余的全部记录，然后关闭输出目标。重复调用是无操作。
    /// 错误只通过返回值交给调用方；日志器被丢弃时才转交错误接收器。
    pub fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        match &self.mode {
            Mode::Sync(writer) => match lock(writer).take() {
                Some(mut writer) => writer.close(),
                None => Ok(()),
            },
            Mode::Async { queue, worker } => {
                queue.close();
                let Some(worker) = lock(worker).take() else {
                    return Ok(());
                };

                match worker.join() {
                    Ok(mut writer) => {
                        for record in queue.drain() {
                            writer.write_record(&record);
                        }
                        writer.close()
                    }
                    Err(err) => {
                        let leftovers = queue.drain().len();
                        self.counters.failed.fetch_add(leftovers, Ordering::AcqRel);
                        Err(err)
                    }
                }
            }
        }
    }

    /// 获取统计信息
    pub fn stats(&self) -> Stats {
        Stats {
            sent: self.counters.sent.load(Ordering::Acquire),
            written: self.counters.written.load(Ordering::Acquire),
            dropped: self.counters.dropped.load(Ordering::Acquire),
            failed: self.counters.failed.load(Ordering::Acquire),
        }
    }

    /// 注册为 `log` crate 的进程级日志器
    ///
    /// 日志器被移入静态存储，返回其引用以便退出前调用 [`Logger::shutdown`]。
    /// 进程内只能成功一次，之后返回 [`Error::AlreadyInitialized`]。
    pub fn install(self) -> Result<&'static Logger> {
        let filter = log::LevelFilter::from(self.level);
        INSTALLED
            .set(self)
            .map_err(|_rejected| Error::AlreadyInitialized)?;
        let logger = INSTALLED.get().ok_or(Error::AlreadyInitialized)?;

        log::set_logger(logger).map_err(|_| Error::AlreadyInitialized)?;
        log::set_max_level(filter);
        Ok(logger)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.should_log(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let level = Level::from(record.level());
        if !self.should_log(level) {
            return;
        }
        let location = Location::new(
            record.file_static().unwrap_or("<unknown>"),
            record.module_path_static().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
        );
        self.log_record(Record::new(level, location, record.args().to_string()));
    }

    fn flush(&self) {
        if let Err(err) = Logger::flush(self) {
            self.errors.report(err.kind(), &err.to_string());
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            self.errors.report(err.kind(), &err.to_string());
        }
    }
}
