//! 唯一的写入上下文：格式化器 + 输出目标 + 统计计数

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Record;
use crate::error::{Error, Result};
use crate::format::Formatter;
use crate::report::ErrorSink;
use crate::sink::Sink;

/// 发送/写入/丢弃/失败计数
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) sent: AtomicUsize,
    pub(crate) written: AtomicUsize,
    pub(crate) dropped: AtomicUsize,
    pub(crate) failed: AtomicUsize,
}

impl Counters {
    /// 已经有结果（写入、丢弃或失败）的记录数
    pub(crate) fn settled(&self) -> usize {
        self.written.load(Ordering::Acquire)
            + self.dropped.load(Ordering::Acquire)
            + self.failed.load(Ordering::Acquire)
    }
}

/// 写入上下文
///
/// 同一时刻只被一个线程持有，格式化与I/O都在这里完成。
pub(crate) struct Writer {
    formatter: Arc<dyn Formatter>,
    sink: Box<dyn Sink>,
    errors: Arc<dyn ErrorSink>,
    counters: Arc<Counters>,
}

impl Writer {
    pub(crate) fn new(
        formatter: Arc<dyn Formatter>,
        sink: Box<dyn Sink>,
        errors: Arc<dyn ErrorSink>,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            formatter,
            sink,
            errors,
            counters,
        }
    }

    /// 格式化并写出一条记录，失败时上报给错误接收器
    pub(crate) fn write_record(&mut self, record: &Record) {
        let line = self.formatter.format(record);
        match self.sink.write(line.as_bytes()) {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::AcqRel);
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::AcqRel);
                self.report(&err);
            }
        }
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        self.sink.close()
    }

    pub(crate) fn report(&self, err: &Error) {
        self.errors.report(err.kind(), &err.to_string());
    }
}
