/*!
错误接收器。

引擎在分配失败、I/O失败或误用时调用错误接收器。接收器只做记录，不影响控制流。
默认实现 [`ErrorLog`] 保留最近N条错误事件，满时丢弃最旧的一条。
*/

use chrono::{DateTime, Local};
use crossbeam_queue::ArrayQueue;
use std::io::{self, Write};

use crate::error::ErrorKind;

/// 默认保留的错误事件数量
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 128;

/// 错误接收器接口
pub trait ErrorSink: Send + Sync {
    /// 报告一条错误
    fn report(&self, kind: ErrorKind, message: &str);
}

/// 一条错误事件
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// 错误分类
    pub kind: ErrorKind,
    /// 可读的错误描述
    pub message: String,
    /// 记录时刻
    pub timestamp: DateTime<Local>,
}

/// 有界错误日志
///
/// 基于无锁环形队列，写满后 `force_push` 覆盖最旧的事件。
pub struct ErrorLog {
    events: ArrayQueue<ErrorEvent>,
}

impl ErrorLog {
    /// 创建容量为 `capacity` 的错误日志（至少为1）
    pub fn new(capacity: usize) -> Self {
        Self {
            events: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// 当前保存的事件数
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// 是否没有事件
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    /// 取出全部事件（从旧到新），错误日志随之清空
    pub fn drain(&self) -> Vec<ErrorEvent> {
        let mut events = Vec::with_capacity(self.events.len());
        while let Some(event) = self.events.pop() {
            events.push(event);
        }
        events
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl ErrorSink for ErrorLog {
    fn report(&self, kind: ErrorKind, message: &str) {
        let _ = self.events.force_push(ErrorEvent {
            kind,
            message: message.to_string(),
            timestamp: Local::now(),
        });
    }
}

/// 将错误打印到标准错误输出
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrErrorSink;

impl ErrorSink for StderrErrorSink {
    fn report(&self, kind: ErrorKind, message: &str) {
        let _ = writeln!(io::stderr(), "rotalog: {}: {}", kind, message);
    }
}
