/*!
异步分发队列与后台工作线程。

队列是固定容量的环形缓冲区，是生产者与唯一消费者之间唯一的共享结构。
互斥锁只在 O(1) 的下标维护期间持有，格式化与I/O都在锁外、在工作线程上完成。

## 溢出策略

队列写满时丢弃最旧的未写出记录，新记录总是被接受：
日志调用在高负载下既不阻塞也不失败。

## 关闭

关闭时先清除运行标志并唤醒工作线程，工作线程写完剩余记录后退出；
随后在关闭线程上写出仍留在队列中的记录。关闭本身不丢失任何已入队的记录。
运行标志与环形缓冲区受同一把锁保护，关闭之后的入队返回 [`Enqueue::Closed`]，
记录不会进入队列。
*/

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::Record;
use crate::error::{Error, Result};
use crate::writer::Writer;

struct Ring {
    slots: Vec<Option<Record>>,
    head: usize,
    tail: usize,
    count: usize,
    running: bool,
}

impl Ring {
    fn push(&mut self, record: Record) -> bool {
        let capacity = self.slots.len();
        if self.count < capacity {
            self.slots[self.tail] = Some(record);
            self.tail = (self.tail + 1) % capacity;
            self.count += 1;
            false
        } else {
            // 满：覆盖最旧的一条，head 与 tail 同时前移
            let dropped = self.slots[self.head].replace(record);
            self.head = (self.head + 1) % capacity;
            self.tail = (self.tail + 1) % capacity;
            dropped.is_some()
        }
    }

    fn pop(&mut self) -> Option<Record> {
        if self.count == 0 {
            return None;
        }
        let record = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        record
    }
}

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// 记录已入队
    Accepted,
    /// 记录已入队，队列已满，最旧的一条被丢弃
    DroppedOldest,
    /// 队列已关闭，记录被拒绝
    Closed,
}

/// 有界分发队列
pub struct DispatchQueue {
    ring: Mutex<Ring>,
    not_empty: Condvar,
    capacity: usize,
}

impl DispatchQueue {
    /// 创建容量为 `capacity` 的队列
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("queue capacity must be at least 1"));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                running: true,
            }),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 入队，从不阻塞
    pub fn enqueue(&self, record: Record) -> Enqueue {
        let outcome = {
            let mut ring = self.lock();
            if !ring.running {
                return Enqueue::Closed;
            }
            if ring.push(record) {
                Enqueue::DroppedOldest
            } else {
                Enqueue::Accepted
            }
        };
        self.not_empty.notify_one();
        outcome
    }

    /// 阻塞出队
    ///
    /// 队列为空时等待；队列已关闭且为空时返回 `None`。
    pub fn pop(&self) -> Option<Record> {
        let guard = self.lock();
        let mut ring = self
            .not_empty
            .wait_while(guard, |ring| ring.count == 0 && ring.running)
            .unwrap_or_else(|e| e.into_inner());
        ring.pop()
    }

    /// 非阻塞出队
    pub fn try_pop(&self) -> Option<Record> {
        self.lock().pop()
    }

    /// 清除运行标志并唤醒所有等待者
    pub fn close(&self) {
        self.lock().running = false;
        self.not_empty.notify_all();
    }

    /// 按入队顺序取出全部剩余记录
    pub fn drain(&self) -> Vec<Record> {
        let mut ring = self.lock();
        let mut records = Vec::with_capacity(ring.count);
        while let Some(record) = ring.pop() {
            records.push(record);
        }
        records
    }

    /// 是否仍在运行
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.lock().count
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// 后台工作线程
///
/// 线程退出时把写入上下文交还给关闭方。
pub(crate) struct Worker {
    handle: JoinHandle<Writer>,
}

impl Worker {
    pub(crate) fn spawn(queue: Arc<DispatchQueue>, writer: Writer) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("rotalog-worker".to_string())
            .spawn(move || run(&queue, writer))
            .map_err(Error::WorkerSpawn)?;
        Ok(Self { handle })
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn join(self) -> Result<Writer> {
        self.handle.join().map_err(|_| Error::WorkerPanicked)
    }
}

fn run(queue: &DispatchQueue, mut writer: Writer) -> Writer {
    while let Some(record) = queue.pop() {
        writer.write_record(&record);
    }
    writer
}
