use rotalog_rs::{Level, Logger, MemorySink};
use std::sync::Arc;
use std::thread;

#[test]
fn test_macros_with_memory_sink() {
    let mem_sink = MemorySink::new();

    let logger = Logger::builder()
        .level(Level::Debug)
        .pattern("[%l] %m")
        .sink(Box::new(mem_sink.clone()))
        .queue_capacity(1024)
        .build()
        .expect("build logger");

    rotalog_rs::error!(logger, "e1");
    rotalog_rs::warn!(logger, "w1");
    rotalog_rs::info!(logger, "i1");
    rotalog_rs::debug!(logger, "d{}", 1);

    logger.flush().expect("flush");

    assert_eq!(
        mem_sink.lines(),
        vec!["[ERROR] e1", "[WARN ] w1", "[INFO ] i1", "[DEBUG] d1"]
    );
}

#[test]
fn test_macros_respect_threshold() {
    let mem_sink = MemorySink::new();
    let logger = Logger::builder()
        .level(Level::Warn)
        .synchronous()
        .pattern("%l|%m")
        .sink(Box::new(mem_sink.clone()))
        .build()
        .expect("build logger");

    rotalog_rs::debug!(logger, "hidden");
    rotalog_rs::info!(logger, "hidden");
    rotalog_rs::warn!(logger, "shown");
    rotalog_rs::log!(logger, Level::Error, "shown {}", "too");

    assert_eq!(mem_sink.lines(), vec!["WARN |shown", "ERROR|shown too"]);
    assert_eq!(logger.stats().sent, 2);
}

#[test]
fn test_macros_from_many_threads() {
    let mem_sink = MemorySink::new();
    let logger = Arc::new(
        Logger::builder()
            .pattern("%f %m")
            .sink(Box::new(mem_sink.clone()))
            .queue_capacity(4096)
            .build()
            .expect("build logger"),
    );

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    rotalog_rs::info!(logger, "{}-{}", t, i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join producer");
    }
    logger.shutdown().expect("shutdown");

    let lines = mem_sink.lines();
    assert_eq!(lines.len(), 400);
    // 同一线程内的记录保持顺序
    for t in 0..4 {
        let prefix = format!("{}-", t);
        let seen: Vec<usize> = lines
            .iter()
            .filter_map(|line| line.split(' ').nth(1))
            .filter_map(|msg| msg.strip_prefix(&prefix))
            .map(|i| i.parse().expect("index"))
            .collect();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
    // 函数名来自闭包所在的函数
    assert!(lines[0].starts_with("test_macros_from_many_threads "));
}
