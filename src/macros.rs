//! 日志宏模块
//!
//! 宏的第一个参数是日志器（`Logger`、`&Logger` 或 `Arc<Logger>` 均可），
//! 其余参数与 `format!` 相同。宏自动捕获源文件、所在函数和行号。

/// 从 `type_name` 的结果中提取函数名
///
/// `app::server::accept::f` → `accept`，闭包中的 `::{{closure}}` 后缀会被去掉。
#[doc(hidden)]
pub fn short_function_name(type_name: &'static str) -> &'static str {
    let mut name = type_name.strip_suffix("::f").unwrap_or(type_name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// 获取所在函数的名字
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::macros::short_function_name(type_name_of(f))
    }};
}

/// 记录日志的宏实现
///
/// 该宏具有惰性求值特性：只有当日志级别启用时，才会执行格式化操作，
/// 避免了不必要的字符串格式化开销。
#[macro_export]
macro_rules! log {
    ($logger:expr, $lvl:expr, $($arg:tt)+) => ({
        let logger: &$crate::Logger = &$logger;
        let lvl: $crate::Level = $lvl;
        if logger.should_log(lvl) {
            $crate::Logger::log(
                logger,
                lvl,
                $crate::Location::new(file!(), $crate::__function_name!(), line!()),
                format_args!($($arg)+),
            );
        }
    });
}

/// 记录错误级别日志
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => (
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    );
}

/// 记录警告级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => (
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    );
}

/// 记录信息级别日志
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => (
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    );
}

/// 记录调试级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => (
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    );
}
