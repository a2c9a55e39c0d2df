/*!
日志行格式化器。

模板由少量控制序列组成：

| 序列 | 含义 |
|------|------|
| `%T` | 时间戳 `YYYY-MM-DD HH:MM:SS` |
| `%l` | 级别名，左对齐补齐到5个字符 |
| `%F` | 源文件名（去掉目录部分） |
| `%L` | 行号 |
| `%f` | 函数名 |
| `%m` | 消息 |

其他 `%x` 原样输出。展开结果不以换行结尾时自动补一个换行。
*/

use std::fmt::Write;

use crate::Record;

/// 默认模板
pub const DEFAULT_PATTERN: &str = "[%T][%l][%F:%L][%f()] - %m";

/// 时间戳格式
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一行日志的初始缓冲区大小
const MIN_LINE_CAPACITY: usize = 256;

/// 格式化器接口
pub trait Formatter: Send + Sync {
    /// 将日志记录渲染为一行文本（以换行结尾）
    fn format(&self, record: &Record) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp,
    Level,
    File,
    Line,
    Function,
    Message,
}

/// 基于模板的格式化器
///
/// 模板在构造时解析一次，格式化时只遍历片段列表。
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: String,
    segments: Vec<Segment>,
}

impl PatternFormatter {
    /// 使用给定模板创建格式化器
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = parse(&pattern);
        Self { pattern, segments }
    }

    /// 获取模板字符串
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl Formatter for PatternFormatter {
    fn format(&self, record: &Record) -> String {
        let mut out = String::with_capacity(MIN_LINE_CAPACITY.max(record.message().len() * 2));

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Timestamp => {
                    let _ = write!(out, "{}", record.timestamp().format(TIMESTAMP_FORMAT));
                }
                Segment::Level => out.push_str(record.level().padded()),
                Segment::File => out.push_str(basename(record.file())),
                Segment::Line => {
                    let _ = write!(out, "{}", record.line());
                }
                Segment::Function => out.push_str(record.function()),
                Segment::Message => out.push_str(record.message()),
            }
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// 去掉路径中的目录部分（同时识别 `/` 与 `\`）
pub fn basename(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

fn parse(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            literal.push(ch);
            continue;
        }

        let segment = match chars.next() {
            Some('T') => Segment::Timestamp,
            Some('l') => Segment::Level,
            Some('F') => Segment::File,
            Some('L') => Segment::Line,
            Some('f') => Segment::Function,
            Some('m') => Segment::Message,
            Some(other) => {
                literal.push('%');
                literal.push(other);
                continue;
            }
            None => {
                literal.push('%');
                break;
            }
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(segment);
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
