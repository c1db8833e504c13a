//! 输出解析函数

use super::types::{Package, SearchResult};
use regex::Regex;
use std::sync::LazyLock;

/// 找不到描述时的固定文本
pub const NO_DESCRIPTION: &str = "No description available.";

/// 描述获取失败时的前缀
pub const DESCRIPTION_ERROR_PREFIX: &str = "Error fetching description:";

/// 列之间至少两个空白
static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// 清理单行终端输出中的 ANSI 转义序列和控制字符
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
}

/// 搜索输出解析器；列式文本之外的输出格式可以另行实现
pub trait SearchParser: Send + Sync {
    fn parse(&self, lines: &[String]) -> SearchResult;
}

/// `winget search` 的列式表格：Name  Id  Version  Source
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnSearchParser;

impl SearchParser for ColumnSearchParser {
    fn parse(&self, lines: &[String]) -> SearchResult {
        parse_search_output(lines)
    }
}

/// 跳过表头之前的所有行，之后每行按两个以上空白切列，不足 4 列的行忽略
pub fn parse_search_output<S: AsRef<str>>(lines: &[S]) -> SearchResult {
    let mut results = Vec::new();
    let mut header_passed = false;

    for line in lines {
        let line = line.as_ref().trim();
        if !header_passed {
            header_passed = line.starts_with("Name");
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let cols: Vec<&str> = COLUMN_GAP.split(line).map(str::trim).collect();
        if cols.len() < 4 {
            log::trace!("skipping search line: {:?}", line);
            continue;
        }
        results.push(Package::new(cols[1], cols[0], cols[3], cols[2]));
    }

    results
}

/// 解析 `winget show` 输出中的 Description 字段
pub fn parse_description<S: AsRef<str>>(lines: &[S]) -> String {
    let mut desc: Vec<&str> = Vec::new();
    let mut found = false;

    for line in lines {
        let line = line.as_ref();
        let trimmed = line.trim();

        if !found {
            if trimmed.to_lowercase().starts_with("description") {
                found = true;
                if let Some((_, rest)) = line.split_once(':') {
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        desc.push(rest);
                    }
                }
            }
            continue;
        }

        // 空行或新的 key: value 字段结束描述
        if trimmed.is_empty() || line.contains(':') {
            break;
        }
        desc.push(trimmed);
    }

    let text = desc.join("\n");
    let text = text.trim_end();
    if text.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        text.to_string()
    }
}

pub fn description_error(reason: impl std::fmt::Display) -> String {
    format!("{} {}", DESCRIPTION_ERROR_PREFIX, reason)
}
