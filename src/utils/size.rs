use once_cell::sync::Lazy;
use regex::Regex;

static SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([KkMmGg])$").expect("size pattern is valid"));

/// 解析 "200M" / "1G" / "512K" 这类内存大小，返回字节数
///
/// 单位按 1024 进制计算。数值为 0 或计算溢出时返回 None。
pub fn parse_size(text: &str) -> Option<u64> {
    let captures = SIZE_PATTERN.captures(text.trim())?;
    let amount: u64 = captures[1].parse().ok()?;
    let multiplier: u64 = match captures[2].to_ascii_uppercase().as_str() {
        "K" => 1024,
        "M" => 1024 * 1024,
        "G" => 1024 * 1024 * 1024,
        _ => return None,
    };

    amount.checked_mul(multiplier).filter(|bytes| *bytes > 0)
}

/// 把字节数格式化成最大的整除单位，例如 209715200 -> "200M"
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1024 * 1024 * 1024, "G"), (1024 * 1024, "M"), (1024, "K")];
    for (factor, suffix) in UNITS {
        if bytes >= factor && bytes % factor == 0 {
            return format!("{}{}", bytes / factor, suffix);
        }
    }
    format!("{}B", bytes)
}
