use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// moment.js 格式记号与 chrono strftime 的对应关系，长记号必须排在前面
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("SSS", "%3f"),
    ("A", "%p"),
    ("a", "%P"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
];

/// 把 "YYYY-MM-DD HH:mm:ss" 这类 moment.js 格式转换为 chrono 的格式串
///
/// 方括号内的内容按字面输出，无法识别的字符原样保留。
pub fn moment_to_strftime(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                push_literal(&mut out, &rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }

        for (token, spec) in TOKENS {
            if rest.starts_with(token) {
                out.push_str(spec);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }

        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

/// 按 moment.js 格式渲染时间
pub fn format_timestamp<Tz>(pattern: &str, time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(&moment_to_strftime(pattern)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn converts_common_pattern() {
        assert_eq!(moment_to_strftime("YYYY-MM-DD HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(moment_to_strftime("DD/MM/YY hh:mm A"), "%d/%m/%y %I:%M %p");
        assert_eq!(moment_to_strftime("HH:mm:ss.SSS Z"), "%H:%M:%S.%3f %:z");
    }

    #[test]
    fn keeps_bracketed_and_percent_literals() {
        assert_eq!(moment_to_strftime("[Day] D [at] H"), "Day %-d at %-H");
        assert_eq!(moment_to_strftime("100% YYYY"), "100%% %Y");
        assert_eq!(moment_to_strftime("YYYY年MM月DD日"), "%Y年%m月%d日");
    }

    #[test]
    fn renders_timestamp() {
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let time = shanghai.with_ymd_and_hms(2025, 3, 7, 2, 5, 9).unwrap();
        assert_eq!(format_timestamp("YYYY-MM-DD HH:mm:ss", &time), "2025-03-07 02:05:09");
        assert_eq!(format_timestamp("MMM D, h:mm a", &time), "Mar 7, 2:05 am");
    }
}
