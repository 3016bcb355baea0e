use serde_json::{Map, Number, Value};
use thiserror::Error;

/// 对象字面量解析失败的位置和原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("第 {line} 行第 {column} 列: {message}")]
pub struct LiteralError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// 解析 JavaScript 对象字面量形式的配置文件（ecosystem.config.js 风格）
///
/// 支持 `module.exports =` / `export default` 前缀、注释、未加引号的键、
/// 单引号字符串和尾随逗号。JSON 是它的子集。
/// 与 serde_json 的默认上限一致
const MAX_DEPTH: usize = 128;

pub fn parse_js_config(content: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(content);
    parser.skip_trivia()?;
    parser.skip_module_prefix()?;
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.peek() == Some(';') {
        parser.bump();
        parser.skip_trivia()?;
    }
    if parser.peek().is_some() {
        return Err(parser.error("配置对象之后存在多余内容"));
    }
    Ok(value)
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("期望 `{}`，实际为 `{}`", expected, c))),
            None => Err(self.error(format!("期望 `{}`，但已到达文件末尾", expected))),
        }
    }

    /// 跳过空白和注释
    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(self.error("块注释未闭合")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// 跳过 `module.exports =` 或 `export default`
    fn skip_module_prefix(&mut self) -> Result<(), LiteralError> {
        if !matches!(self.peek(), Some(c) if is_ident_start(c)) {
            return Ok(());
        }
        let word = self.parse_identifier();
        match word.as_str() {
            "module" => {
                self.skip_trivia()?;
                self.expect('.')?;
                self.skip_trivia()?;
                let member = self.parse_identifier();
                if member != "exports" {
                    return Err(self.error(format!("不支持的导出写法 `module.{}`", member)));
                }
                self.skip_trivia()?;
                self.expect('=')?;
            }
            "export" => {
                self.skip_trivia()?;
                let keyword = self.parse_identifier();
                if keyword != "default" {
                    return Err(self.error("只支持 `export default` 导出"));
                }
            }
            other => return Err(self.error(format!("无法识别的标识符 `{}`", other))),
        }
        self.skip_trivia()
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(quote @ ('"' | '\'' | '`')) => Ok(Value::String(self.parse_string(quote)?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let word = self.parse_identifier();
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    other => Err(self.error(format!("不支持的表达式 `{}`，只接受字面量", other))),
                }
            }
            Some(c) => Err(self.error(format!("意外的字符 `{}`", c))),
            None => Err(self.error("意外的文件末尾")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("嵌套层级过深"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key = match self.peek() {
                Some(quote @ ('"' | '\'')) => self.parse_string(quote)?,
                Some(c) if is_ident_start(c) => self.parse_identifier(),
                Some(c) if c.is_ascii_digit() => self.parse_identifier(),
                Some(c) => return Err(self.error(format!("无效的键起始字符 `{}`", c))),
                None => return Err(self.error("对象未闭合")),
            };

            self.skip_trivia()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            // 与 JavaScript 一致：重复的键以后出现的为准
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => return Err(self.error(format!("期望 `,` 或 `}}`，实际为 `{}`", c))),
                None => return Err(self.error("对象未闭合")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => return Err(self.error(format!("期望 `,` 或 `]`，实际为 `{}`", c))),
                None => return Err(self.error("数组未闭合")),
            }
        }
    }

    fn parse_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.bump();
        let mut out = String::new();
        loop {
            let c = match self.peek() {
                Some('\n') if quote != '`' => return Err(self.error("字符串中不允许换行")),
                Some(c) => c,
                None => return Err(self.error("字符串未闭合")),
            };
            self.bump();
            if c == quote {
                return Ok(out);
            }
            match c {
                '\\' => self.parse_escape(&mut out)?,
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("模板字符串不支持 `${}` 插值"));
                }
                other => out.push(other),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("字符串未闭合"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // 行尾的反斜杠表示续行
            '\n' => {}
            'u' => {
                let mut value = self.parse_hex4()?;
                // 高位代理必须紧跟低位代理，合并为一个码点
                if (0xD800..0xDC00).contains(&value) {
                    if self.bump() != Some('\\') || self.bump() != Some('u') {
                        return Err(self.error("高位代理之后缺少低位代理"));
                    }
                    let low = self.parse_hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("高位代理之后缺少低位代理"));
                    }
                    value = 0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00);
                }
                let ch = char::from_u32(value).ok_or_else(|| self.error("无效的 Unicode 码点"))?;
                out.push(ch);
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32, LiteralError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|h| h.to_digit(16))
                .ok_or_else(|| self.error("无效的 \\u 转义"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            if sign == '-' {
                text.push(sign);
            }
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') {
                text.push(c);
                self.bump();
            } else if matches!(c, '+' | '-') && text.ends_with(['e', 'E']) {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("无效的数字 `{}`", text)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
