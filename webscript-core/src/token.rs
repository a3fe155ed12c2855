//! 字句解析の結果であるトークンを定義します。

extern crate alloc;
use crate::span::Span;
use alloc::string::String;

/// 1つの字句トークン。
/// `max_line`はユニット全体の総行数で、診断表示の範囲クランプにのみ使う。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub span: Span,
    pub max_line: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            max_line: 1,
        }
    }

    /// 位置情報を持たない合成トークン(脱糖で挿入されるキーワードなど)。
    pub fn bare(text: impl Into<String>) -> Self {
        Self::new(text, Span::default())
    }

    /// 診断でキャレットを引く幅。空トークンでも1文字分は下線を引く。
    pub fn width(&self) -> usize {
        self.text.chars().count().max(1)
    }
}

/// Pythonの識別子規則に相当する判定。先頭は英字か`_`、以降は英数字か`_`。
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// 数字のみで構成されたトークンか。識別子直後の数字列の再結合判定に使う。
pub fn is_digit_run(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
