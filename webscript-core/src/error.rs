//! コンパイル処理中に発生する診断を定義します。
//!
//! ハンドラは失敗してもコンパイルを止めず、位置付きの診断をここへ
//! 蓄積して回復値で続行する。エラー診断が1件でもあればユニット単位の
//! `had_error`が立ち、ドライバはそのユニットの出力を破棄する。

extern crate alloc;
use crate::span::Span;
use crate::token::Token;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

/// 診断の分類。
/// Lexはカーソル枯渇(閉じられなかった式)、Syntaxは構文不備、
/// Contextは必要なスコープ外での構文の使用、Semanticは非致命の警告。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Lex,
    Syntax,
    Context,
    Semantic,
}

/// 位置付き診断。行は1始まり、列は0始まり。
/// `width`は問題のトークンの文字数で、キャレット下線に使う。
/// `context`は発生時点のソースから切り出した最大5行の抜粋。
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub category: DiagnosticCategory,
    pub message: String,
    pub span: Span,
    pub width: usize,
    pub context: String,
}

impl Diagnostic {
    fn color_code(&self) -> (&'static str, &'static str) {
        match self.kind {
            DiagnosticKind::Error => ("error", "\x1b[31m"),
            DiagnosticKind::Warning => ("warning", "\x1b[33m"),
        }
    }

    pub fn to_colored_string(&self) -> String {
        let (label, color) = self.color_code();
        let reset = "\x1b[0m";
        let mut message = format!("{color}{label}{reset} at {}: {}", self.span, self.message);
        if !self.context.is_empty() {
            message.push('\n');
            message.push_str(&self.context);
        }
        message
    }
}

/// ユニット1つ分の診断の蓄積先。
/// 現在コンパイル中のセクションのソース行を保持し、
/// 診断の生成時点で文脈抜粋を描画して埋め込む。
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
    source: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文脈抜粋の描画元となるソースを差し替える。
    /// ユニットは複数セクションから成りうるので、セクションごとに呼ぶ。
    pub fn set_source(&mut self, source: &str) {
        self.source = source.split('\n').map(|line| line.to_string()).collect();
    }

    pub fn error(&mut self, category: DiagnosticCategory, message: impl Into<String>, token: &Token) {
        self.had_error = true;
        let diagnostic = self.build(DiagnosticKind::Error, category, message.into(), token);
        self.diagnostics.push(diagnostic);
    }

    pub fn warning(
        &mut self,
        category: DiagnosticCategory,
        message: impl Into<String>,
        token: &Token,
    ) {
        let diagnostic = self.build(DiagnosticKind::Warning, category, message.into(), token);
        self.diagnostics.push(diagnostic);
    }

    fn build(
        &self,
        kind: DiagnosticKind,
        category: DiagnosticCategory,
        message: String,
        token: &Token,
    ) -> Diagnostic {
        Diagnostic {
            kind,
            category,
            message,
            span: token.span,
            width: token.width(),
            context: render_context(&self.source, token.span, token.width(), token.max_line),
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn list(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        core::mem::take(&mut self.diagnostics)
    }

    /// ユニット境界でのリセット。
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.had_error = false;
        self.source.clear();
    }
}

/// 問題の行を中心に最大5行の抜粋を作り、該当行の下にキャレットを引く。
/// ウィンドウは`max_line`(ユニット総行数)でクランプする。
fn render_context(source: &[String], span: Span, width: usize, max_line: usize) -> String {
    if source.is_empty() || span.line == 0 {
        return String::new();
    }

    let total = source.len().min(max_line.max(1));
    let line = span.line.min(total);

    let mut start = if line > 2 { line - 2 } else { 1 };
    if total >= 5 {
        start = start.min(total - 4);
    } else {
        start = 1;
    }
    let end = (start + 4).min(total);

    let gutter = end.to_string().len();
    let mut out = String::new();

    for number in start..=end {
        let text = source[number - 1].trim_end();
        out.push_str(&format!("{:>gutter$} | {}\n", number, text, gutter = gutter));

        if number == line {
            out.push_str(&" ".repeat(gutter));
            out.push_str(" | ");
            out.push_str(&" ".repeat(span.column));
            out.push_str(&"^".repeat(width));
            out.push('\n');
        }
    }

    // 末尾の改行は呼び出し側の整形に任せる
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// stdファサード(`compile_program`)が返すエラー。
/// ユニットの全診断を保持し、`Display`でまとめて描画する。
#[derive(Debug)]
pub struct UnitError {
    pub diagnostics: Vec<Diagnostic>,
}

impl UnitError {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.kind == DiagnosticKind::Error)
    }
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return write!(f, "no diagnostics emitted");
        }
        for (idx, diagnostic) in self.diagnostics.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic.to_colored_string())?;
        }
        Ok(())
    }
}
