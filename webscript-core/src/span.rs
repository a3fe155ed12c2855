//! ソースコード上の位置(行・列)を表現するためのデータ構造。

use core::fmt;

/// ソースコード上の位置を示す構造体。
/// 行は1始まり、列は0始まり。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
