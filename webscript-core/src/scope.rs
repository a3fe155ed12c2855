//! 入れ子になった(名前, 種別)のコンテキストを追跡するスコープスタック。
//!
//! `return`や`query`などの文脈依存の妥当性検査と、診断用の
//! ドット区切りパス表示にのみ使う。コード生成への副作用は持たない。

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Class,
    Function,
    Loop,
    ResourceBlock,
}

/// LIFOのスコープ列。ブロックへ入るときpush、抜けるときpop。
#[derive(Debug, Default)]
pub struct ScopeStack {
    entries: Vec<(Option<String>, ScopeKind)>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Option<String>, kind: ScopeKind) {
        self.entries.push((name, kind));
    }

    pub fn pop(&mut self) {
        self.entries.pop();
    }

    pub fn peek(&self) -> Option<&(Option<String>, ScopeKind)> {
        self.entries.last()
    }

    /// 内側から外側へ向かって、指定した種別の最も近いエントリを探す。
    pub fn lookup(&self, kind: ScopeKind) -> Option<&(Option<String>, ScopeKind)> {
        self.entries.iter().rev().find(|(_, k)| *k == kind)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 外側から内側へ向けたドット区切りの現在位置。
    /// 関数は`name().`、それ以外は`name.`として連結する。
    pub fn render_location(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut out = String::from("in ");
        for (name, kind) in &self.entries {
            out.push_str(name.as_deref().unwrap_or("?"));
            if *kind == ScopeKind::Function {
                out.push_str("().");
            } else {
                out.push('.');
            }
        }

        let trimmed = out.trim_end();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        String::from(trimmed)
    }
}
