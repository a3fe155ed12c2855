//! 生成テキストを蓄積するエミッタ。
//!
//! ヘッダ部と本体部の2つの追記専用バッファを持つ。本体は合成された
//! エントリ関数のプロローグで始まり、出力アキュムレータ`_PAGE_BUF`を
//! 空文字列で宣言する。インデント単位は半角スペース1つ。

extern crate alloc;
use alloc::format;
use alloc::string::String;

/// インデント文字列を作る。
pub fn pad(tabs: usize) -> String {
    " ".repeat(tabs)
}

#[derive(Debug)]
pub struct Emitter {
    pub headers: String,
    pub body: String,
    unit_index: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        let mut emitter = Self {
            headers: String::new(),
            body: String::new(),
            unit_index: 0,
        };
        emitter.begin_unit();
        emitter
    }

    /// 次のユニットを開始する。単調増加するカウンタにより、
    /// ユニットごとのエントリ関数名は一意になる。
    pub fn reset(&mut self) {
        self.unit_index += 1;
        self.begin_unit();
    }

    fn begin_unit(&mut self) {
        self.headers.clear();
        self.body.clear();
        self.body.push_str(&format!(
            "def {}(*args,**kwargs):\n _PAGE_BUF=''\n",
            self.entry_name()
        ));
    }

    /// 現在のユニットのエントリ関数名。
    pub fn entry_name(&self) -> String {
        format!("webscriptUnit{}", self.unit_index)
    }

    /// 本体へそのまま追記する。
    pub fn raw(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// ヘッダへそのまま追記する。
    pub fn header(&mut self, text: &str) {
        self.headers.push_str(text);
    }
}
