#![no_std]
//! webscriptのトランスレータライブラリのクレート。
//! 字句解析、構造スキャン、文コンパイル、テキスト出力のパイプラインを管理します。
//!
//! コアは生成したプログラムを実行しない。1ユニットのソースを受け取り、
//! ヘッダ部と本体部の2つのテキストバッファと位置付き診断を返すだけで、
//! 実行とルーティングは外部のホストランタイムの責務とする。

extern crate alloc;

pub mod compiler;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod scanner;
pub mod scope;
pub mod span;
pub mod stream;
pub mod tables;
pub mod token;

pub use compiler::{Compiler, LoopContext};
pub use error::{Diagnostic, DiagnosticCategory, DiagnosticKind, UnitError};
pub use lexer::tokenize;
pub use stream::{join, TokenStream};
pub use token::Token;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// 1ユニットのコンパイル結果。
/// `headers`と`body`を連結したものがホストランタイムへ渡る。
pub struct UnitOutput {
    pub headers: String,
    pub body: String,
    pub diagnostics: Vec<Diagnostic>,
    pub had_error: bool,
}

impl UnitOutput {
    /// 単体で呼び出せる完全なプログラムを返す。
    /// エントリ関数を閉じる返却行はドライバ側の責務なので、ここで足す。
    pub fn program(&self) -> String {
        format!("{}{} return _PAGE_BUF\n", self.headers, self.body)
    }
}

/// ソース1ユニットをコンパイルするヘルパー。
/// 診断があってもコンパイルは完走し、結果に同梱して返す。
pub fn compile_source(source: &str) -> UnitOutput {
    let mut compiler = Compiler::new();
    compiler.compile(source);

    let had_error = compiler.had_error();
    let headers = String::from(compiler.headers());
    let body = String::from(compiler.body());
    let diagnostics = compiler.take_diagnostics();

    UnitOutput {
        headers,
        body,
        diagnostics,
        had_error,
    }
}

/// ソース1ユニットを完全なプログラムへコンパイルするメイン関数。
/// エラー診断が1件でもあれば出力を破棄し、`UnitError`として返す。
/// これがこのライブラリの公開APIとなります。
pub fn compile_program(source: &str) -> Result<String, UnitError> {
    let unit = compile_source(source);
    if unit.had_error {
        return Err(UnitError::from_diagnostics(unit.diagnostics));
    }
    Ok(unit.program())
}
