//! キーワードディスパッチ式の文コンパイラ。
//!
//! 「1つの`{...}`本体をコンパイルする」を単位とするループで、
//! トークンを1つ取り出しては小文字化した綴りでハンドラ表を引き、
//! 一致しなければ裸の文(呼び出し/定義/フック/代入)として解決する。
//! 各ハンドラは構造スキャナで自分の範囲を切り出し、エミッタへ書き、
//! 更新後のLoopContextを返す。失敗は診断に記録して回復値で続行し、
//! コンパイラ境界を越える例外的な制御移動は行わない。

extern crate alloc;
mod statements;

use crate::emitter::Emitter;
use crate::error::{Diagnostic, DiagnosticCategory, Diagnostics};
use crate::lexer::tokenize;
use crate::scanner::{scan_until, skip_until};
use crate::scope::ScopeStack;
use crate::stream::TokenStream;
use crate::tables::{Handler, Tables};
use crate::token::Token;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// `continue`が何を追加で出力すべきかを表す、再帰呼び出しごとの文脈。
///
/// - `None`: ループの外。`break`/`continue`は文脈エラー。
/// - `Generic`: 通常のループ内。
/// - `CompoundExit`: 脱糖されたループ内。`continue`の直前に
///   脱出チェック(またはインクリメント)のテキストを再出力する。
#[derive(Debug, Clone, PartialEq)]
pub enum LoopContext {
    None,
    Generic,
    CompoundExit(String),
}

impl LoopContext {
    /// ループ内として扱える文脈か。
    pub fn is_active(&self) -> bool {
        !matches!(self, LoopContext::None)
    }

    /// `continue`の前に差し込むテキスト。
    pub fn exit_check(&self) -> Option<&str> {
        match self {
            LoopContext::CompoundExit(check) => Some(check),
            _ => None,
        }
    }
}

/// 1ユニット分の状態を抱えるコンパイラ本体。
/// `reset()`で次のユニットへ移り、可変状態はすべて初期化される。
pub struct Compiler {
    tables: Tables,
    pub emitter: Emitter,
    pub scopes: ScopeStack,
    pub diagnostics: Diagnostics,
    // 次の定義1つだけに効く付箋フラグ。消費時に即座に降ろす。
    next_abstract: bool,
    next_static: bool,
    // ユニットにつき1回だけヘッダを注入するためのフラグ。
    abstract_header_done: bool,
    mysql_header_done: bool,
    mongo_header_done: bool,
    last_package: String,
    /// 直近でコンパイルしたセクションのインデント深さ。
    /// ホスト文書へ後続テキストを織り込むドライバが参照する。
    pub last_indent: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_tables(Tables::new())
    }

    /// ディスパッチ表を外から注入して生成する。
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables,
            emitter: Emitter::new(),
            scopes: ScopeStack::new(),
            diagnostics: Diagnostics::new(),
            next_abstract: false,
            next_static: false,
            abstract_header_done: false,
            mysql_header_done: false,
            mongo_header_done: false,
            last_package: String::new(),
            last_indent: 1,
        }
    }

    /// ユニット境界。バッファ・スコープ・診断・フラグをすべて初期化し、
    /// エントリ関数名のカウンタを進める。
    pub fn reset(&mut self) {
        self.emitter.reset();
        self.scopes.clear();
        self.diagnostics.clear();
        self.next_abstract = false;
        self.next_static = false;
        self.abstract_header_done = false;
        self.mysql_header_done = false;
        self.mongo_header_done = false;
        self.last_package.clear();
        self.last_indent = 1;
    }

    /// 1セクションをコンパイルして現在のユニットへ追記する。
    /// ユニットは複数セクションから成りうる(ホスト文書の埋め込み
    /// ブロックごとに1回呼ばれる)。
    pub fn compile(&mut self, section: &str) {
        self.diagnostics.set_source(section);
        self.next_abstract = false;
        self.next_static = false;
        self.last_package.clear();

        let tokens = tokenize(section);
        let mut stream = TokenStream::new(tokens);
        self.compile_block(&mut stream, 1, LoopContext::None);
        self.last_indent = 1;
    }

    pub fn headers(&self) -> &str {
        &self.emitter.headers
    }

    pub fn body(&self) -> &str {
        &self.emitter.body
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// 1ブロック分のコンパイルループ。
    pub fn compile_block(
        &mut self,
        ts: &mut TokenStream,
        tabs: usize,
        mut ctx: LoopContext,
    ) -> LoopContext {
        while ts.has_next() {
            let next = match ts.next() {
                Some(token) => token,
                None => break,
            };

            // 三重クォートのリテラルはドキュメンテーションとして素通しする
            if next.text.starts_with("\"\"\"") || next.text.starts_with("'''") {
                self.emitter.raw(&next.text);
                self.emitter.raw("\n");
                continue;
            }

            let key = next.text.to_lowercase();
            if let Some(handler) = self.tables.statements.get(key.as_str()).copied() {
                ctx = self.run_handler(handler, &next, ts, tabs, ctx);
            } else {
                ctx = self.bare_statement(next, ts, tabs, ctx);
            }
        }

        ctx
    }

    fn run_handler(
        &mut self,
        handler: Handler,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        match handler {
            Handler::Class => self.stmt_class(ts, tabs, ctx),
            Handler::Package => self.stmt_package(ts, ctx),
            Handler::Import => self.stmt_import(keyword, ts, ctx),
            Handler::Return => self.stmt_return(keyword, ts, tabs, ctx),
            Handler::Break => self.stmt_break(keyword, ts, tabs, ctx),
            Handler::Continue => self.stmt_continue(keyword, ts, tabs, ctx),
            Handler::Prefix(prefix) => self.stmt_prefix(prefix, tabs, ctx),
            Handler::UntilEnd(emit) => self.stmt_until_end(emit, ts, tabs, ctx),
            Handler::SimpleBlock(emit) => self.stmt_simple_block(emit, keyword, ts, tabs, ctx),
            Handler::Block { keyword: emit, seeds_loop } => {
                self.stmt_block(emit, seeds_loop, ts, tabs, ctx)
            }
            Handler::Do => self.stmt_do(keyword, ts, tabs, ctx),
            Handler::For => self.stmt_for(keyword, ts, tabs, ctx),
            Handler::Match => self.stmt_match(ts, tabs, ctx),
            Handler::Enum => self.stmt_enum(ts, tabs, ctx),
            Handler::Abstract => self.stmt_abstract(ctx),
            Handler::Static => {
                self.next_static = true;
                ctx
            }
            Handler::Resource(kind) => self.stmt_resource(kind, ts, tabs, ctx),
            Handler::Query => self.stmt_query(keyword, ts, tabs, ctx),
            Handler::Terminate => self.stmt_terminate(keyword, ts, tabs, ctx),
        }
    }

    // --- カーソル/スキャナのヘルパー ---

    /// 1トークン要求する。枯渇していたら診断を記録してNoneを返す。
    fn require_next(&mut self, ts: &mut TokenStream) -> Option<Token> {
        match ts.next() {
            Some(token) => Some(token),
            None => {
                let at = ts.anchor().cloned().unwrap_or_else(|| Token::bare(""));
                self.diagnostics.error(
                    DiagnosticCategory::Lex,
                    "invalid syntax: the expression wasn't properly closed. no tokens remaining",
                    &at,
                );
                None
            }
        }
    }

    /// 次のトークンが`ch`であることを要求する。違っていれば診断を
    /// 記録し、`ch`までフラットに読み飛ばして再同期する。
    fn expect_next(&mut self, ch: &str, what: &str, ts: &mut TokenStream) -> Option<Token> {
        let next = self.require_next(ts)?;
        if next.text != ch {
            self.diagnostics.error(
                DiagnosticCategory::Syntax,
                format!("invalid syntax: expecting \"{ch}\" directly after {what}. ignoring."),
                &next,
            );
            return skip_until(ch, ts, &mut self.diagnostics);
        }
        Some(next)
    }

    /// 深さ0の`target`までのトークンを集める。終端必須、消費は終端まで。
    fn until(&mut self, target: &str, ts: &mut TokenStream) -> Vec<Token> {
        scan_until(target, ts, &mut self.diagnostics, true, false, &[]).tokens
    }
}
