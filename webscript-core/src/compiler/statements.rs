//! 構文ごとのハンドラ群。
//!
//! どのハンドラも(カーソル, インデント, LoopContext)を受け取り、
//! 構造スキャナで自分の範囲を切り出してエミッタへ書き、
//! 更新後のLoopContextを返す。空ブロックは`:pass`で埋める。

extern crate alloc;
use super::{Compiler, LoopContext};
use crate::emitter::pad;
use crate::error::DiagnosticCategory;
use crate::scanner::{extract_balanced, scan_until};
use crate::scope::ScopeKind;
use crate::stream::{join, TokenStream};
use crate::tables::{ResourceKind, SET_OPS};
use crate::token::Token;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

impl Compiler {
    // --- クラス定義 ---

    pub(super) fn stmt_class(
        &mut self,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let Some(name) = self.require_next(ts) else {
            return ctx;
        };

        let mut bases = String::new();
        if ts.peek().map_or(false, |t| t.text == ":") {
            ts.next();
            let listed = self.until("{", ts);
            bases = join(&listed);

            if self.next_abstract {
                self.next_abstract = false;
                bases.push_str(",_ABSTRACT_BASE_");
            }
        } else {
            self.expect_next("{", "class definition", ts);

            if self.next_abstract {
                self.next_abstract = false;
                bases.push_str("_ABSTRACT_BASE_");
            }
        }

        if bases.is_empty() {
            self.emitter.raw(&format!("{}class {}:", pad(tabs), name.text));
        } else {
            self.emitter
                .raw(&format!("{}class {}({}):", pad(tabs), name.text, bases));
        }

        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);
        if block.is_empty() {
            self.emitter.raw("pass\n");
            return ctx;
        }
        self.emitter.raw("\n");

        self.scopes.push(Some(name.text.clone()), ScopeKind::Class);
        let mut inner = TokenStream::new(block);
        self.compile_block(&mut inner, tabs + 1, ctx.clone());
        self.scopes.pop();
        ctx
    }

    // --- 単文系 ---

    pub(super) fn stmt_prefix(&mut self, prefix: &str, tabs: usize, ctx: LoopContext) -> LoopContext {
        self.emitter.raw(&format!("{}{} ", pad(tabs), prefix));
        ctx
    }

    pub(super) fn stmt_until_end(
        &mut self,
        emit: &str,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let value = self.until(";", ts);
        let mut line = Vec::with_capacity(value.len() + 1);
        line.push(Token::bare(emit));
        line.extend(value);
        self.emitter.raw(&format!("{}{}\n", pad(tabs), join(&line)));
        ctx
    }

    pub(super) fn stmt_return(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        if self.scopes.lookup(ScopeKind::Function).is_none() {
            self.diagnostics.error(
                DiagnosticCategory::Context,
                "cannot use \"return\" outside of a function",
                keyword,
            );
        }

        if ts.peek().map_or(false, |t| t.text == ";") {
            ts.next();
            self.emitter.raw(&format!("{}return\n", pad(tabs)));
            return ctx;
        }

        let value = self.until(";", ts);
        let mut line = Vec::with_capacity(value.len() + 1);
        line.push(Token::bare("return"));
        line.extend(value);
        self.emitter.raw(&format!("{}{}\n", pad(tabs), join(&line)));
        ctx
    }

    pub(super) fn stmt_break(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        self.require_semicolon(keyword, "break", ts);

        if !ctx.is_active() {
            self.diagnostics.error(
                DiagnosticCategory::Context,
                "cannot use \"break\" outside of a loop",
                keyword,
            );
            return ctx;
        }

        self.emitter.raw(&format!("{}break\n", pad(tabs)));
        ctx
    }

    pub(super) fn stmt_continue(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        self.require_semicolon(keyword, "continue", ts);

        if !ctx.is_active() {
            self.diagnostics.error(
                DiagnosticCategory::Context,
                "cannot use \"continue\" outside of a loop",
                keyword,
            );
            return ctx;
        }

        // 脱糖されたループでは、継続の前に脱出チェックを再出力する
        if let Some(check) = ctx.exit_check() {
            if !check.is_empty() {
                self.emitter.raw(&format!("{}{}", pad(tabs), check));
            }
        }

        self.emitter.raw(&format!("{}continue\n", pad(tabs)));
        ctx
    }

    pub(super) fn stmt_terminate(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        self.require_semicolon(keyword, "terminate", ts);
        self.emitter.raw(&format!("{}return _PAGE_BUF\n", pad(tabs)));
        ctx
    }

    fn require_semicolon(&mut self, keyword: &Token, what: &str, ts: &mut TokenStream) {
        match ts.peek() {
            Some(t) if t.text == ";" => {
                ts.next();
            }
            Some(t) => {
                let at = t.clone();
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    format!("expecting \";\" after \"{what}\""),
                    &at,
                );
            }
            None => {
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    format!("expecting \";\" after \"{what}\""),
                    keyword,
                );
            }
        }
    }

    // --- フラグとヘッダ ---

    pub(super) fn stmt_abstract(&mut self, ctx: LoopContext) -> LoopContext {
        self.next_abstract = true;

        if !self.abstract_header_done {
            self.abstract_header_done = true;
            self.emitter
                .header("from abc import abstractmethod\nfrom abc import ABC as _ABSTRACT_BASE_\n");
        }

        ctx
    }

    pub(super) fn stmt_package(&mut self, ts: &mut TokenStream, ctx: LoopContext) -> LoopContext {
        let name = self.until(":", ts);
        let joined = join(&name);
        self.last_package = joined.clone();
        self.emitter.header(&format!("from {} ", joined));
        ctx
    }

    pub(super) fn stmt_import(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        ctx: LoopContext,
    ) -> LoopContext {
        let imports = self.until(";", ts);

        if imports.len() == 1 && imports[0].text == "*" {
            if self.last_package.is_empty() {
                self.diagnostics.error(
                    DiagnosticCategory::Context,
                    "cannot use \"import *\" if no package is defined",
                    keyword,
                );
                return ctx;
            }

            self.last_package.clear();
            self.emitter.header("import *\n");
            return ctx;
        }

        self.emitter.header(&format!("import {}\n", join(&imports)));
        ctx
    }

    // --- ブロック系 ---

    pub(super) fn stmt_simple_block(
        &mut self,
        emit: &str,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let what = format!("\"{}\"", keyword.text);
        self.expect_next("{", &what, ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        self.emitter.raw(&format!("{}{}", pad(tabs), emit));

        if block.is_empty() {
            self.emitter.raw(":pass\n");
            return ctx;
        }
        self.emitter.raw(":\n");

        let mut inner = TokenStream::new(block);
        self.compile_block(&mut inner, tabs + 1, ctx)
    }

    pub(super) fn stmt_block(
        &mut self,
        emit: &str,
        seeds_loop: bool,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let content = self.until("{", ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        let mut head = Vec::with_capacity(content.len() + 1);
        head.push(Token::bare(emit));
        head.extend(content);
        self.emitter.raw(&format!("{}{}", pad(tabs), join(&head)));

        if block.is_empty() {
            self.emitter.raw(":pass\n");
            return ctx;
        }
        self.emitter.raw(":\n");

        let inner_ctx = if seeds_loop {
            LoopContext::Generic
        } else {
            ctx.clone()
        };
        let mut inner = TokenStream::new(block);
        let result = self.compile_block(&mut inner, tabs + 1, inner_ctx);

        // ループを開始する構文は外側の文脈をそのまま返す
        if seeds_loop {
            ctx
        } else {
            result
        }
    }

    // --- 3つのループ形 ---

    pub(super) fn stmt_do(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let (block, condition) = if ts.peek().map_or(false, |t| t.text == "{") {
            // do { ... } while cond;
            ts.next();
            let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

            match ts.peek() {
                Some(t) if t.text == "while" => {
                    ts.next();
                }
                Some(t) => {
                    let at = t.clone();
                    self.diagnostics.warning(
                        DiagnosticCategory::Semantic,
                        "expecting \"while\" after a do-while loop. ignoring",
                        &at,
                    );
                }
                None => {
                    self.diagnostics.warning(
                        DiagnosticCategory::Semantic,
                        "expecting \"while\" after a do-while loop. ignoring",
                        keyword,
                    );
                }
            }

            let condition = self.until(";", ts);
            (block, condition)
        } else {
            // do cond { ... }
            let condition = self.until("{", ts);
            let block = extract_balanced("{", "}", ts, &mut self.diagnostics);
            (block, condition)
        };

        let check = format!("if not({}):break\n", join(&condition));

        self.emitter.raw(&format!("{}while True:\n", pad(tabs)));
        let mut inner = TokenStream::new(block);
        self.compile_block(&mut inner, tabs + 1, LoopContext::CompoundExit(check.clone()));
        self.emitter.raw(&format!("{}{}", pad(tabs + 1), check));

        ctx
    }

    pub(super) fn stmt_for(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        // 先読み用カーソルでヘッダ中のセミコロンを数え、2形式を判別する
        let mut probe = ts.fork();
        let head = scan_until("{", &mut probe, &mut self.diagnostics, false, false, &[]).tokens;
        let semicolons = head.iter().filter(|t| t.text == ";").count();

        let (statement, increments) = match semicolons {
            // C形式: for init; cond; inc { ... }
            2 => {
                let round_brackets = ts.peek().map_or(false, |t| t.text == "(");
                if round_brackets {
                    ts.next();
                }

                if ts.peek().map_or(false, |t| t.text == ";") {
                    ts.next();
                } else {
                    let init = self.until(";", ts);
                    let (_, lines) = self.assignment_chain(&init, tabs);
                    self.emitter.raw(&lines);
                }

                let condition = if ts.peek().map_or(false, |t| t.text == ";") {
                    ts.next();
                    alloc::vec![Token::bare("True")]
                } else {
                    let condition = self.until(";", ts);
                    if condition.is_empty() {
                        alloc::vec![Token::bare("True")]
                    } else {
                        condition
                    }
                };

                let increments = if ts.peek().map_or(false, |t| t.text == "{") {
                    ts.next();
                    String::new()
                } else {
                    let tokens = if round_brackets {
                        let tokens = self.until(")", ts);
                        self.expect_next("{", "for loop", ts);
                        tokens
                    } else {
                        self.until("{", ts)
                    };
                    let (_, lines) = self.assignment_chain(&tokens, tabs + 1);
                    lines
                };

                let mut statement = alloc::vec![Token::bare("while")];
                statement.extend(condition);
                (statement, increments)
            }
            // コレクション形式: for targets in iterable { ... }
            0 => {
                let targets = self.until("in", ts);
                if targets.is_empty() {
                    self.diagnostics.error(
                        DiagnosticCategory::Syntax,
                        "no variable defined in for loop",
                        keyword,
                    );
                }
                let iterable = self.until("{", ts);

                let mut statement = alloc::vec![Token::bare("for")];
                statement.extend(targets);
                statement.push(Token::bare("in"));
                statement.extend(iterable);
                (statement, String::new())
            }
            _ => {
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    "invalid syntax: using an unrecognized amount of semicolons in a for loop",
                    keyword,
                );
                // 不正なヘッダが裸の文として漏れないよう、構文全体を読み捨てる
                let skipped = scan_until("{", ts, &mut self.diagnostics, false, false, &[]);
                if skipped.found.is_some() {
                    extract_balanced("{", "}", ts, &mut self.diagnostics);
                }
                return ctx;
            }
        };

        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        self.emitter
            .raw(&format!("{}{}:", pad(tabs), join(&statement)));

        if block.is_empty() {
            if increments.is_empty() {
                self.emitter.raw("pass\n");
            } else {
                self.emitter.raw("\n");
                self.emitter.raw(&increments);
            }
            return ctx;
        }

        self.emitter.raw("\n");
        let mut inner = TokenStream::new(block);
        self.compile_block(
            &mut inner,
            tabs + 1,
            LoopContext::CompoundExit(String::from(increments.trim_start())),
        );

        if !increments.is_empty() {
            self.emitter.raw(&increments);
        }

        ctx
    }

    // --- match / enum ---

    pub(super) fn stmt_match(
        &mut self,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let value = self.until("{", ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        if block.is_empty() {
            return ctx;
        }

        let mut head = alloc::vec![Token::bare("match")];
        head.extend(value);
        self.emitter
            .raw(&format!("{}{}:\n", pad(tabs), join(&head)));

        let mut inner = TokenStream::new(block);
        let mut ctx = ctx;
        while inner.has_next() {
            let Some(next) = inner.next() else { break };

            if next.text.starts_with("\"\"\"") || next.text.starts_with("'''") {
                self.emitter.raw(&next.text);
                self.emitter.raw("\n");
                continue;
            }

            match next.text.as_str() {
                "case" => {
                    ctx = self.stmt_block("case", false, &mut inner, tabs + 1, ctx);
                }
                "default" => {
                    ctx = self.stmt_simple_block("case _", &next, &mut inner, tabs + 1, ctx);
                }
                _ => {
                    self.diagnostics.error(
                        DiagnosticCategory::Syntax,
                        "invalid identifier in \"match\" statement body",
                        &next,
                    );
                }
            }
        }

        ctx
    }

    pub(super) fn stmt_enum(
        &mut self,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let name = self.until("{", ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        let in_tabs;
        if name.is_empty() {
            if block.is_empty() {
                return ctx;
            }
            in_tabs = tabs;
        } else {
            if name.len() > 1 {
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    "enum name should contain only one token",
                    &name[0],
                );
            }

            let head = alloc::vec![Token::bare("class"), name[0].clone()];
            self.emitter.raw(&format!("{}{}:", pad(tabs), join(&head)));

            if block.is_empty() {
                self.emitter.raw("pass\n");
                return ctx;
            }
            self.emitter.raw("\n");
            in_tabs = tabs + 1;
        }

        let (targets, assignments) = self.assignment_chain(&block, in_tabs);

        // 裸の名前には通し番号を1行で割り当て、明示的な代入を後に続ける
        if !targets.is_empty() {
            let count = targets.iter().filter(|t| t.text != ",").count();
            self.emitter.raw(&format!(
                "{}{}=range({})\n",
                pad(in_tabs),
                join(&targets),
                count
            ));
        }
        self.emitter.raw(&assignments);

        ctx
    }

    /// カンマ区切りの(連鎖しうる)代入列を分解する。
    /// 最上位に代入演算子を含む項は`lhs op rhs`の行としてバッファへ、
    /// 含まない項は裸のターゲットとしてカンマ区切りのトークン列へ積む。
    pub(super) fn assignment_chain(
        &mut self,
        tokens: &[Token],
        tabs: usize,
    ) -> (Vec<Token>, String) {
        let mut targets: Vec<Token> = Vec::new();
        let mut lines = String::new();

        if tokens.is_empty() {
            return (targets, lines);
        }

        let mut ts = TokenStream::new(tokens.to_vec());
        loop {
            let item = scan_until(",", &mut ts, &mut self.diagnostics, false, false, &[]).tokens;

            if item.is_empty() {
                if !ts.has_next() {
                    break;
                }
                continue;
            }

            // 項の中の最上位の代入演算子を探す
            let mut round = 0i32;
            let mut square = 0i32;
            let mut curly = 0i32;
            let mut op_index: Option<usize> = None;
            for (idx, token) in item.iter().enumerate() {
                match token.text.as_str() {
                    "(" => round += 1,
                    ")" => round -= 1,
                    "[" => square += 1,
                    "]" => square -= 1,
                    "{" => curly += 1,
                    "}" => curly -= 1,
                    text if round == 0
                        && square == 0
                        && curly == 0
                        && SET_OPS.contains(&text) =>
                    {
                        op_index = Some(idx);
                        break;
                    }
                    _ => {}
                }
            }

            match op_index {
                Some(idx) => {
                    let lhs = join(&item[..idx]);
                    let rhs = join(&item[idx + 1..]);
                    lines.push_str(&format!(
                        "{}{}{}{}\n",
                        pad(tabs),
                        lhs,
                        item[idx].text,
                        rhs
                    ));
                }
                None => {
                    if !targets.is_empty() {
                        targets.push(Token::bare(","));
                    }
                    targets.extend(item.iter().cloned());
                }
            }

            if !ts.has_next() {
                break;
            }
        }

        (targets, lines)
    }

    // --- リソースブロックとクエリ ---

    pub(super) fn stmt_resource(
        &mut self,
        kind: ResourceKind,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let content = self.until("{", ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        let already = match kind {
            ResourceKind::MySql => self.mysql_header_done,
            ResourceKind::Mongo => self.mongo_header_done,
        };
        if !already {
            match kind {
                ResourceKind::MySql => self.mysql_header_done = true,
                ResourceKind::Mongo => self.mongo_header_done = true,
            }
            self.emitter.header(kind.header());
            self.emitter.header("\n");
        }

        let mut head = alloc::vec![Token::bare(format!("with {}(", kind.constructor()))];
        head.extend(content);
        head.push(Token::bare(")as db"));
        self.emitter.raw(&format!("{}{}", pad(tabs), join(&head)));

        if block.is_empty() {
            self.emitter.raw(":pass\n");
            return ctx;
        }
        self.emitter.raw(":\n");

        self.scopes.push(None, ScopeKind::ResourceBlock);
        let mut inner = TokenStream::new(block);
        self.compile_block(&mut inner, tabs + 1, ctx.clone());
        self.scopes.pop();

        ctx
    }

    pub(super) fn stmt_query(
        &mut self,
        keyword: &Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let capture = if ts.peek().map_or(false, |t| t.text == "(") {
            ts.next();
            let target = extract_balanced("(", ")", ts, &mut self.diagnostics);
            let mut capture = join(&target);
            capture.push('=');
            capture
        } else {
            String::new()
        };

        let params = self.until("{", ts);
        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        if self.scopes.lookup(ScopeKind::ResourceBlock).is_none() {
            self.diagnostics.error(
                DiagnosticCategory::Context,
                "\"query\" statement cannot be used outside of a DB block",
                keyword,
            );
            return ctx;
        }

        // クエリ本文はエスケープ済みのパラメータ化文字列として埋め込む
        let mut call = alloc::vec![
            Token::bare("db.execute(f'"),
            Token::bare(encode(&join(&block))),
            Token::bare("',"),
        ];
        call.extend(params);
        call.push(Token::bare(")"));

        self.emitter
            .raw(&format!("{}{}{}\n", pad(tabs), capture, join(&call)));

        ctx
    }

    // --- 裸の文とフック定義 ---

    pub(super) fn bare_statement(
        &mut self,
        name: Token,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: LoopContext,
    ) -> LoopContext {
        let Some(peeked) = ts.peek().cloned() else {
            self.diagnostics.error(
                DiagnosticCategory::Syntax,
                "unknown statement or identifier",
                &name,
            );
            return ctx;
        };

        let text = peeked.text.as_str();
        if !SET_OPS.contains(&text) && !matches!(text, "," | "(" | "!" | ".") {
            self.diagnostics.error(
                DiagnosticCategory::Syntax,
                "unknown statement or identifier",
                &name,
            );
            return ctx;
        }

        match text {
            "(" => {
                let back_pos = ts.pos();
                ts.next();
                let args = extract_balanced("(", ")", ts, &mut self.diagnostics);

                if ts.peek().map_or(false, |t| t.text == "{") {
                    // 関数・メソッド定義。クラス内なら暗黙の第1引数を足す
                    ts.next();

                    let in_class = matches!(self.scopes.peek(), Some((_, ScopeKind::Class)));
                    let def_name = name.text.clone();
                    self.emit_function_def(&name, &def_name, args, in_class, ts, tabs, &ctx);
                } else {
                    // 呼び出し式: 名前まで巻き戻して文末まで1行で通す
                    ts.set_pos(back_pos - 1);
                    let expr = self.until(";", ts);
                    self.emitter.raw(&format!("{}{}\n", pad(tabs), join(&expr)));
                }
                ctx
            }
            "!" => {
                ts.next();
                self.hook_statement(&name, ts, tabs, &ctx);
                ctx
            }
            _ => {
                // (連鎖しうる)代入文: 名前まで巻き戻して文末まで1行で通す
                ts.set_pos(ts.pos() - 1);
                let expr = self.until(";", ts);
                self.emitter.raw(&format!("{}{}\n", pad(tabs), join(&expr)));
                ctx
            }
        }
    }

    /// `name!`形式のプロトコルフック定義と`operator![op]`の解決。
    /// 未知の名前はエラーを記録した上で安全な既定の識別子に置き換え、
    /// 構文的に完全な定義を出力してコンパイルを続行する。
    fn hook_statement(&mut self, name: &Token, ts: &mut TokenStream, tabs: usize, ctx: &LoopContext) {
        if name.text == "operator" {
            match ts.peek() {
                Some(t) if t.text == "[" => {
                    ts.next();
                }
                Some(t) => {
                    let at = t.clone();
                    self.diagnostics.error(
                        DiagnosticCategory::Syntax,
                        "expecting \"[\" after \"operator!\"",
                        &at,
                    );
                }
                None => {
                    self.diagnostics.error(
                        DiagnosticCategory::Syntax,
                        "expecting \"[\" after \"operator!\"",
                        name,
                    );
                }
            }

            let bracket = ts.last().clone();
            let op_tokens = extract_balanced("[", "]", ts, &mut self.diagnostics);
            let op = join(&op_tokens);

            let hook = match self.tables.operators.get(op.as_str()) {
                Some(hook) => *hook,
                None => {
                    let mut at = bracket;
                    at.text = op;
                    self.diagnostics
                        .error(DiagnosticCategory::Syntax, "unknown operator", &at);
                    "__add__"
                }
            };

            self.hook_definition(name, hook, "operator overloading", ts, tabs, ctx);
        } else if let Some(hook) = self.tables.hooks.get(name.text.as_str()).copied() {
            self.hook_definition(name, hook, "magic methods", ts, tabs, ctx);
        } else {
            self.diagnostics.error(
                DiagnosticCategory::Syntax,
                "unknown identifier. expecting magic method or operator overloading",
                name,
            );
            self.hook_definition(name, "__init__", "magic methods", ts, tabs, ctx);
        }
    }

    fn hook_definition(
        &mut self,
        name: &Token,
        def_name: &str,
        what: &str,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: &LoopContext,
    ) {
        match ts.peek() {
            Some(t) if t.text == "(" => {
                ts.next();
            }
            Some(t) => {
                let at = t.clone();
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    "invalid syntax: expecting \"(\" after method name",
                    &at,
                );
            }
            None => {
                self.diagnostics.error(
                    DiagnosticCategory::Syntax,
                    "invalid syntax: expecting \"(\" after method name",
                    name,
                );
            }
        }

        let args = extract_balanced("(", ")", ts, &mut self.diagnostics);

        // ブロックが続かないならフック定義ではない。ここで打ち切る。
        if !ts.peek().map_or(false, |t| t.text == "{") {
            return;
        }
        ts.next();

        if !matches!(self.scopes.peek(), Some((_, ScopeKind::Class))) {
            self.diagnostics.error(
                DiagnosticCategory::Context,
                format!("{what} can only be used inside a class"),
                name,
            );
        }

        self.emit_function_def(name, def_name, args, true, ts, tabs, ctx);
    }

    /// `def`行と本体を出力する共通部。開き波括弧は消費済みであること。
    /// 本体の先頭では出力アキュムレータを参照キャプチャし、
    /// 入れ子の関数からの書き込みが呼び出し側から見えるようにする。
    fn emit_function_def(
        &mut self,
        name: &Token,
        def_name: &str,
        args: Vec<Token>,
        implicit_this: bool,
        ts: &mut TokenStream,
        tabs: usize,
        ctx: &LoopContext,
    ) {
        let args = if implicit_this {
            let mut with_this = alloc::vec![Token::bare("this")];
            if !args.is_empty() {
                with_this.push(Token::bare(","));
            }
            with_this.extend(args);
            with_this
        } else {
            args
        };
        let args_string = join(&args);

        let in_class = matches!(self.scopes.peek(), Some((_, ScopeKind::Class)));
        if self.next_abstract {
            self.next_abstract = false;
            if !in_class {
                self.diagnostics.error(
                    DiagnosticCategory::Context,
                    "cannot create abstract method outside of a class",
                    name,
                );
            } else {
                self.emitter.raw(&format!("{}@abstractmethod\n", pad(tabs)));
            }
        }
        if self.next_static {
            self.next_static = false;
            if !in_class {
                self.diagnostics.error(
                    DiagnosticCategory::Context,
                    "cannot create static method outside of a class",
                    name,
                );
            } else {
                self.emitter.raw(&format!("{}@classmethod\n", pad(tabs)));
            }
        }

        let block = extract_balanced("{", "}", ts, &mut self.diagnostics);

        self.emitter
            .raw(&format!("{}def {}({}):", pad(tabs), def_name, args_string));

        if block.is_empty() {
            self.emitter.raw("pass\n");
            return;
        }

        self.emitter.raw("\n");
        self.emitter
            .raw(&format!("{}nonlocal _PAGE_BUF\n", pad(tabs + 1)));

        self.scopes
            .push(Some(name.text.clone()), ScopeKind::Function);
        let mut inner = TokenStream::new(block);
        self.compile_block(&mut inner, tabs + 1, ctx.clone());
        self.scopes.pop();
    }
}

/// クエリ本文を`\uXXXX`エスケープ列に変換する。
/// リテラル内の引用符や改行が生成コードの文字列を壊さないようにする。
fn encode(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        out.push_str(&format!("\\u{:04x}", ch as u32));
    }
    out
}
