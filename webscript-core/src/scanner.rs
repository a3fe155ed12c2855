//! 括弧の深さを追跡しながらトークン列を走査する構造スキャナ。
//!
//! 文法を再帰下降で書く代わりに、各構文ハンドラはこの2つのプリミティブで
//! 「条件」「ブロック」「引数リスト」を切り出す。リテラルは字句解析の段階で
//! 1トークンに畳まれているため、リテラル内の括弧が深さを乱すことはない。

extern crate alloc;
use crate::error::{DiagnosticCategory, Diagnostics};
use crate::stream::TokenStream;
use crate::token::Token;
use alloc::format;
use alloc::vec::Vec;

/// `scan_until`の結果。
/// `found`は見つかった終端トークン(`advance`指定時はその次のトークン)。
/// 終端が見つからなかった場合と禁止トークンで打ち切った場合はNone。
#[derive(Debug)]
pub struct ScanOutcome {
    pub found: Option<Token>,
    pub tokens: Vec<Token>,
}

/// 3種の括弧`()` `[]` `{}`の深さがすべて0の位置で`target`に一致する
/// トークンまで走査する。`target`自身が`{`のときは`{}`の深さ追跡を
/// 打ち切り、二重カウントを避ける。
///
/// - `\`トークンは次のトークンを無条件に出力へ加える(終端判定を免れる)。
/// - `forbidden`内のトークンに出会うと、終端未発見として早期に戻る。
/// - `require`時、終端が見つからず枯渇したら`expecting character`を報告する。
/// - `advance`時、終端の次のトークンまで消費して`found`として返す。
///
/// 枯渇時に深さが0でない括弧があれば、その種類の最後の括弧トークン
/// (1つも見ていなければ列の末尾)を指して`unbalanced brackets`を報告する。
pub fn scan_until(
    target: &str,
    ts: &mut TokenStream,
    diagnostics: &mut Diagnostics,
    require: bool,
    advance: bool,
    forbidden: &[&str],
) -> ScanOutcome {
    let mut round = 0i32;
    let mut square = 0i32;
    let mut curly = 0i32;
    let mut last_round: Option<Token> = None;
    let mut last_square: Option<Token> = None;
    let mut last_curly: Option<Token> = None;
    let mut current: Option<Token> = None;
    let mut buf: Vec<Token> = Vec::new();

    while ts.has_next() {
        let next = match ts.next() {
            Some(token) => token,
            None => break,
        };
        current = Some(next.clone());

        match next.text.as_str() {
            "(" => {
                last_round = Some(next.clone());
                round += 1;
            }
            ")" => {
                last_round = Some(next.clone());
                round -= 1;
            }
            "[" => {
                last_square = Some(next.clone());
                square += 1;
            }
            "]" => {
                last_square = Some(next.clone());
                square -= 1;
            }
            "{" if target != "{" => {
                last_curly = Some(next.clone());
                curly += 1;
            }
            "}" if target != "{" => {
                last_curly = Some(next.clone());
                curly -= 1;
            }
            "\\" => {
                match ts.next() {
                    Some(escaped) => buf.push(escaped),
                    None => {
                        diagnostics.error(DiagnosticCategory::Syntax, "cannot escape here", &next);
                        return ScanOutcome {
                            found: Some(next),
                            tokens: buf,
                        };
                    }
                }
                continue;
            }
            _ => {}
        }

        if forbidden.contains(&next.text.as_str()) {
            if advance && ts.has_next() {
                ts.next();
            }
            return ScanOutcome {
                found: None,
                tokens: buf,
            };
        }

        if round == 0 && square == 0 && curly == 0 && next.text == target {
            let found = if advance && ts.has_next() {
                ts.next()
            } else {
                Some(next)
            };
            return ScanOutcome { found, tokens: buf };
        }

        buf.push(next);
    }

    if round != 0 {
        report_unbalanced(diagnostics, "unbalanced brackets ()", &last_round, ts);
    }
    if square != 0 {
        report_unbalanced(diagnostics, "unbalanced brackets []", &last_square, ts);
    }
    if curly != 0 {
        report_unbalanced(diagnostics, "unbalanced brackets {}", &last_curly, ts);
    }

    if require {
        let at = current
            .or_else(|| ts.final_token().cloned())
            .unwrap_or_else(|| Token::bare(""));
        diagnostics.error(
            DiagnosticCategory::Syntax,
            format!("expecting character \"{target}\""),
            &at,
        );
    }

    ScanOutcome {
        found: None,
        tokens: buf,
    }
}

fn report_unbalanced(
    diagnostics: &mut Diagnostics,
    message: &str,
    last_bracket: &Option<Token>,
    ts: &TokenStream,
) {
    let at = last_bracket
        .clone()
        .or_else(|| ts.final_token().cloned())
        .unwrap_or_else(|| Token::bare(""));
    diagnostics.error(DiagnosticCategory::Syntax, message, &at);
}

/// 開き括弧1つをすでに消費した状態から、対応する閉じ括弧までを
/// 1種類の深さカウンタで抜き出す。返り値は括弧の内側のトークンのみで、
/// カーソルは閉じ括弧の直後に置かれる。
pub fn extract_balanced(
    open: &str,
    close: &str,
    ts: &mut TokenStream,
    diagnostics: &mut Diagnostics,
) -> Vec<Token> {
    let mut buf: Vec<Token> = Vec::new();

    let mut last_paren = match ts.peek() {
        Some(token) => token.clone(),
        None => {
            let at = ts
                .final_token()
                .cloned()
                .unwrap_or_else(|| Token::bare(""));
            diagnostics.error(
                DiagnosticCategory::Syntax,
                format!("unbalanced parenthesis \"{open}{close}\""),
                &at,
            );
            return buf;
        }
    };

    let mut depth = 1i32;
    while let Some(next) = ts.next() {
        if next.text == open {
            last_paren = next.clone();
            depth += 1;
        } else if next.text == close {
            last_paren = next.clone();
            depth -= 1;
        }

        if depth == 0 {
            return buf;
        }

        buf.push(next);
    }

    diagnostics.error(
        DiagnosticCategory::Syntax,
        format!("unbalanced parenthesis \"{open}{close}\""),
        &last_paren,
    );
    buf
}

/// 深さを見ないフラットな走査。構文エラーからの再同期に使う。
pub fn skip_until(target: &str, ts: &mut TokenStream, diagnostics: &mut Diagnostics) -> Option<Token> {
    let mut current: Option<Token> = None;

    while ts.has_next() {
        let next = match ts.next() {
            Some(token) => token,
            None => break,
        };

        if next.text == "\\" {
            ts.next();
            current = Some(next);
            continue;
        }

        if next.text == target {
            return Some(next);
        }

        current = Some(next);
    }

    let at = current
        .or_else(|| ts.final_token().cloned())
        .unwrap_or_else(|| Token::bare(""));
    diagnostics.error(
        DiagnosticCategory::Syntax,
        format!("expecting character \"{target}\""),
        &at,
    );
    None
}
