//! ソースコード文字列をトークンのシーケンスに変換する字句解析器(Lexer)。
//!
//! 1パスの文字走査で、2種類のクォート、`#`行コメント、記号/識別子の
//! 連結規則を文脈付きで処理する。走査後に空トークンの除去と
//! 複数文字演算子への結合を行う。字句解析そのものは失敗しない:
//! 閉じられなかったリテラルは入力末尾まで開いたままのトークンになり、
//! 下流のカーソル枯渇として報告される。

extern crate alloc;
use crate::span::Span;
use crate::token::Token;
use alloc::string::String;
use alloc::vec::Vec;

/// ソース全体をトークン列に変換する。
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut line = 1usize;
    let mut pos = 0usize;
    let mut tmp: Vec<Token> = Vec::new();
    tmp.push(Token::new(String::new(), Span { line, column: pos }));

    let mut in_comment = false;
    let mut in_string = false;
    let mut in_string_alt = false;
    // 直前の文字が記号だったか。識別子を1文字ずつ伸ばすか
    // 新しいトークンを開始するかの判定に使う。
    let mut last_sym = false;

    for ch in source.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
                line += 1;
                pos = 0;
                tmp.push(Token::new(String::new(), Span { line, column: pos }));
                continue;
            }
            pos += 1;
            continue;
        }

        match ch {
            ' ' | '\t' => {
                if in_string || in_string_alt {
                    append_char(&mut tmp, ch);
                } else {
                    tmp.push(Token::new(String::new(), Span { line, column: pos + 1 }));
                }
            }
            '#' => {
                if in_string || in_string_alt {
                    append_char(&mut tmp, ch);
                } else {
                    in_comment = true;
                }
            }
            '\n' => {
                line += 1;
                pos = 0;
                if in_string || in_string_alt {
                    append_char(&mut tmp, ch);
                } else {
                    tmp.push(Token::new(String::new(), Span { line, column: pos }));
                    continue;
                }
            }
            '"' => {
                if in_string {
                    append_char(&mut tmp, ch);
                    in_string = false;
                } else if in_string_alt {
                    append_char(&mut tmp, ch);
                } else {
                    tmp.push(Token::new("\"", Span { line, column: pos }));
                    in_string = true;
                }
            }
            '\'' => {
                if in_string_alt {
                    append_char(&mut tmp, ch);
                    in_string_alt = false;
                } else if in_string {
                    append_char(&mut tmp, ch);
                } else {
                    tmp.push(Token::new("'", Span { line, column: pos }));
                    in_string_alt = true;
                }
            }
            _ => {
                if in_string || in_string_alt {
                    append_char(&mut tmp, ch);
                } else if ch.is_alphanumeric() || ch == '_' {
                    if last_sym {
                        last_sym = false;
                        tmp.push(Token::new(ch, Span { line, column: pos }));
                    } else {
                        append_char(&mut tmp, ch);
                    }
                } else {
                    last_sym = true;
                    tmp.push(Token::new(ch, Span { line, column: pos }));
                }
            }
        }

        pos += 1;
    }

    // 行頭・トークン開始の目印として作った空トークンを落とし、
    // 残ったトークンに総行数を刻む。
    tmp.retain(|token| !token.text.is_empty());
    for token in &mut tmp {
        token.max_line = line;
    }

    normalize_super(coalesce(tmp))
}

fn append_char(tmp: &mut Vec<Token>, ch: char) {
    if let Some(last) = tmp.last_mut() {
        last.text.push(ch);
    }
}

/// 隣接する1文字記号を既知の複数文字演算子へ結合する後処理。
/// シフト・冪・床除算の系列は3文字目(`=`)まで吸収できる。
/// 空リテラル(`""`/`''`)は後続のリテラル開始を吸収するか、
/// 直前のリテラル終端へ逆向きに併合する(三重クォートの縫い合わせ)。
fn coalesce(tmp: Vec<Token>) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(tmp.len());
    let mut i = 0usize;

    while i + 1 < tmp.len() {
        let mut token = tmp[i].clone();
        i += 1;

        match token.text.as_str() {
            "+" | "-" | "|" | "&" => {
                if tmp[i].text == "=" {
                    token.text.push('=');
                    i += 1;
                }
                tokens.push(token);
                continue;
            }
            "f" | "r" | "b" | "fr" | "br" | "rf" | "rb" => {
                if tmp[i].text.starts_with('"') || tmp[i].text.starts_with('\'') {
                    token.text.push_str(&tmp[i].text);
                    i += 1;
                }
            }
            "!" | ":" | "^" | "%" | "=" => {
                if tmp[i].text == "=" {
                    token.text.push('=');
                    i += 1;
                }
            }
            "*" | "/" | ">" | "<" => {
                let repeat = token.text.clone();
                if tmp[i].text == repeat {
                    i += 1;
                    token.text.push_str(&repeat);
                    if i < tmp.len() && tmp[i].text == "=" {
                        token.text.push('=');
                        i += 1;
                    }
                } else if tmp[i].text == "=" {
                    token.text.push('=');
                    i += 1;
                }
            }
            "\"\"" => {
                if tmp[i].text.starts_with('"') {
                    token.text.push_str(&tmp[i].text);
                    i += 1;
                } else if tokens.last().map_or(false, |prev| prev.text.ends_with('"')) {
                    if let Some(prev) = tokens.last_mut() {
                        prev.text.push_str(&token.text);
                    }
                    continue;
                }
            }
            "''" => {
                if tmp[i].text.starts_with('\'') {
                    token.text.push_str(&tmp[i].text);
                    i += 1;
                } else if tokens.last().map_or(false, |prev| prev.text.ends_with('\'')) {
                    if let Some(prev) = tokens.last_mut() {
                        prev.text.push_str(&token.text);
                    }
                    continue;
                }
            }
            _ => {}
        }

        tokens.push(token);
    }

    // 末尾トークンは結合の対象にならないが、空リテラルの逆併合だけは効く。
    if i < tmp.len() {
        let last = tmp[i].clone();
        match last.text.as_str() {
            "\"\"" => {
                if tokens.last().map_or(false, |prev| prev.text.ends_with('"')) {
                    if let Some(prev) = tokens.last_mut() {
                        prev.text.push_str(&last.text);
                    }
                }
            }
            "''" => {
                if tokens.last().map_or(false, |prev| prev.text.ends_with('\'')) {
                    if let Some(prev) = tokens.last_mut() {
                        prev.text.push_str(&last.text);
                    }
                }
            }
            _ => tokens.push(last),
        }
    }

    tokens
}

/// `super`の直後に`(`が無ければ合成トークン`()`を挿入し、
/// `super;`が引数なし呼び出しとして出力されるようにする。
fn normalize_super(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let is_super = token.text == "super";
        out.push(token);
        if is_super {
            if let Some(next) = iter.peek() {
                if next.text != "(" {
                    out.push(Token::bare("()"));
                }
            }
        }
    }

    out
}
