//! トークン列の上を進む巻き戻し可能なカーソル(Token Cursor)と、
//! トークン列をソース等価なテキストへ戻す`join`を提供する。

extern crate alloc;
use crate::token::{is_digit_run, is_identifier, Token};
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// トークン列と現在位置。`fork()`はトークン本体を複製せず、
/// 位置だけを複製した投機的な先読み用カーソルを返す。
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Rc<Vec<Token>>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: Rc::new(tokens),
            pos: 0,
        }
    }

    /// 同じトークン配列を共有する独立カーソルを作る。
    pub fn fork(&self) -> Self {
        Self {
            tokens: Rc::clone(&self.tokens),
            pos: self.pos,
        }
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.tokens.len()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// 1トークン消費する。枯渇時はNoneを返し、診断の発行は呼び出し側の責務。
    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        Some(token)
    }

    /// 直前に`next()`で消費したトークン。
    /// 一度も消費していないカーソルに対して呼んではならない。
    pub fn last(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    /// 診断を紐付けるのに最も適したトークン。
    /// 直前に消費したトークン、無ければ列の末尾。
    pub fn anchor(&self) -> Option<&Token> {
        if self.pos > 0 {
            self.tokens.get(self.pos - 1)
        } else {
            self.tokens.last()
        }
    }

    /// 列の最後のトークン(枯渇時の診断位置に使う)。
    pub fn final_token(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// 巻き戻し。投機的に読み進めた後の復帰に使う。
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// トークン列をソース等価なテキストに連結する。
///
/// 基本は直結だが、識別子どうし・識別子に続く数字列の境界には
/// 空白を1つ挟み、再字句解析で意図せず1トークンへ融合しないようにする。
/// これは字句解析器の識別子伸長規則のちょうど逆にあたる:
/// `join`した結果を再度字句解析すると、元と同じトークン列が得られる。
pub fn join(tokens: &[Token]) -> String {
    let mut buf = String::new();
    let mut last_is_identifier = false;
    let mut last_text: Option<&str> = None;

    for token in tokens {
        let text = token.text.as_str();

        if is_identifier(text) {
            if last_is_identifier {
                buf.push(' ');
                buf.push_str(text);
                last_text = Some(text);
                continue;
            }
            last_is_identifier = true;
        } else {
            last_is_identifier = is_digit_run(text);

            if let Some(prev) = last_text {
                let mut merged = String::from(prev);
                merged.push_str(text);
                if is_identifier(&merged) {
                    buf.push(' ');
                    buf.push_str(text);
                    last_text = Some(text);
                    continue;
                }
            }
        }

        last_text = Some(text);
        buf.push_str(text);
    }

    buf
}
