use webscript_core::error::Diagnostics;
use webscript_core::scanner::{extract_balanced, scan_until};
use webscript_core::scope::{ScopeKind, ScopeStack};
use webscript_core::{join, tokenize, TokenStream};

fn texts(source: &str) -> Vec<String> {
    tokenize(source).into_iter().map(|t| t.text).collect()
}

#[test]
fn identifiers_and_symbols_split_as_expected() {
    assert_eq!(texts("echo x;"), ["echo", "x", ";"]);
    assert_eq!(texts("a.b(c)"), ["a", ".", "b", "(", "c", ")"]);
    assert_eq!(texts("x_1 = y2"), ["x_1", "=", "y2"]);
}

#[test]
fn line_comments_are_skipped() {
    assert_eq!(texts("a # comment ; with ; symbols\nb"), ["a", "b"]);
}

#[test]
fn comment_marker_inside_literal_is_kept() {
    assert_eq!(texts("\"a#b\""), ["\"a#b\""]);
    assert_eq!(texts("'a#b'"), ["'a#b'"]);
}

#[test]
fn the_two_quote_styles_do_not_interact() {
    // 一方のクォートの内側では他方はただの文字
    assert_eq!(texts("\"it's\""), ["\"it's\""]);
    assert_eq!(texts("'say \"hi\"'"), ["'say \"hi\"'"]);
}

#[test]
fn multi_character_operators_are_coalesced() {
    assert_eq!(texts("a **= b"), ["a", "**=", "b"]);
    assert_eq!(texts("a //= b"), ["a", "//=", "b"]);
    assert_eq!(texts("x <<= 2"), ["x", "<<=", "2"]);
    assert_eq!(texts("x >>= 2"), ["x", ">>=", "2"]);
    assert_eq!(texts("a != b"), ["a", "!=", "b"]);
    assert_eq!(texts("a <= b >= c"), ["a", "<=", "b", ">=", "c"]);
    assert_eq!(texts("i %= 2"), ["i", "%=", "2"]);
    assert_eq!(texts("i += 1; j -= 1"), ["i", "+=", "1", ";", "j", "-=", "1"]);
    assert_eq!(texts("m &= n |= o ^= p"), ["m", "&=", "n", "|=", "o", "^=", "p"]);
}

#[test]
fn literal_prefixes_absorb_the_literal() {
    assert_eq!(texts("f\"val {x}\""), ["f\"val {x}\""]);
    assert_eq!(texts("r'raw\\n'"), ["r'raw\\n'"]);
    assert_eq!(texts("rb\"bytes\""), ["rb\"bytes\""]);
}

#[test]
fn triple_quoted_literals_are_stitched_back_together() {
    assert_eq!(texts("\"\"\"doc\"\"\""), ["\"\"\"doc\"\"\""]);
    assert_eq!(texts("'''doc'''"), ["'''doc'''"]);
}

#[test]
fn bare_super_gets_a_synthetic_call() {
    assert_eq!(texts("super;"), ["super", "()", ";"]);
    // 明示的な呼び出しには挿入されない
    assert_eq!(texts("super(a);"), ["super", "(", "a", ")", ";"]);
}

#[test]
fn tokens_carry_positions() {
    let tokens = tokenize("ab cd\n ef");
    assert_eq!(tokens[0].span.line, 1);
    assert_eq!(tokens[0].span.column, 0);
    assert_eq!(tokens[1].span.line, 1);
    assert_eq!(tokens[1].span.column, 3);
    assert_eq!(tokens[2].span.line, 2);
    assert_eq!(tokens[2].span.column, 1);
    // 全トークンに総行数が刻まれる
    assert!(tokens.iter().all(|t| t.max_line == 2));
}

/// `join`の結果を再字句解析すると元と同じトークン列に戻る。
#[test]
fn join_then_retokenize_reproduces_the_stream() {
    let sources = [
        "a+=1;echo 2;",
        "x = y ** 2; arr[0] = f\"val {x}\";",
        "if (a != b) { run(a, b); }",
        "for i = 0; i < 10; i += 1 { echo i; }",
        "value 123",
        "s = \"a b  c\";",
    ];

    for source in sources {
        let original = tokenize(source);
        let rejoined = join(&original);
        let reparsed = tokenize(&rejoined);

        let original_texts: Vec<&str> = original.iter().map(|t| t.text.as_str()).collect();
        let reparsed_texts: Vec<&str> = reparsed.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            original_texts, reparsed_texts,
            "round trip changed the token stream for {:?} (joined: {:?})",
            source, rejoined
        );
    }
}

#[test]
fn join_separates_identifier_boundaries_only() {
    let tokens = tokenize("return value");
    assert_eq!(join(&tokens), "return value");

    let tokens = tokenize("a.b(c)");
    assert_eq!(join(&tokens), "a.b(c)");

    // 識別子に続く数字列にも空白が要る
    let tokens = tokenize("value 123");
    assert_eq!(join(&tokens), "value 123");
}

#[test]
fn fork_gives_an_independent_cursor() {
    let mut ts = TokenStream::new(tokenize("a b c"));
    ts.next();

    let mut forked = ts.fork();
    forked.next();
    forked.next();

    assert!(!forked.has_next());
    assert_eq!(ts.peek().unwrap().text, "b");
    assert_eq!(ts.last().text, "a");
}

/// 対応する閉じ括弧までのトークンを括弧抜きで返し、
/// カーソルは閉じ括弧の直後に置かれる。
#[test]
fn extract_balanced_returns_exactly_the_enclosed_tokens() {
    let mut diagnostics = Diagnostics::new();
    let mut ts = TokenStream::new(tokenize("(a,(b),c)=x"));
    ts.next(); // "(" は消費済みの前提

    let inner = extract_balanced("(", ")", &mut ts, &mut diagnostics);
    let inner_texts: Vec<&str> = inner.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(inner_texts, ["a", ",", "(", "b", ")", ",", "c"]);
    assert_eq!(ts.peek().unwrap().text, "=");
    assert!(!diagnostics.had_error());
}

#[test]
fn scan_until_ignores_terminators_inside_brackets() {
    let mut diagnostics = Diagnostics::new();
    let mut ts = TokenStream::new(tokenize("f(a;b);rest"));

    let outcome = scan_until(";", &mut ts, &mut diagnostics, true, false, &[]);
    let collected: Vec<&str> = outcome.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(collected, ["f", "(", "a", ";", "b", ")"]);
    assert_eq!(outcome.found.unwrap().text, ";");
    assert_eq!(ts.peek().unwrap().text, "rest");
    assert!(!diagnostics.had_error());
}

/// 開き括弧が1つ閉じられていない入力では、その括弧の位置を指す
/// `unbalanced`診断がちょうど1件報告される。
#[test]
fn one_unmatched_bracket_reports_one_unbalanced_diagnostic() {
    let mut diagnostics = Diagnostics::new();
    let source = "a = (b";
    let tokens = tokenize(source);
    let open_span = tokens[2].span;
    let mut ts = TokenStream::new(tokens);

    scan_until(";", &mut ts, &mut diagnostics, true, false, &[]);

    let unbalanced: Vec<_> = diagnostics
        .list()
        .iter()
        .filter(|d| d.message.contains("unbalanced"))
        .collect();
    assert_eq!(unbalanced.len(), 1);
    assert_eq!(unbalanced[0].span, open_span);
}

#[test]
fn escaped_tokens_are_consumed_into_the_output() {
    let mut diagnostics = Diagnostics::new();
    let mut ts = TokenStream::new(tokenize("a \\; b;"));

    let outcome = scan_until(";", &mut ts, &mut diagnostics, true, false, &[]);
    let collected: Vec<&str> = outcome.tokens.iter().map(|t| t.text.as_str()).collect();
    // エスケープされたセミコロンは終端と見なされず出力に入る
    assert_eq!(collected, ["a", ";", "b"]);
    assert!(outcome.found.is_some());
}

#[test]
fn forbidden_tokens_abort_the_scan() {
    let mut diagnostics = Diagnostics::new();
    let mut ts = TokenStream::new(tokenize("a = b, c"));

    let outcome = scan_until(",", &mut ts, &mut diagnostics, false, false, &["="]);
    assert!(outcome.found.is_none());
    let collected: Vec<&str> = outcome.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(collected, ["a"]);
}

#[test]
fn scope_stack_lookup_and_location() {
    let mut scopes = ScopeStack::new();
    scopes.push(Some("Page".into()), ScopeKind::Class);
    scopes.push(Some("render".into()), ScopeKind::Function);

    assert!(scopes.lookup(ScopeKind::Function).is_some());
    assert!(scopes.lookup(ScopeKind::ResourceBlock).is_none());
    assert_eq!(scopes.render_location(), "in Page.render()");

    scopes.pop();
    assert!(scopes.lookup(ScopeKind::Function).is_none());
    assert_eq!(scopes.render_location(), "in Page");
}
