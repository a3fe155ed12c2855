// webscript-cli/src/main.rs

use clap::Parser;
use std::{
    fs,
    io::{self, Read},
};
use webscript_core::{compile_source, DiagnosticKind};

/// コマンドライン引数を定義するための構造体
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// 入力ファイル。省略時は標準入力から読む。
    #[arg(short, long)]
    input: Option<String>,
    /// 生成コードの出力先ファイル。`--check`時は省略できる。
    #[arg(short, long)]
    output: Option<String>,
    /// 診断だけを行い、ファイルを書き出さない。
    #[arg(long)]
    check: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // コマンドライン引数をパース
    let cli = Cli::parse();

    // --- 1. 入力コードの読み込み ---
    let mut source_code = String::new();
    match cli.input {
        Some(path) => {
            source_code = fs::read_to_string(&path)
                .map_err(|e| format!("ファイル '{}' の読み込みに失敗しました: {}", path, e))?;
        }
        None => {
            io::stdin().read_to_string(&mut source_code)?;
        }
    }

    // --- 2. コンパイル ---
    println!("コンパイル中...");
    let unit = compile_source(source_code.trim());

    for diagnostic in &unit.diagnostics {
        eprintln!("{}", diagnostic.to_colored_string());
    }

    if unit.had_error {
        let errors = unit
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
            .count();
        return Err(format!("{} 件のエラーが発生したため、出力を破棄しました。", errors).into());
    }

    if cli.check {
        println!("エラーはありませんでした。");
        return Ok(());
    }

    // --- 3. 生成コードの書き出し ---
    let Some(output) = cli.output else {
        return Err("出力先 (--output) が指定されていません。".into());
    };
    fs::write(&output, unit.program())
        .map_err(|e| format!("ファイル '{}' への書き込みに失敗しました: {}", &output, e))?;
    println!("'{}' に生成コードを出力しました。", &output);

    Ok(())
}
