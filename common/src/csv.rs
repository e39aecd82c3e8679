//! CSVテキストの読み書き
//!
//! ダブルクォート内のカンマ・改行・`""` エスケープに対応する。
//! 文字コードの判定は呼び出し側で済ませ、ここでは文字列だけを扱う。

use crate::error::{Error, Result};

/// 書き出し時の改行コード
pub const LINE_ENDING: &str = "\r\n";

/// CSVテキストをレコードの列に分解する
///
/// 空行は読み飛ばす。引用符が閉じていなければエラー。
pub fn parse(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
                quote_line = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record), quoted);
                quoted = false;
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(Error::Csv {
            line: quote_line,
            message: "引用符が閉じていません".to_string(),
        });
    }

    if !field.is_empty() || !record.is_empty() || quoted {
        record.push(field);
        push_record(&mut records, record, quoted);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>, last_quoted: bool) {
    let blank = record.len() == 1 && record[0].is_empty() && !last_quoted;
    if !blank {
        records.push(record);
    }
}

/// フィールドを必要に応じて引用符で囲む
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// 1レコードを書き出す（改行付き）
pub fn write_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    out.push_str(&line.join(","));
    out.push_str(LINE_ENDING);
}

/// ヘッダーと行からCSVテキストを組み立てる
pub fn to_csv_string<H: AsRef<str>, S: AsRef<str>>(header: &[H], rows: &[Vec<S>]) -> String {
    let mut out = String::new();
    write_record(&mut out, header);
    for row in rows {
        write_record(&mut out, row);
    }
    out
}
