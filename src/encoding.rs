//! 文字コード判定
//!
//! Excelで保存されたCSVは Shift_JIS のことが多いため、
//! UTF-8 → Shift_JIS → CP932 → UTF-8(BOM付き) の順に試し、
//! 最初に解釈できたものを採用する。書き出しは常にBOM付きUTF-8。

use crate::error::{Result, TenkenError};
use encoding_rs::{SHIFT_JIS, UTF_8};

/// UTF-8 の BOM
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 読み込み時に試す文字コード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    ShiftJis,
    Cp932,
    Utf8Sig,
}

/// 試行順
pub const DECODE_ORDER: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::ShiftJis,
    TextEncoding::Cp932,
    TextEncoding::Utf8Sig,
];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::ShiftJis => "Shift_JIS",
            TextEncoding::Cp932 => "CP932",
            TextEncoding::Utf8Sig => "UTF-8(BOM)",
        }
    }

    /// 置換文字なしでデコードする。不正なバイト列なら None
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            TextEncoding::ShiftJis => {
                if uses_cp932_extensions(bytes) {
                    return None;
                }
                SHIFT_JIS
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|s| s.into_owned())
            }
            TextEncoding::Cp932 => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|s| s.into_owned()),
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                UTF_8
                    .decode_without_bom_handling_and_without_replacement(body)
                    .map(|s| s.into_owned())
            }
        }
    }
}

/// 試行した文字コード名の一覧（エラー表示用）
pub fn tried_labels() -> String {
    DECODE_ORDER
        .iter()
        .map(TextEncoding::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// NEC特殊文字・IBM拡張文字など、JIS X 0208 にない CP932 拡張の先行バイトを含むか
fn uses_cp932_extensions(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            0x00..=0x7F | 0xA1..=0xDF => i += 1,
            0x87 | 0xED | 0xEE | 0xFA..=0xFC => return true,
            _ => i += 2,
        }
    }
    false
}

/// 各文字コードで順にデコードし、`parse` が成功した最初の結果を返す
pub fn decode_with<T, E, F>(bytes: &[u8], mut parse: F) -> Option<(T, TextEncoding)>
where
    E: std::fmt::Display,
    F: FnMut(&str) -> std::result::Result<T, E>,
{
    for encoding in DECODE_ORDER {
        let Some(text) = encoding.decode(bytes) else {
            tracing::debug!(encoding = encoding.label(), "デコード失敗");
            continue;
        };
        match parse(&text) {
            Ok(value) => {
                tracing::debug!(encoding = encoding.label(), "デコード成功");
                return Some((value, encoding));
            }
            Err(e) => tracing::debug!(encoding = encoding.label(), error = %e, "解析失敗"),
        }
    }
    None
}

/// BOM付きUTF-8にエンコード
pub fn encode_utf8_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

/// Shift_JISにエンコード。表現できない文字があればエラー
pub fn encode_shift_jis(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
    if had_errors {
        return Err(TenkenError::Validation(
            "Shift_JISで表現できない文字が含まれています".into(),
        ));
    }
    Ok(bytes.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sjis(text: &str) -> Vec<u8> {
        encode_shift_jis(text).unwrap()
    }

    #[test]
    fn test_utf8_first() {
        let (text, enc) = decode_with("場所,劣化名".as_bytes(), |s| Ok::<_, String>(s.to_string())).unwrap();
        assert_eq!(text, "場所,劣化名");
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn test_shift_jis_fallback() {
        let bytes = sjis("場所,劣化名\n屋上,漏水\n");
        assert!(TextEncoding::Utf8.decode(&bytes).is_none());
        let (text, enc) = decode_with(&bytes, |s| Ok::<_, String>(s.to_string())).unwrap();
        assert_eq!(enc, TextEncoding::ShiftJis);
        assert!(text.contains("漏水"));
    }

    #[test]
    fn test_cp932_extension_chars() {
        // ① (0x8740) は NEC特殊文字
        let bytes = sjis("①外壁");
        assert_eq!(bytes[0], 0x87);
        assert!(TextEncoding::ShiftJis.decode(&bytes).is_none());
        let (text, enc) = decode_with(&bytes, |s| Ok::<_, String>(s.to_string())).unwrap();
        assert_eq!(enc, TextEncoding::Cp932);
        assert_eq!(text, "①外壁");
    }

    #[test]
    fn test_bom_only_accepted_by_utf8_sig_when_parse_rejects_bom() {
        let bytes = encode_utf8_with_bom("場所");
        let (text, enc) = decode_with(&bytes, |s: &str| {
            if s.starts_with('\u{FEFF}') {
                Err("BOM付きの見出し")
            } else {
                Ok(s.to_string())
            }
        })
        .unwrap();
        assert_eq!(text, "場所");
        assert_eq!(enc, TextEncoding::Utf8Sig);
    }

    #[test]
    fn test_parse_failure_everywhere() {
        let result = decode_with(b"abc", |_| Err::<(), _>("never"));
        assert!(result.is_none());
    }

    #[test]
    fn test_encode_utf8_with_bom() {
        let bytes = encode_utf8_with_bom("a");
        assert_eq!(bytes, b"\xEF\xBB\xBFa");
    }

    #[test]
    fn test_tried_labels() {
        assert_eq!(tried_labels(), "UTF-8, Shift_JIS, CP932, UTF-8(BOM)");
    }
}
