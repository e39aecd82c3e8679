//! 読み仮名の正規化
//!
//! 入力補完の前方一致比較用に、表記の揺れを1つの形にそろえる。
//!
//! - 全角英数字 → 半角、英字は小文字
//! - 半角カナ（濁点・半濁点付き）・全角カタカナ → ひらがな
//! - 小書き仮名（ぁ・っ・ゃ など）→ 通常の仮名

/// 半角カナ U+FF66..=U+FF9D に対応するひらがな
const HALFWIDTH_KANA: &str =
    "をぁぃぅぇぉゃゅょっーあいうえおかきくけこさしすせそたちつてとなにぬねのはひふへほまみむめもやゆよらりるれろわん";

/// 濁点で1つ後ろのコードポイントになる仮名
const DAKUTEN_BASES: &str = "かきくけこさしすせそたちつてとはひふへほ";

/// 半濁点で2つ後ろのコードポイントになる仮名
const HANDAKUTEN_BASES: &str = "はひふへほ";

fn is_dakuten(c: char) -> bool {
    matches!(c, '\u{FF9E}' | '\u{309B}' | '\u{3099}')
}

fn is_handakuten(c: char) -> bool {
    matches!(c, '\u{FF9F}' | '\u{309C}' | '\u{309A}')
}

/// 全角英数字・半角カナ・カタカナの幅と字種をそろえる
fn fold_char(c: char) -> char {
    let folded = match c {
        '\u{3000}' => ' ',
        '\u{FF9E}' => '\u{309B}',
        '\u{FF9F}' => '\u{309C}',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{FF66}'..='\u{FF9D}' => HALFWIDTH_KANA
            .chars()
            .nth((c as u32 - 0xFF66) as usize)
            .unwrap_or(c),
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    };
    folded.to_ascii_lowercase()
}

fn fold_small(c: char) -> char {
    match c {
        'ぁ' => 'あ',
        'ぃ' => 'い',
        'ぅ' => 'う',
        'ぇ' => 'え',
        'ぉ' => 'お',
        'っ' => 'つ',
        'ゃ' => 'や',
        'ゅ' => 'ゆ',
        'ょ' => 'よ',
        'ゎ' => 'わ',
        'ゕ' => 'か',
        'ゖ' => 'け',
        _ => c,
    }
}

/// 濁点・半濁点を直前の仮名に合成する。合成できなければ `None`
fn compose(base: char, mark: char) -> Option<char> {
    if is_dakuten(mark) {
        if base == 'う' {
            return Some('ゔ');
        }
        if DAKUTEN_BASES.contains(base) {
            return char::from_u32(base as u32 + 1);
        }
    } else if is_handakuten(mark) && HANDAKUTEN_BASES.contains(base) {
        return char::from_u32(base as u32 + 2);
    }
    None
}

/// 比較用の正規形に変換する
pub fn normalize(input: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(input.len());

    for c in input.trim().chars() {
        if is_dakuten(c) || is_handakuten(c) {
            if let Some(composed) = out.last().and_then(|&prev| compose(prev, c)) {
                out.pop();
                out.push(composed);
                continue;
            }
        }
        out.push(fold_char(c));
    }

    out.into_iter().map(fold_small).collect()
}
