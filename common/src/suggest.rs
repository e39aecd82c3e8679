//! 入力補完の候補生成
//!
//! 読み仮名の前方一致を優先し、次に語そのものの前方一致を並べる。

use crate::kana;
use std::collections::{HashMap, HashSet};

/// 入力に対する補完候補を返す
///
/// 1. 読みが正規化済み入力で始まるものの語（読みの一覧順）
/// 2. 語を正規化したものが入力で始まるもの（語の一覧順）
///
/// 同じ語は最初の1回だけ。入力が空なら空。
pub fn suggest(
    input: &str,
    terms: &[String],
    phonetic_keys: &[String],
    key_to_term: &HashMap<String, String>,
) -> Vec<String> {
    let needle = kana::normalize(input);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut candidates = Vec::new();

    let by_key = phonetic_keys
        .iter()
        .filter(|key| kana::normalize(key).starts_with(&needle))
        .filter_map(|key| key_to_term.get(key));
    let by_term = terms
        .iter()
        .filter(|term| kana::normalize(term).starts_with(&needle));

    for term in by_key.chain(by_term) {
        if seen.insert(term.as_str()) {
            candidates.push(term.clone());
        }
    }

    candidates
}
