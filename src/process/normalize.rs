use once_cell::sync::Lazy;
use std::collections::HashMap;

const FROM: &str = "０１２３４５６７８９／：；（）～〜。\n";
const TO: &str = "0123456789/:;()~~;;";

/// Full-width / CJK punctuation → plain ASCII.
static CHAR_MAP: Lazy<HashMap<char, char>> = Lazy::new(|| FROM.chars().zip(TO.chars()).collect());

/// Map full-width digits and punctuation to ASCII; everything else passes
/// through. Only applied to address, phone and notice text.
pub fn normalize_text(s: &str) -> String {
    s.chars()
        .map(|c| CHAR_MAP.get(&c).copied().unwrap_or(c))
        .collect()
}
