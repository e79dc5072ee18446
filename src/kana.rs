//! Half-width to full-width conversion for katakana only.
//!
//! Covers the half-width katakana block U+FF61..=U+FF9F. Digits, ASCII and
//! every other character pass through untouched.

const HALFWIDTH_START: u32 = 0xFF61;

/// Full-width counterparts of U+FF61..=U+FF9F, in code point order.
const FULLWIDTH: &str = "。「」、・ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン゛゜";

const VOICED_MARK: char = '\u{FF9E}';
const SEMI_VOICED_MARK: char = '\u{FF9F}';

fn widen(c: char) -> Option<char> {
    let offset = (c as u32).checked_sub(HALFWIDTH_START)?;
    FULLWIDTH.chars().nth(offset as usize)
}

fn voiced(base: char) -> Option<char> {
    if base == 'ウ' {
        Some('ヴ')
    } else if "カキクケコサシスセソタチツテトハヒフヘホ".contains(base) {
        char::from_u32(base as u32 + 1)
    } else {
        None
    }
}

fn semi_voiced(base: char) -> Option<char> {
    if "ハヒフヘホ".contains(base) {
        char::from_u32(base as u32 + 2)
    } else {
        None
    }
}

/// Convert half-width katakana in `s` to full-width, composing a following
/// voiced or semi-voiced mark into the preceding kana where one exists.
pub fn to_fullwidth_katakana(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        let Some(wide) = widen(c) else {
            out.push(c);
            continue;
        };
        let composed = match chars.peek() {
            Some(&VOICED_MARK) => voiced(wide),
            Some(&SEMI_VOICED_MARK) => semi_voiced(wide),
            _ => None,
        };
        match composed {
            Some(k) => {
                chars.next();
                out.push(k);
            }
            None => out.push(wide),
        }
    }
    out
}

/// Whether `s` holds anything the conversion would change.
pub fn has_halfwidth_katakana(s: &str) -> bool {
    s.chars().any(|c| widen(c).is_some())
}
