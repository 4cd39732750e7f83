//! Bullet formatting
//!
//! Produces the literal bullet text for a paragraph: a character
//! bullet (with Wingdings remapping), an auto-number in one of the
//! supported numbering schemes, or nothing.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;

use crate::constants::text::LEVEL_BULLETS;
use crate::elements::color::ColorRef;
use crate::oxml::text::{BulletKind, BulletProps};

/// A bullet ready to measure and paint
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedBullet {
    pub text: String,
    pub typeface: Option<String>,
    pub color: Option<ColorRef>,
    /// Size as a fraction of the paragraph's text size
    pub size_factor: f64,
    /// Explicit size in points, overriding the factor
    pub size_pts: Option<f32>,
}

lazy_static! {
    /// Wingdings private-use code points remapped to Unicode
    static ref WINGDINGS_MAP: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('\u{F0B7}', '\u{2022}'); // bullet
        m.insert('\u{F0A7}', '\u{25AA}'); // small square
        m.insert('\u{F0FC}', '\u{2713}'); // check mark
        m.insert('\u{F076}', '\u{2756}'); // diamond ornament
        m.insert('\u{F0D8}', '\u{25B8}'); // right triangle
        m.insert('\u{F0A8}', '\u{25CB}'); // circle
        m.insert('\u{F0B0}', '\u{00B0}'); // degree-like dot
        m
    };
}

/// Remap Wingdings private-use characters to their Unicode equivalents
fn remap_bullet_char(text: &str, typeface: Option<&str>) -> String {
    let is_symbol_font = matches!(typeface, Some("Wingdings") | Some("Symbol"));
    text.chars()
        .map(|ch| {
            if let Some(mapped) = WINGDINGS_MAP.get(&ch) {
                *mapped
            } else if is_symbol_font && ('\u{F000}'..='\u{F0FF}').contains(&ch) {
                // Unknown private-use symbol: degrade to a plain bullet
                '\u{2022}'
            } else {
                ch
            }
        })
        .collect()
}

/// Per-level auto-number counters for one text body
#[derive(Debug, Default)]
pub struct BulletCounter {
    counts: [usize; 9],
}

impl BulletCounter {
    pub fn new() -> Self {
        BulletCounter::default()
    }

    /// Advance the counter for a numbered paragraph at `level` and
    /// return its 0-based index within the list context. Deeper
    /// levels restart when a shallower paragraph appears.
    pub fn next_index(&mut self, level: usize) -> usize {
        let level = level.min(8);
        for deeper in self.counts.iter_mut().skip(level + 1) {
            *deeper = 0;
        }
        let index = self.counts[level];
        self.counts[level] += 1;
        index
    }
}

/// Format the bullet for a paragraph, given the paragraph's 0-based
/// index within its list context.
pub fn format_bullet(
    props: &BulletProps,
    level: usize,
    index: usize,
) -> Option<FormattedBullet> {
    let size_factor = props.size_pct.unwrap_or(1.0);
    let text = match &props.kind {
        BulletKind::None => return None,
        BulletKind::Inherit => {
            // No bullet anywhere in the chain: default per-level character
            LEVEL_BULLETS[level % LEVEL_BULLETS.len()].to_string()
        }
        BulletKind::Char(ch) => remap_bullet_char(ch, props.typeface.as_deref()),
        BulletKind::AutoNum { num_type, start_at } => {
            let n = (*start_at).max(1) + index as i64;
            format_number(num_type, n)
        }
        BulletKind::Blip => {
            debug!("picture bullet degraded to a plain bullet");
            "\u{2022}".to_string()
        }
    };
    Some(FormattedBullet {
        text,
        typeface: props.typeface.clone(),
        color: props.color.clone(),
        size_factor,
        size_pts: props.size_pts,
    })
}

/// Format `n` according to an OOXML auto-number scheme name
pub fn format_number(num_type: &str, n: i64) -> String {
    let (core, wrap) = split_scheme(num_type);
    let body = match core {
        "arabic" => n.to_string(),
        "romanUc" => to_roman(n),
        "romanLc" => to_roman(n).to_lowercase(),
        "alphaUc" => to_alpha(n),
        "alphaLc" => to_alpha(n).to_lowercase(),
        "circleNum" => return circled(n),
        _ => {
            debug!("unknown numbering type {num_type}, using arabic");
            n.to_string()
        }
    };
    match wrap {
        "Period" => format!("{body}."),
        "ParenR" => format!("{body})"),
        "ParenBoth" => format!("({body})"),
        _ => body,
    }
}

/// Split a scheme name like `romanLcParenBoth` into core and wrapping
fn split_scheme(num_type: &str) -> (&str, &str) {
    for wrap in ["ParenBoth", "ParenR", "Period", "Plain"] {
        if let Some(core) = num_type.strip_suffix(wrap) {
            return (core, wrap);
        }
    }
    // Circled schemes carry suffixes like DbPlain / WdBlackPlain
    if num_type.starts_with("circleNum") {
        return ("circleNum", "Plain");
    }
    (num_type, "Plain")
}

/// Standard subtractive Roman numerals for 1..=3999; decimal beyond
pub fn to_roman(n: i64) -> String {
    if !(1..=3999).contains(&n) {
        return n.to_string();
    }
    const TABLE: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut remainder = n;
    let mut out = String::new();
    for (value, digits) in TABLE {
        while remainder >= value {
            out.push_str(digits);
            remainder -= value;
        }
    }
    out
}

/// Bijective base-26 alphabetic numbering: 1 -> A, 26 -> Z, 27 -> AA
pub fn to_alpha(n: i64) -> String {
    if n < 1 {
        return n.to_string();
    }
    let mut remainder = n;
    let mut out = Vec::new();
    while remainder > 0 {
        remainder -= 1;
        out.push(b'A' + (remainder % 26) as u8);
        remainder /= 26;
    }
    out.reverse();
    String::from_utf8(out).expect("ascii letters")
}

/// Circled numbers U+2460..U+2473 cover 1..=20; `(n)` beyond
fn circled(n: i64) -> String {
    if (1..=20).contains(&n) {
        char::from_u32(0x2460 + (n as u32 - 1))
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("({n})"))
    } else {
        format!("({n})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxml::text::BulletKind;

    fn char_bullet(ch: &str) -> BulletProps {
        BulletProps {
            kind: BulletKind::Char(ch.to_string()),
            ..BulletProps::default()
        }
    }

    fn autonum(num_type: &str, start_at: i64) -> BulletProps {
        BulletProps {
            kind: BulletKind::AutoNum {
                num_type: num_type.to_string(),
                start_at,
            },
            ..BulletProps::default()
        }
    }

    #[test]
    fn test_seed_scenario_bullet_sequence() {
        // buChar="•", then arabicPeriod startAt=3 x3, then romanLcParenBoth x2
        let mut texts = Vec::new();
        texts.push(format_bullet(&char_bullet("\u{2022}"), 0, 0).unwrap().text);
        let mut counter = BulletCounter::new();
        let arabic = autonum("arabicPeriod", 3);
        for _ in 0..3 {
            let index = counter.next_index(0);
            texts.push(format_bullet(&arabic, 0, index).unwrap().text);
        }
        let mut counter = BulletCounter::new();
        let roman = autonum("romanLcParenBoth", 1);
        for _ in 0..2 {
            let index = counter.next_index(0);
            texts.push(format_bullet(&roman, 0, index).unwrap().text);
        }
        assert_eq!(texts, vec!["\u{2022}", "3.", "4.", "5.", "(i)", "(ii)"]);
    }

    #[test]
    fn test_roman_subtractive_forms() {
        assert_eq!(to_roman(1), "I");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(9), "IX");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(40), "XL");
        assert_eq!(to_roman(90), "XC");
        assert_eq!(to_roman(400), "CD");
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(3999), "MMMCMXCIX");
        assert_eq!(to_roman(4000), "4000");
    }

    #[test]
    fn test_roman_has_no_four_repeats() {
        for n in 1..=3999 {
            let roman = to_roman(n);
            for quad in ["IIII", "XXXX", "CCCC", "MMMM"] {
                assert!(!roman.contains(quad), "{n} -> {roman}");
            }
        }
    }

    #[test]
    fn test_alpha_bijection_boundaries() {
        assert_eq!(to_alpha(1), "A");
        assert_eq!(to_alpha(26), "Z");
        assert_eq!(to_alpha(27), "AA");
        assert_eq!(to_alpha(52), "AZ");
        assert_eq!(to_alpha(53), "BA");
        assert_eq!(to_alpha(702), "ZZ");
        assert_eq!(to_alpha(703), "AAA");
    }

    #[test]
    fn test_alpha_is_injective_over_range() {
        let mut seen = std::collections::HashSet::new();
        for n in 1..=1000 {
            assert!(seen.insert(to_alpha(n)), "collision at {n}");
        }
    }

    #[test]
    fn test_numbering_wrappings() {
        assert_eq!(format_number("arabicPeriod", 3), "3.");
        assert_eq!(format_number("arabicParenR", 3), "3)");
        assert_eq!(format_number("arabicParenBoth", 3), "(3)");
        assert_eq!(format_number("arabicPlain", 3), "3");
        assert_eq!(format_number("romanUcPeriod", 4), "IV.");
        assert_eq!(format_number("alphaLcParenBoth", 2), "(b)");
        assert_eq!(format_number("alphaUcPlain", 28), "AB");
    }

    #[test]
    fn test_circled_numbers() {
        assert_eq!(format_number("circleNumDbPlain", 1), "\u{2460}");
        assert_eq!(format_number("circleNumDbPlain", 20), "\u{2473}");
        assert_eq!(format_number("circleNumDbPlain", 21), "(21)");
    }

    #[test]
    fn test_wingdings_remap() {
        let bullet = format_bullet(
            &BulletProps {
                kind: BulletKind::Char("\u{F0B7}".to_string()),
                typeface: Some("Wingdings".to_string()),
                ..BulletProps::default()
            },
            0,
            0,
        )
        .unwrap();
        assert_eq!(bullet.text, "\u{2022}");
    }

    #[test]
    fn test_bu_none_is_no_bullet() {
        let props = BulletProps {
            kind: BulletKind::None,
            ..BulletProps::default()
        };
        assert!(format_bullet(&props, 0, 0).is_none());
    }

    #[test]
    fn test_default_level_bullets_cycle() {
        let inherit = BulletProps::default();
        assert_eq!(format_bullet(&inherit, 0, 0).unwrap().text, "\u{2022}");
        assert_eq!(format_bullet(&inherit, 1, 0).unwrap().text, "\u{25CB}");
        assert_eq!(format_bullet(&inherit, 2, 0).unwrap().text, "\u{25AA}");
        assert_eq!(format_bullet(&inherit, 3, 0).unwrap().text, "\u{2022}");
    }

    #[test]
    fn test_counter_resets_deeper_levels() {
        let mut counter = BulletCounter::new();
        assert_eq!(counter.next_index(0), 0);
        assert_eq!(counter.next_index(1), 0);
        assert_eq!(counter.next_index(1), 1);
        // Back to level 0 resets level 1
        assert_eq!(counter.next_index(0), 1);
        assert_eq!(counter.next_index(1), 0);
    }

    #[test]
    fn test_roman_sequence_snapshot() {
        let sample: Vec<String> = (1..=12).map(|n| format_number("romanLcPeriod", n)).collect();
        insta::assert_snapshot!(
            sample.join(" "),
            @"i. ii. iii. iv. v. vi. vii. viii. ix. x. xi. xii."
        );
    }

    #[test]
    fn test_blip_bullet_falls_back() {
        let props = BulletProps {
            kind: BulletKind::Blip,
            ..BulletProps::default()
        };
        assert_eq!(format_bullet(&props, 0, 0).unwrap().text, "\u{2022}");
    }
}
