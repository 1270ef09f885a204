//! # Decoration
//!
//! Medals, streak labels and commentary appended to an announcement, and the
//! rules that keep the decorated text inside the platform's character budget.
//!
//! # Budget
//!
//! Lengths are counted in Unicode scalar values. Medal glyphs are costed at
//! two units each since the platform counts most emoji twice; the leading
//! space of the medal run is costed the same way, which leaves a small
//! margin for emoji inside commentary lines.
//!
//! Sections are dropped in this order until the text fits:
//!
//! 1. everything: medals, streak, commentary
//! 2. without the streak label
//! 3. without the streak, medals truncated to the remaining room
//! 4. the base text alone

use std::fmt;

/// Maximum length of a published text, in Unicode scalar values.
pub const CHARACTER_BUDGET: usize = 280;

/// Separator placed before the streak label and the commentary line.
pub const SECTION_SEPARATOR: &str = " ~ ";

/// Placeholder substituted with the symbol in streak labels and commentary.
pub const SYMBOL_PLACEHOLDER: &str = "$SYMBOL";

/// A truncated medal run shorter than this is abandoned.
const MIN_MEDAL_RUN: usize = 3;

/// A badge appended to an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Medal {
    /// Largest liquidation today. Never rendered.
    LargestToday,
    /// Largest liquidation this ISO week.
    LargestWeek,
    /// Largest liquidation this month.
    LargestMonth,
    /// One per full 100,000 units of quantity.
    HundredK,
    /// Part of a kill streak.
    Streak,
    /// Liquidated within seconds of the previous one.
    QuickKill,
    /// The smallest possible liquidation.
    One,
}

impl Medal {
    /// Glyph rendered for this medal.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::LargestToday => "",
            Self::LargestWeek => "\u{1F3C5}",
            Self::LargestMonth => "\u{1F3C6}",
            Self::HundredK => "\u{1F4AF}",
            Self::Streak => "\u{1F525}",
            Self::QuickKill => "\u{26A1}",
            Self::One => "\u{1F947}",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Decoration computed for one announcement.
///
/// Derived fresh for every combined liquidation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoration {
    /// Kill-streak label, symbol already substituted.
    pub streak: Option<String>,
    /// Medals in award order.
    pub medals: Vec<Medal>,
    /// Commentary line, symbol already substituted.
    pub commentary: Option<String>,
}

impl Decoration {
    /// Returns true if nothing would be appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streak.is_none() && self.medals.is_empty() && self.commentary.is_none()
    }

    fn medal_chars(&self) -> Vec<char> {
        if self.medals.is_empty() {
            return Vec::new();
        }
        std::iter::once(' ')
            .chain(self.medals.iter().flat_map(|m| m.glyph().chars()))
            .collect()
    }

    /// Appends as much of the decoration as fits the character budget.
    ///
    /// The result never exceeds [`CHARACTER_BUDGET`] scalar values; a base
    /// text that is already too long is truncated.
    #[must_use]
    pub fn apply(&self, base: &str) -> String {
        let base_len = base.chars().count();
        if base_len > CHARACTER_BUDGET {
            return base.chars().take(CHARACTER_BUDGET).collect();
        }

        let medals = self.medal_chars();
        let streak = section(self.streak.as_deref());
        let commentary = section(self.commentary.as_deref());
        let streak_len = streak.chars().count();
        let commentary_len = commentary.chars().count();
        let medal_cost = medals.len() * 2;

        let mut out = String::with_capacity(base.len() + 4 * medals.len() + streak.len() + commentary.len());
        out.push_str(base);

        if base_len + medal_cost + streak_len + commentary_len <= CHARACTER_BUDGET {
            out.extend(medals.iter());
            out.push_str(&streak);
            out.push_str(&commentary);
            return out;
        }

        if base_len + medal_cost + commentary_len <= CHARACTER_BUDGET {
            out.extend(medals.iter());
            out.push_str(&commentary);
            return out;
        }

        if base_len + commentary_len <= CHARACTER_BUDGET {
            let room = (CHARACTER_BUDGET - base_len - commentary_len) / 2;
            if room > MIN_MEDAL_RUN {
                out.extend(medals.iter().take(room));
            }
            out.push_str(&commentary);
            return out;
        }

        out
    }
}

fn section(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.is_empty() => format!("{SECTION_SEPARATOR}{text}"),
        _ => String::new(),
    }
}

/// Linear interpolation of `value` from `[from, to]` onto `[start, end]`.
///
/// Not clamped: values outside `[from, to]` extrapolate.
#[must_use]
pub fn lerp(from: f64, to: f64, value: f64, start: f64, end: f64) -> f64 {
    start + ((value - from) / (to - from)) * (end - start)
}

/// Probability of attaching a commentary line to an announcement.
///
/// ```text
/// USD value:    0 ------ 100k ---------- 500k ---------- 2m ------->
/// probability:      0%          8%-15%          15%-40%
/// ```
///
/// The first ramp is anchored at 50k, so it starts at 8.8% at 100k. Values
/// above 2m keep climbing along the second ramp.
#[must_use]
pub fn commentary_probability(usd_value: f64) -> f64 {
    if usd_value <= 100_000.0 {
        0.0
    } else if usd_value <= 500_000.0 {
        lerp(50_000.0, 500_000.0, usd_value, 0.08, 0.15)
    } else {
        lerp(500_000.0, 2_000_000.0, usd_value, 0.15, 0.40)
    }
}

/// Replaces every [`SYMBOL_PLACEHOLDER`] in `text` with `symbol`.
#[must_use]
pub fn substitute_symbol(text: &str, symbol: &str) -> String {
    text.replace(SYMBOL_PLACEHOLDER, symbol)
}

/// Streak label for a kill count.
///
/// Entry `i` of `labels` names a streak of `i + 2` kills. Counts past the
/// end reuse the last entry with an ` x<count>` suffix.
#[must_use]
pub fn streak_label(count: u32, labels: &[String], symbol: &str) -> Option<String> {
    let index = usize::try_from(count.checked_sub(2)?).ok()?;
    let raw = match labels.get(index) {
        Some(label) => label.clone(),
        None => format!("{} x{count}", labels.last()?),
    };
    Some(substitute_symbol(&raw, symbol))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels() -> Vec<String> {
        ["Double kill on $SYMBOL", "Triple kill", "Rampage on $SYMBOL"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn len(text: &str) -> usize {
        text.chars().count()
    }

    mod apply {
        use super::*;

        #[test]
        fn everything_fits() {
            let decoration = Decoration {
                streak: Some("Double kill".to_string()),
                medals: vec![Medal::LargestWeek, Medal::Streak],
                commentary: Some("ouch".to_string()),
            };
            assert_eq!(
                decoration.apply("Liquidated"),
                "Liquidated \u{1F3C5}\u{1F525} ~ Double kill ~ ouch"
            );
        }

        #[test]
        fn empty_decoration_leaves_base() {
            assert!(Decoration::default().is_empty());
            assert_eq!(Decoration::default().apply("base"), "base");
        }

        #[test]
        fn streak_dropped_first() {
            let base = "x".repeat(250);
            let decoration = Decoration {
                streak: Some("s".repeat(20)),
                medals: vec![Medal::One],
                commentary: Some("c".repeat(20)),
            };
            let out = decoration.apply(&base);
            assert!(out.ends_with(&format!(" ~ {}", "c".repeat(20))));
            assert!(out.contains('\u{1F947}'));
            assert!(!out.contains('s'));
        }

        #[test]
        fn medals_truncated_to_room() {
            let base = "x".repeat(200);
            let decoration = Decoration {
                streak: None,
                medals: vec![Medal::HundredK; 60],
                commentary: Some("c".repeat(37)),
            };
            let out = decoration.apply(&base);
            // 280 - 200 - 40 = 40 units, 20 scalars: the space plus 19 medals.
            assert_eq!(len(&out), 200 + 20 + 40);
            assert_eq!(out.matches('\u{1F4AF}').count(), 19);
        }

        #[test]
        fn short_medal_run_is_abandoned() {
            let base = "x".repeat(230);
            let decoration = Decoration {
                streak: None,
                medals: vec![Medal::HundredK; 10],
                commentary: Some("c".repeat(40)),
            };
            let out = decoration.apply(&base);
            assert!(!out.contains('\u{1F4AF}'));
            assert!(out.ends_with('c'));
        }

        #[test]
        fn oversized_commentary_drops_everything() {
            let base = "x".repeat(100);
            let decoration = Decoration {
                streak: Some("streak".to_string()),
                medals: vec![Medal::One],
                commentary: Some("c".repeat(200)),
            };
            assert_eq!(decoration.apply(&base), base);
        }

        #[test]
        fn oversized_base_is_truncated() {
            let base = "y".repeat(300);
            assert_eq!(len(&Decoration::default().apply(&base)), CHARACTER_BUDGET);
        }

        #[test]
        fn medals_cost_double() {
            // 1 space + 5 medals = 6 scalars, costed 12.
            let base = "x".repeat(CHARACTER_BUDGET - 12);
            let decoration = Decoration {
                medals: vec![Medal::Streak; 5],
                ..Decoration::default()
            };
            assert_eq!(len(&decoration.apply(&base)), CHARACTER_BUDGET - 6);

            let base = "x".repeat(CHARACTER_BUDGET - 11);
            let out = decoration.apply(&base);
            assert!(len(&out) <= CHARACTER_BUDGET);
        }
    }

    mod labels {
        use super::*;

        #[test]
        fn below_two_kills_has_no_label() {
            assert_eq!(streak_label(0, &labels(), "XBTUSD"), None);
            assert_eq!(streak_label(1, &labels(), "XBTUSD"), None);
        }

        #[test]
        fn indexes_by_count() {
            assert_eq!(
                streak_label(2, &labels(), "XBTUSD").unwrap(),
                "Double kill on XBTUSD"
            );
            assert_eq!(streak_label(3, &labels(), "XBTUSD").unwrap(), "Triple kill");
        }

        #[test]
        fn clamps_with_count_suffix() {
            assert_eq!(
                streak_label(7, &labels(), "ETHUSD").unwrap(),
                "Rampage on ETHUSD x7"
            );
        }

        #[test]
        fn empty_deck_has_no_label() {
            assert_eq!(streak_label(5, &[], "ETHUSD"), None);
        }
    }

    mod probability {
        use super::*;

        #[test]
        fn no_commentary_for_small_values() {
            assert_eq!(commentary_probability(0.0), 0.0);
            assert_eq!(commentary_probability(100_000.0), 0.0);
        }

        #[test]
        fn ramps_between_thresholds() {
            assert!((commentary_probability(500_000.0) - 0.15).abs() < 1e-9);
            assert!((commentary_probability(2_000_000.0) - 0.40).abs() < 1e-9);
            let mid = commentary_probability(1_250_000.0);
            assert!(mid > 0.15 && mid < 0.40);
        }
    }

    fn arb_medal() -> impl Strategy<Value = Medal> {
        prop_oneof![
            Just(Medal::LargestWeek),
            Just(Medal::LargestMonth),
            Just(Medal::HundredK),
            Just(Medal::Streak),
            Just(Medal::QuickKill),
            Just(Medal::One),
        ]
    }

    proptest! {
        #[test]
        fn applied_text_fits_budget(
            base in "[a-zA-Z0-9 ,.@≈$+]{0,320}",
            medals in prop::collection::vec(arb_medal(), 0..200),
            streak in prop::option::of("[a-z ]{0,60}"),
            commentary in prop::option::of("[a-z \u{1F480}]{0,200}"),
        ) {
            let decoration = Decoration { streak, medals, commentary };
            let out = decoration.apply(&base);
            prop_assert!(out.chars().count() <= CHARACTER_BUDGET);
            prop_assert!(out.starts_with(&base.chars().take(CHARACTER_BUDGET).collect::<String>()));
        }
    }
}
