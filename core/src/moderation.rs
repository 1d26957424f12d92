//! Keyword screen for listing text. Independent of the recommender index.

use serde::Serialize;

/// Scores at or above this are flagged.
pub const FLAG_THRESHOLD: f64 = 0.8;

/// Banned phrases and their severity. Matched as lower-case substrings; on equal
/// scores the earlier entry is reported.
const BANNED_KEYWORDS: &[(&str, f64)] = &[
    ("weapon", 0.9),
    ("fake id", 0.95),
    ("essay mill", 0.85),
    ("drug", 0.8),
    ("ketamine", 0.92),
    ("counterfeit", 0.88),
    ("wine", 0.82),
    ("beer", 0.82),
    ("rum", 0.82),
    ("vodka", 0.82),
    ("whiskey", 0.82),
    ("tequila", 0.82),
    ("alcohol", 0.82),
    ("cigarette", 0.83),
    ("cigarettes", 0.83),
    ("cigar", 0.83),
    ("cannabis", 0.9),
    ("marijuana", 0.9),
    ("hash", 0.88),
    ("mdma", 0.93),
    ("lsd", 0.93),
    ("dildo", 0.9),
    ("sex toy", 0.9),
    ("sextoy", 0.9),
    ("porn", 0.9),
    ("escort", 0.9),
    ("steroid", 0.85),
    ("steroids", 0.85),
    ("meth", 0.94),
    ("methamphetamine", 0.95),
    ("cocaine", 0.95),
    ("heroin", 0.95),
    ("fentanyl", 0.96),
    ("opioid", 0.9),
    ("opium", 0.9),
    ("shrooms", 0.9),
    ("mushrooms", 0.9),
    ("hookah", 0.83),
    ("nicotine", 0.83),
    ("vape", 0.83),
    ("xanax", 0.94),
    ("adderall", 0.9),
    ("escort service", 0.92),
    ("prostitution", 0.94),
    ("brothel", 0.9),
    ("sex work", 0.9),
    ("skimmer", 0.9),
    ("grenade", 0.95),
    ("explosive", 0.95),
    ("detonator", 0.95),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    pub score: f64,
    /// `keyword:<phrase>` for the highest-scoring hit, or `clean`.
    pub reason: String,
}

pub fn score_listing(title: &str, description: &str) -> ModerationVerdict {
    let text = format!("{title} {description}").to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for &(keyword, score) in BANNED_KEYWORDS {
        if score > best.map_or(0.0, |(_, s)| s) && text.contains(keyword) {
            best = Some((keyword, score));
        }
    }
    match best {
        Some((keyword, score)) => ModerationVerdict {
            flagged: score >= FLAG_THRESHOLD,
            score: (score * 10_000.0).round() / 10_000.0,
            reason: format!("keyword:{keyword}"),
        },
        None => ModerationVerdict { flagged: false, score: 0.0, reason: "clean".into() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_highest_scoring_keyword() {
        let v = score_listing("Selling fake IDs", "Counterfeit docs");
        assert!(v.flagged);
        assert_eq!(v.reason, "keyword:fake id");
        assert_eq!(v.score, 0.95);
    }

    #[test]
    fn longer_phrase_outranks_its_prefix() {
        let v = score_listing("Escort service", "");
        assert_eq!(v.reason, "keyword:escort service");
    }

    #[test]
    fn matching_ignores_case() {
        let v = score_listing("Craft BEER kit", "");
        assert_eq!(v.reason, "keyword:beer");
        assert!(v.flagged);
    }

    #[test]
    fn clean_text_is_not_flagged() {
        let v = score_listing("Calculus textbook", "barely used");
        assert_eq!(v, ModerationVerdict { flagged: false, score: 0.0, reason: "clean".into() });
    }
}
