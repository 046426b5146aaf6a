//! Keyword-based scam heuristics
//!
//! Flags transcript segments containing high-risk vocabulary (money movement,
//! credentials, urgency) and patterns (phone numbers, currency amounts, codes
//! being read out). Each keyword carries a fixed weight; a segment's risk is
//! the capped sum of its keyword weights.

use crate::transcription::TranscriptSegment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Highest possible risk for a single segment
pub const MAX_RISK: u32 = 100;

/// Weight for a keyword missing from [`KEYWORD_WEIGHTS`]
pub const DEFAULT_KEYWORD_WEIGHT: u32 = 25;

/// Risk weight of each flagged keyword
pub const KEYWORD_WEIGHTS: &[(&str, u32)] = &[
    ("money", 30),
    ("transfer", 40),
    ("urgent", 35),
    ("otp", 60),
    ("password", 70),
    ("code", 50),
    ("verification", 55),
    ("bank account", 65),
    ("credit card", 60),
    ("phone_number", 45),
    ("currency_amount", 50),
    ("verification_code", 85),
];

/// Literal vocabulary, longest phrases first so they win over their parts
static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(bank account|credit card|verification|password|transfer|urgent|money|otp|code)\b",
    )
    .unwrap()
});

/// A code being read out: "code", "otp" or "pin" followed closely by 4-8 digits
static VERIFICATION_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:code|otp|pin)\b\D{0,20}\b\d{4,8}\b").unwrap());

/// Ten or more digits with common separators
static PHONE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s().-]{8,}\d").unwrap());

/// Symbol-prefixed or unit-suffixed amounts
static CURRENCY_AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[$€£₹]\s?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?\s?(?:dollars|euros|pounds|rupees|usd|eur|gbp)\b)",
    )
    .unwrap()
});

/// Overall call classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    #[default]
    Safe,
    Suspicious,
    Scam,
}

/// Score boundaries (0-100) for each label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Scores at or above this are suspicious
    pub suspicious: u32,
    /// Scores at or above this are scams
    pub scam: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            suspicious: 31,
            scam: 70,
        }
    }
}

impl RiskThresholds {
    /// Label for a 0-100 score
    pub fn label(&self, score: u32) -> RiskLabel {
        if score >= self.scam {
            RiskLabel::Scam
        } else if score >= self.suspicious {
            RiskLabel::Suspicious
        } else {
            RiskLabel::Safe
        }
    }
}

/// A transcript segment containing flagged vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub keywords: Vec<String>,
    /// 0-100
    pub risk: u32,
}

/// Weight of one keyword
pub fn keyword_weight(keyword: &str) -> u32 {
    KEYWORD_WEIGHTS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_KEYWORD_WEIGHT)
}

/// Capped sum of keyword weights
pub fn risk_from_keywords<S: AsRef<str>>(keywords: &[S]) -> u32 {
    keywords
        .iter()
        .map(|k| keyword_weight(k.as_ref()))
        .sum::<u32>()
        .min(MAX_RISK)
}

/// Keywords and pattern tags found in `text`, in order of first appearance
pub fn find_keywords(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    let mut push = |pos: usize, keyword: String| {
        if !found.iter().any(|(_, k)| *k == keyword) {
            found.push((pos, keyword));
        }
    };

    for m in KEYWORD_PATTERN.find_iter(text) {
        push(m.start(), m.as_str().to_lowercase());
    }
    let patterns: [(&LazyLock<Regex>, &str); 3] = [
        (&VERIFICATION_CODE_PATTERN, "verification_code"),
        (&PHONE_NUMBER_PATTERN, "phone_number"),
        (&CURRENCY_AMOUNT_PATTERN, "currency_amount"),
    ];
    for (pattern, tag) in patterns {
        if let Some(m) = pattern.find(text) {
            push(m.start(), tag.to_string());
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, k)| k).collect()
}

/// Scan a single piece of text
pub fn scan_text(start: f64, end: f64, text: &str) -> Option<FlaggedSegment> {
    let keywords = find_keywords(text);
    if keywords.is_empty() {
        return None;
    }

    let risk = risk_from_keywords(&keywords);
    Some(FlaggedSegment {
        start,
        end,
        text: text.trim().to_string(),
        keywords,
        risk,
    })
}

/// Flag every transcript segment containing risky vocabulary
pub fn scan_transcript(transcript: &[TranscriptSegment]) -> Vec<FlaggedSegment> {
    let flagged: Vec<FlaggedSegment> = transcript
        .iter()
        .filter_map(|s| scan_text(s.start, s.end, &s.text))
        .collect();

    tracing::debug!(
        "Scam scan: {} of {} transcript segments flagged",
        flagged.len(),
        transcript.len()
    );
    flagged
}

/// Highest segment risk in a set of flags (0 if none)
pub fn max_risk(flags: &[FlaggedSegment]) -> u32 {
    flags.iter().map(|f| f.risk).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end: start + 2.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_keyword_weights() {
        assert_eq!(keyword_weight("password"), 70);
        assert_eq!(keyword_weight("verification_code"), 85);
        assert_eq!(keyword_weight("gift card"), DEFAULT_KEYWORD_WEIGHT);
    }

    #[test]
    fn test_risk_is_capped() {
        assert_eq!(risk_from_keywords(&["money"]), 30);
        assert_eq!(risk_from_keywords(&["money", "urgent"]), 65);
        assert_eq!(risk_from_keywords(&["password", "otp"]), MAX_RISK);
        assert_eq!(risk_from_keywords::<&str>(&[]), 0);
        assert_eq!(risk_from_keywords(&["unknown"]), 25);
    }

    #[test]
    fn test_find_keywords_case_insensitive_whole_words() {
        assert_eq!(
            find_keywords("This is URGENT, please Transfer the money"),
            vec!["urgent", "transfer", "money"]
        );
        // "codec" and "moneyed" are not keywords
        assert!(find_keywords("the codec is moneyed").is_empty());
    }

    #[test]
    fn test_phrases_win_over_parts() {
        assert_eq!(
            find_keywords("read me your credit card and bank account"),
            vec!["credit card", "bank account"]
        );
    }

    #[test]
    fn test_pattern_detectors() {
        let keywords = find_keywords("Call 555-123-4567 and send $2,500 today");
        assert_eq!(keywords, vec!["phone_number", "currency_amount"]);

        let keywords = find_keywords("We need 300 dollars");
        assert_eq!(keywords, vec!["currency_amount"]);

        let keywords = find_keywords("the code is 482913");
        assert_eq!(keywords, vec!["code", "verification_code"]);
    }

    #[test]
    fn test_duplicates_removed() {
        assert_eq!(find_keywords("money money MONEY"), vec!["money"]);
    }

    #[test]
    fn test_scan_transcript_flags_only_risky_segments() {
        let transcript = vec![
            segment(0.0, "Hi, how are you today?"),
            segment(2.0, "Your account is frozen, this is urgent."),
            segment(4.0, "Tell me the OTP we just sent, the code is 1234."),
        ];

        let flags = scan_transcript(&transcript);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].start, 2.0);
        assert_eq!(flags[0].keywords, vec!["urgent"]);
        assert_eq!(flags[0].risk, 35);
        assert_eq!(flags[1].risk, MAX_RISK);
        assert_eq!(max_risk(&flags), MAX_RISK);
    }

    #[test]
    fn test_thresholds() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.label(0), RiskLabel::Safe);
        assert_eq!(thresholds.label(30), RiskLabel::Safe);
        assert_eq!(thresholds.label(31), RiskLabel::Suspicious);
        assert_eq!(thresholds.label(69), RiskLabel::Suspicious);
        assert_eq!(thresholds.label(70), RiskLabel::Scam);
        assert_eq!(thresholds.label(100), RiskLabel::Scam);
    }

    #[test]
    fn test_safe_text_not_flagged() {
        assert!(scan_text(0.0, 1.0, "See you at dinner").is_none());
        assert_eq!(max_risk(&[]), 0);
    }
}
