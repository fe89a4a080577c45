//! crates/veridoc_core/src/redact.rs
//!
//! The pattern redaction profile: a fixed battery of named rules, each a
//! regex mapped to the `[HIDDEN]` replacement token. The rule set is
//! static, process-wide, and read-only after construction.

use regex::Regex;

/// Replacement token for the pattern profile.
pub const PATTERN_TOKEN: &str = "[HIDDEN]";

/// Replacement token used by the semantic (LLM-driven) profile.
pub const SEMANTIC_TOKEN: &str = "[REDACTED]";

/// Declaration order is the authoritative precedence: rules apply
/// sequentially to the current text state, so earlier rules win ties
/// (e.g. a 10-digit phone number is consumed before the 6-digit pincode
/// rule can see part of it). Keep this order stable.
const RULE_PATTERNS: &[(&str, &str)] = &[
    ("email", r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"),
    ("phone", r"\b\d{10}\b"),
    ("aadhaar", r"\b\d{4}\s\d{4}\s\d{4}\b"),
    ("pan", r"[A-Z]{5}[0-9]{4}[A-Z]"),
    ("pincode", r"\b\d{6}\b"),
    ("house_no", r"\b(?:Flat|House|Plot|No\.?|#)\s?\d+[A-Za-z0-9/-]*\b"),
    ("street", r"\b(?:Street|St|Road|Rd|Nagar|Colony|Avenue|Ave|Lane|Ln|Block)\b.*"),
];

/// A named pattern mapping to the fixed replacement token.
#[derive(Debug)]
pub struct RedactionRule {
    name: &'static str,
    pattern: Regex,
}

impl RedactionRule {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Applies the full rule battery to a text. Compiled once at startup and
/// shared read-only across requests.
#[derive(Debug)]
pub struct Redactor {
    rules: Vec<RedactionRule>,
}

impl Redactor {
    /// Compiles the static rule battery. The patterns are fixed at compile
    /// time, so a failure here is a programmer error caught by tests.
    pub fn new() -> Self {
        let rules = RULE_PATTERNS
            .iter()
            .map(|(name, pattern)| RedactionRule {
                name,
                pattern: Regex::new(pattern).unwrap(),
            })
            .collect();
        Self { rules }
    }

    /// Replaces every non-overlapping match of every rule with
    /// `[HIDDEN]`, rule by rule in declaration order over the current
    /// text state. Idempotent: the token itself matches no rule.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            out = rule.pattern.replace_all(&out, PATTERN_TOKEN).into_owned();
        }
        out
    }

    /// Total number of matches across all rules, counted against the
    /// evolving text state exactly as `redact` would consume them.
    pub fn match_count(&self, text: &str) -> usize {
        let mut out = text.to_string();
        let mut count = 0;
        for rule in &self.rules {
            count += rule.pattern.find_iter(&out).count();
            out = rule.pattern.replace_all(&out, PATTERN_TOKEN).into_owned();
        }
        count
    }

    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        let redactor = Redactor::new();
        assert_eq!(redactor.rules().len(), RULE_PATTERNS.len());
    }

    #[test]
    fn redacts_invoice_scenario() {
        let redactor = Redactor::new();
        let out = redactor.redact("Invoice to: john@example.com, phone 9876543210");
        assert_eq!(out, "Invoice to: [HIDDEN], phone [HIDDEN]");
    }

    #[test]
    fn redacts_each_rule_kind() {
        let redactor = Redactor::new();

        assert_eq!(redactor.redact("mail me at a.b+c@test.co"), "mail me at [HIDDEN]");
        assert_eq!(redactor.redact("aadhaar 1234 5678 9012 ok"), "aadhaar [HIDDEN] ok");
        assert_eq!(redactor.redact("PAN ABCDE1234F issued"), "PAN [HIDDEN] issued");
        assert_eq!(redactor.redact("pin 560001 area"), "pin [HIDDEN] area");
        assert_eq!(redactor.redact("lives at Flat 12B nearby"), "lives at [HIDDEN] nearby");
        // The street rule consumes the rest of the line by design.
        assert_eq!(redactor.redact("on MG Road near park"), "on MG [HIDDEN]");
    }

    #[test]
    fn no_matched_substring_survives() {
        let redactor = Redactor::new();
        let input = "Contact jane.doe@corp.in or 9123456780, PAN: XYZAB9876K, pin 400001";
        let matches = redactor.match_count(input);
        let out = redactor.redact(input);

        assert!(!out.contains("jane.doe@corp.in"));
        assert!(!out.contains("9123456780"));
        assert!(!out.contains("XYZAB9876K"));
        assert!(!out.contains("400001"));
        assert_eq!(out.matches(PATTERN_TOKEN).count(), matches);
    }

    #[test]
    fn redaction_is_idempotent() {
        let redactor = Redactor::new();
        let once = redactor.redact("reach me: foo@bar.com / 9876543210 / 1234 5678 9012");
        let twice = redactor.redact(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn untouched_text_passes_through() {
        let redactor = Redactor::new();
        let input = "Total amount due: $5000.00 by March 2024";
        assert_eq!(redactor.redact(input), input);
    }
}
