use crate::config::RuleConfig;
use crate::normalization::NormalizedEmail;
use crate::record::EmailRecord;
use crate::rules::{Finding, Rule, RuleSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    /// Reason tags in the order their rules fired.
    pub reasons: Vec<String>,
}

impl ScoreResult {
    pub fn is_clean(&self) -> bool {
        self.reasons.is_empty()
    }

    fn from_findings(findings: Vec<Finding>) -> Self {
        let mut result = Self::default();
        for finding in findings {
            result.score = result.score.saturating_add(finding.points);
            result.reasons.push(finding.reason);
        }
        result
    }
}

/// Rule-based phishing scorer. Holds only the immutable rule set, so one
/// instance can be shared across threads and scores every email independently.
#[derive(Debug, Clone)]
pub struct PhishingScorer {
    config: RuleConfig,
    rules: RuleSet,
}

impl Default for PhishingScorer {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl PhishingScorer {
    pub fn new(config: RuleConfig) -> Self {
        let rules = RuleSet::from_config(&config);
        Self { config, rules }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn score(&self, record: &EmailRecord) -> ScoreResult {
        let email = NormalizedEmail::from_record(record);

        let mut findings = Vec::new();
        for rule in Rule::ALL {
            rule.evaluate(&email, &self.rules, &mut findings);
        }

        let result = ScoreResult::from_findings(findings);
        log::debug!(
            "Scored email id={} score={} reasons={:?}",
            record.id,
            result.score,
            result.reasons
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(sender: &str, subject: &str, body: &str, links: &str, attachments: &str) -> EmailRecord {
        EmailRecord {
            id: "1".to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            links: links.to_string(),
            attachments: attachments.to_string(),
        }
    }

    #[test]
    fn test_id_only_record_scores_zero() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&EmailRecord {
            id: "42".to_string(),
            ..Default::default()
        });
        assert_eq!(result.score, 0);
        assert!(result.is_clean());
    }

    #[test]
    fn test_keyword_reason_present() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&record("", "Account Suspended", "", "", ""));
        assert!(result.reasons.contains(&"keyword:suspended".to_string()));
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_plaintext_link_with_domain_mismatch() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&record(
            "user@real-bank.com",
            "",
            "",
            "http://totally-fake.example/login",
            "",
        ));
        // "bank" is in the sender and in its domain; the link domain has a hyphen.
        assert_eq!(
            result.reasons,
            vec!["link:http", "link_domain_mismatch", "lookalike_hint"]
        );
        assert_eq!(result.score, 6);
    }

    #[test]
    fn test_risky_attachment() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&record("", "", "", "", "invoice.exe"));
        assert_eq!(result.reasons, vec!["has_attachment", "risky_attachment_type"]);
        assert_eq!(result.score, 6);
    }

    #[test]
    fn test_full_phishing_email_in_rule_order() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&record(
            "PayPal.Security@paypa1-alerts.example",
            "URGENT: verify your account",
            "Your account was locked after an unusual login.",
            "http://paypa1-login.example/verify?id=1000",
            "details.zip",
        ));
        assert_eq!(
            result.reasons,
            vec![
                "keyword:verify",
                "keyword:locked",
                "keyword:urgent",
                "keyword:unusual login",
                "link:http",
                "link_domain_mismatch",
                "brand_domain_mismatch:paypal",
                "lookalike_hint",
                "has_attachment",
                "risky_attachment_type",
            ]
        );
        assert_eq!(result.score, 8 + 3 + 2 + 3 + 1 + 2 + 4);
    }

    #[test]
    fn test_custom_points() {
        let mut config = RuleConfig::default();
        config.points.plaintext_link = 2;
        let scorer = PhishingScorer::new(config);
        let result = scorer.score(&record("", "", "", "http://example.com", ""));
        assert_eq!(result.reasons, vec!["link:http"]);
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_non_ascii_link_host_matches_sender_domain() {
        let scorer = PhishingScorer::default();
        let result = scorer.score(&record("info@bücher.de", "", "", "https://bücher.de/shop", ""));
        assert!(result.is_clean());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_explicit_port_and_userinfo_are_part_of_link_domain() {
        let scorer = PhishingScorer::default();
        for link in ["https://example.com:443/x", "https://info@example.com/x"] {
            let result = scorer.score(&record("info@example.com", "", "", link, ""));
            assert_eq!(result.reasons, vec!["link_domain_mismatch"], "link {}", link);
            assert_eq!(result.score, 2);
        }
    }

    #[test]
    fn test_score_saturates_on_large_points() {
        let mut config = RuleConfig::default();
        config.points.keyword = u32::MAX;
        let scorer = PhishingScorer::new(config);
        let result = scorer.score(&record("", "Urgent", "please verify", "", ""));
        assert_eq!(result.reasons, vec!["keyword:verify", "keyword:urgent"]);
        assert_eq!(result.score, u32::MAX);
    }

    #[test]
    fn test_scorer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PhishingScorer>();
    }

    proptest! {
        #[test]
        fn prop_score_is_sum_of_reason_points(
            sender in ".{0,40}",
            subject in ".{0,40}",
            body in ".{0,80}",
            links in prop_oneof![Just("none".to_string()), "(https?://)?[a-z0-9.-]{0,20}(/[a-z0-9]{0,8})?"],
            attachments in "[a-zA-Z0-9. ]{0,20}",
        ) {
            let scorer = PhishingScorer::default();
            let email = record(&sender, &subject, &body, &links, &attachments);
            let result = scorer.score(&email);

            let points: Vec<Option<u32>> = result
                .reasons
                .iter()
                .map(|r| scorer.config().points_for_reason(r))
                .collect();
            prop_assert!(points.iter().all(Option::is_some));
            prop_assert_eq!(result.score, points.into_iter().flatten().sum::<u32>());
            prop_assert_eq!(&result, &scorer.score(&email));
        }
    }
}
