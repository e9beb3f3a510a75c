use crate::config::{
    BrandCheck, BrandConfig, BrandMatch, LookalikeConfig, PointsConfig, RuleConfig,
};
use crate::domain_utils::DomainUtils;
use crate::normalization::NormalizedEmail;

/// A single rule firing: the points it adds and the reason tag it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub points: u32,
    pub reason: String,
}

/// The heuristic rules, declared in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Keyword,
    PlaintextLink,
    LinkDomainMismatch,
    BrandDomainMismatch,
    LookalikeHint,
    HasAttachment,
    RiskyAttachmentType,
}

impl Rule {
    pub const ALL: [Rule; 7] = [
        Rule::Keyword,
        Rule::PlaintextLink,
        Rule::LinkDomainMismatch,
        Rule::BrandDomainMismatch,
        Rule::LookalikeHint,
        Rule::HasAttachment,
        Rule::RiskyAttachmentType,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Keyword => "keyword",
            Rule::PlaintextLink => "plaintext_link",
            Rule::LinkDomainMismatch => "link_domain_mismatch",
            Rule::BrandDomainMismatch => "brand_domain_mismatch",
            Rule::LookalikeHint => "lookalike_hint",
            Rule::HasAttachment => "has_attachment",
            Rule::RiskyAttachmentType => "risky_attachment_type",
        }
    }

    pub fn points(&self, points: &PointsConfig) -> u32 {
        match self {
            Rule::Keyword => points.keyword,
            Rule::PlaintextLink => points.plaintext_link,
            Rule::LinkDomainMismatch => points.link_domain_mismatch,
            Rule::BrandDomainMismatch => points.brand_domain_mismatch,
            Rule::LookalikeHint => points.lookalike_hint,
            Rule::HasAttachment => points.has_attachment,
            Rule::RiskyAttachmentType => points.risky_attachment_type,
        }
    }

    /// Link rules only run when the email carries a link.
    fn requires_link(&self, rules: &RuleSet) -> bool {
        match self {
            Rule::PlaintextLink | Rule::LinkDomainMismatch | Rule::BrandDomainMismatch => true,
            Rule::LookalikeHint => rules.lookalike.requires_link,
            Rule::Keyword | Rule::HasAttachment | Rule::RiskyAttachmentType => false,
        }
    }

    pub fn evaluate(&self, email: &NormalizedEmail, rules: &RuleSet, findings: &mut Vec<Finding>) {
        if self.requires_link(rules) && !email.has_links() {
            return;
        }

        let points = &rules.points;
        match self {
            Rule::Keyword => {
                let text = if rules.keywords_include_sender {
                    format!("{} {} {}", email.sender, email.subject, email.body)
                } else {
                    format!("{} {}", email.subject, email.body)
                };
                for keyword in &rules.keywords {
                    if text.contains(keyword.as_str()) {
                        findings.push(Finding {
                            points: points.keyword,
                            reason: format!("keyword:{}", keyword),
                        });
                    }
                }
            }
            Rule::PlaintextLink => {
                if email.links.to_lowercase().starts_with("http://") {
                    findings.push(fixed(points.plaintext_link, "link:http"));
                }
            }
            Rule::LinkDomainMismatch => {
                if !email.link_domain.is_empty()
                    && !email.sender_domain.is_empty()
                    && email.link_domain != email.sender_domain
                {
                    findings.push(fixed(points.link_domain_mismatch, "link_domain_mismatch"));
                }
            }
            Rule::BrandDomainMismatch => {
                let text = if rules.brand_in_text {
                    format!("{} {} {}", email.sender, email.subject, email.body)
                } else {
                    email.sender.clone()
                };
                for brand in &rules.brands {
                    if !text.contains(brand.name.as_str())
                        || rules.sender_domain_matches_brand(&email.sender_domain, brand)
                    {
                        continue;
                    }
                    findings.push(Finding {
                        points: points.brand_domain_mismatch,
                        reason: format!("brand_domain_mismatch:{}", brand.name),
                    });
                    if rules.brand_match == BrandMatch::First {
                        break;
                    }
                }
            }
            Rule::LookalikeHint => {
                let links = if email.has_links() {
                    email.links.to_lowercase()
                } else {
                    String::new()
                };
                let lookalike = &rules.lookalike;
                let hint = lookalike.link_markers.iter().any(|m| links.contains(m.as_str()))
                    || (lookalike.link_domain_hyphen && email.link_domain.contains('-'))
                    || lookalike
                        .sender_markers
                        .iter()
                        .any(|m| email.sender.contains(m.as_str()) || links.contains(m.as_str()));
                if hint {
                    findings.push(fixed(points.lookalike_hint, "lookalike_hint"));
                }
            }
            Rule::HasAttachment => {
                if email.has_attachments() {
                    findings.push(fixed(points.has_attachment, "has_attachment"));
                }
            }
            Rule::RiskyAttachmentType => {
                if email.has_attachments()
                    && rules
                        .risky_extensions
                        .iter()
                        .any(|ext| email.attachments.contains(ext.as_str()))
                {
                    findings.push(fixed(points.risky_attachment_type, "risky_attachment_type"));
                }
            }
        }
    }
}

fn fixed(points: u32, reason: &str) -> Finding {
    Finding {
        points,
        reason: reason.to_string(),
    }
}

/// `RuleConfig` prepared for matching against normalized text: every pattern is
/// lowercased and trimmed, and duplicate keywords and brands are dropped so each
/// scores at most once.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub keywords: Vec<String>,
    pub keywords_include_sender: bool,
    pub brands: Vec<BrandConfig>,
    pub brand_in_text: bool,
    pub brand_check: BrandCheck,
    pub brand_match: BrandMatch,
    pub risky_extensions: Vec<String>,
    pub lookalike: LookalikeConfig,
    pub points: PointsConfig,
}

impl RuleSet {
    pub fn from_config(config: &RuleConfig) -> Self {
        let mut brands: Vec<BrandConfig> = Vec::with_capacity(config.brands.len());
        for brand in &config.brands {
            let name = brand.name.trim().to_lowercase();
            if brands.iter().any(|b| b.name == name) {
                continue;
            }
            brands.push(BrandConfig {
                name,
                domains: prepare(&brand.domains),
            });
        }

        let mut lookalike = config.lookalike.clone();
        lookalike.link_markers = prepare(&lookalike.link_markers);
        lookalike.sender_markers = prepare(&lookalike.sender_markers);

        Self {
            keywords: prepare(&config.keywords),
            keywords_include_sender: config.keywords_include_sender,
            brands,
            brand_in_text: config.brand_in_text,
            brand_check: config.brand_check,
            brand_match: config.brand_match,
            risky_extensions: prepare(&config.risky_extensions),
            lookalike,
            points: config.points.clone(),
        }
    }

    fn sender_domain_matches_brand(&self, sender_domain: &str, brand: &BrandConfig) -> bool {
        match self.brand_check {
            BrandCheck::DomainContainsBrand => sender_domain.contains(brand.name.as_str()),
            BrandCheck::AllowList => {
                !sender_domain.is_empty()
                    && DomainUtils::matches_domain_list(sender_domain, &brand.domains)
            }
        }
    }
}

/// Lowercase, trim, and dedupe a pattern list, keeping first-seen order.
fn prepare(patterns: &[String]) -> Vec<String> {
    let mut prepared: Vec<String> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = pattern.trim().to_lowercase();
        if !pattern.is_empty() && !prepared.contains(&pattern) {
            prepared.push(pattern);
        }
    }
    prepared
}
