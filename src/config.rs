use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            rules: RuleConfig::default(),
            report: ReportConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(DetectorError::InvalidConfig(format!(
                "unsupported configuration version {} (expected {})",
                self.version, CONFIG_VERSION
            )));
        }
        self.rules.validate()
    }
}

/// How a brand named in the sender is checked against the sender's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandCheck {
    /// Mismatch when the brand keyword does not occur in the sender domain.
    DomainContainsBrand,
    /// Mismatch when the sender domain is not one of the brand's domains (or a subdomain of one).
    AllowList,
}

/// Whether the brand rule stops at the first mismatching brand or fires once per brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandMatch {
    First,
    Each,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl BrandConfig {
    fn new(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookalikeConfig {
    /// Substrings of the link that hint at a lookalike domain (digit-for-letter swaps).
    pub link_markers: Vec<String>,
    /// Substrings checked in both the sender and the link, e.g. `secure-` or `-login`.
    pub sender_markers: Vec<String>,
    pub link_domain_hyphen: bool,
    /// Only look for lookalike hints when the email carries a link.
    pub requires_link: bool,
}

impl Default for LookalikeConfig {
    fn default() -> Self {
        Self {
            link_markers: vec!["0".to_string()],
            sender_markers: Vec::new(),
            link_domain_hyphen: true,
            requires_link: true,
        }
    }
}

/// Points added when each rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub keyword: u32,
    pub plaintext_link: u32,
    pub link_domain_mismatch: u32,
    pub brand_domain_mismatch: u32,
    pub lookalike_hint: u32,
    pub has_attachment: u32,
    pub risky_attachment_type: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            keyword: 2,
            plaintext_link: 3,
            link_domain_mismatch: 2,
            brand_domain_mismatch: 3,
            lookalike_hint: 1,
            has_attachment: 2,
            risky_attachment_type: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub keywords: Vec<String>,
    pub keywords_include_sender: bool,
    pub brands: Vec<BrandConfig>,
    /// Look for brand names in the subject and body as well as the sender.
    pub brand_in_text: bool,
    pub brand_check: BrandCheck,
    pub brand_match: BrandMatch,
    pub risky_extensions: Vec<String>,
    pub lookalike: LookalikeConfig,
    pub points: PointsConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "verify",
                "locked",
                "suspended",
                "action required",
                "urgent",
                "payment failed",
                "compromised",
                "secure",
                "reset",
                "unusual login",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            keywords_include_sender: false,
            brands: vec![
                BrandConfig::new("amazon", &["amazon.com"]),
                BrandConfig::new("paypal", &["paypal.com"]),
                BrandConfig::new("netflix", &["netflix.com"]),
                BrandConfig::new("apple", &["apple.com", "icloud.com"]),
                BrandConfig::new("bank", &[]),
            ],
            brand_in_text: false,
            brand_check: BrandCheck::DomainContainsBrand,
            brand_match: BrandMatch::Each,
            risky_extensions: [
                ".exe", ".js", ".vbs", ".bat", ".scr", ".zip", ".iso", ".docm", ".xlsm",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
            lookalike: LookalikeConfig::default(),
            points: PointsConfig::default(),
        }
    }
}

impl RuleConfig {
    /// An empty pattern would match every email, so reject it up front.
    pub fn validate(&self) -> Result<()> {
        let empty = |list: &[String]| list.iter().any(|s| s.trim().is_empty());

        if empty(&self.keywords) {
            return Err(DetectorError::InvalidConfig(
                "keywords must not contain empty entries".to_string(),
            ));
        }
        if self.brands.iter().any(|b| b.name.trim().is_empty()) {
            return Err(DetectorError::InvalidConfig(
                "brand names must not be empty".to_string(),
            ));
        }
        if empty(&self.risky_extensions) {
            return Err(DetectorError::InvalidConfig(
                "risky_extensions must not contain empty entries".to_string(),
            ));
        }
        if empty(&self.lookalike.link_markers) || empty(&self.lookalike.sender_markers) {
            return Err(DetectorError::InvalidConfig(
                "lookalike markers must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Points carried by a reason tag, or `None` for a tag no rule produces.
    pub fn points_for_reason(&self, reason: &str) -> Option<u32> {
        if reason.starts_with("keyword:") {
            return Some(self.points.keyword);
        }
        if reason.starts_with("brand_domain_mismatch:") {
            return Some(self.points.brand_domain_mismatch);
        }
        match reason {
            "link:http" => Some(self.points.plaintext_link),
            "link_domain_mismatch" => Some(self.points.link_domain_mismatch),
            "lookalike_hint" => Some(self.points.lookalike_hint),
            "has_attachment" => Some(self.points.has_attachment),
            "risky_attachment_type" => Some(self.points.risky_attachment_type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub input: String,
    pub output: String,
    pub min_score: u32,
    /// Rows echoed to the terminal after filtering.
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: "data/emails.csv".to_string(),
            output: "report.csv".to_string(),
            min_score: 0,
            top: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub input: String,
    pub default_min_score: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5001".to_string(),
            input: "data/emails.csv".to_string(),
            default_min_score: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
rules:
  keywords: ["gift card"]
  brand_match: first
  points:
    plaintext_link: 2
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.rules.keywords, vec!["gift card".to_string()]);
        assert_eq!(config.rules.brand_match, BrandMatch::First);
        assert_eq!(config.rules.brand_check, BrandCheck::DomainContainsBrand);
        assert_eq!(config.rules.points.plaintext_link, 2);
        assert_eq!(config.rules.points.risky_attachment_type, 4);
        assert_eq!(config.rules.brands.len(), 5);
        assert_eq!(config.server.default_min_score, 8);
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let yaml = "rules:\n  keywords: [\"verify\", \" \"]\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(DetectorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        assert!(Config::from_yaml("version: 2\n").is_err());
    }

    #[test]
    fn test_points_for_reason() {
        let rules = RuleConfig::default();
        assert_eq!(rules.points_for_reason("keyword:verify"), Some(2));
        assert_eq!(rules.points_for_reason("link:http"), Some(3));
        assert_eq!(rules.points_for_reason("brand_domain_mismatch:paypal"), Some(3));
        assert_eq!(rules.points_for_reason("risky_attachment_type"), Some(4));
        assert_eq!(rules.points_for_reason("something_else"), None);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phish-score.yaml");

        let mut config = Config::default();
        config.report.top = 3;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.report.top, 3);
    }
}
