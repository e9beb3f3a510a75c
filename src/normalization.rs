use crate::domain_utils::DomainUtils;
use crate::record::EmailRecord;

/// Lowercase and trim a raw field value. Absent values normalize to `""`.
pub fn normalize_field(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

/// An email record after text normalization and domain extraction.
///
/// `links` is trimmed but keeps its case; `link_domain` is lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedEmail {
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub links: String,
    pub attachments: String,
    pub sender_domain: String,
    pub link_domain: String,
}

impl NormalizedEmail {
    pub fn from_record(record: &EmailRecord) -> Self {
        let sender = normalize_field(Some(record.sender.as_str()));
        let links = record.links.trim().to_string();
        let sender_domain = DomainUtils::domain_from_address(&sender);
        let link_domain = if Self::is_present(&links) {
            DomainUtils::domain_from_url(&links)
        } else {
            String::new()
        };

        Self {
            subject: normalize_field(Some(record.subject.as_str())),
            body: normalize_field(Some(record.body.as_str())),
            attachments: normalize_field(Some(record.attachments.as_str())),
            sender,
            links,
            sender_domain,
            link_domain,
        }
    }

    /// A field carries a value unless it is empty or the literal `none`.
    pub fn is_present(value: &str) -> bool {
        !value.is_empty() && !value.eq_ignore_ascii_case("none")
    }

    pub fn has_links(&self) -> bool {
        Self::is_present(&self.links)
    }

    pub fn has_attachments(&self) -> bool {
        Self::is_present(&self.attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_field() {
        assert_eq!(normalize_field(Some("  Account SUSPENDED \n")), "account suspended");
        assert_eq!(normalize_field(Some("")), "");
        assert_eq!(normalize_field(None), "");
    }

    #[test]
    fn test_from_record_extracts_domains() {
        let record = EmailRecord {
            sender: " Support@PayPa1.com ".to_string(),
            links: " http://PayPa1-Secure.com/Login ".to_string(),
            ..Default::default()
        };
        let email = NormalizedEmail::from_record(&record);

        assert_eq!(email.sender, "support@paypa1.com");
        assert_eq!(email.sender_domain, "paypa1.com");
        assert_eq!(email.links, "http://PayPa1-Secure.com/Login");
        assert_eq!(email.link_domain, "paypa1-secure.com");
    }

    #[test]
    fn test_none_literal_is_absent() {
        let record = EmailRecord {
            links: "NONE".to_string(),
            attachments: " None ".to_string(),
            ..Default::default()
        };
        let email = NormalizedEmail::from_record(&record);

        assert!(!email.has_links());
        assert!(!email.has_attachments());
        assert_eq!(email.link_domain, "");
    }
}
