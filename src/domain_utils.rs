use url::Url;

/// Minimal domain extraction utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Extract the domain from an email address: everything after the first `@`,
    /// lowercased and trimmed. Returns an empty string when there is no `@`.
    pub fn domain_from_address(address: &str) -> String {
        match address.split_once('@') {
            Some((_, domain)) => domain.trim().to_lowercase(),
            None => String::new(),
        }
    }

    /// Extract the network location of a URL exactly as written in the link:
    /// userinfo, host and any explicit port, lowercased and trimmed. The host is
    /// not converted to punycode. Anything that does not parse as an absolute
    /// URL with a host yields an empty string.
    pub fn domain_from_url(url: &str) -> String {
        let url = url.trim();
        match Url::parse(url) {
            Ok(parsed) if parsed.has_host() => Self::raw_authority(url)
                .map(|authority| authority.trim().to_lowercase())
                .unwrap_or_default(),
            Ok(_) => String::new(),
            Err(e) => {
                log::debug!("Unparseable link '{}': {}", url, e);
                String::new()
            }
        }
    }

    /// The text between `://` and the first `/`, `?` or `#`.
    fn raw_authority(url: &str) -> Option<&str> {
        let (_, rest) = url.split_once("://")?;
        let end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Check if domain matches any in list (with hierarchy support)
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain_lower = domain.to_lowercase();

        domain_list.iter().any(|pattern| {
            let pattern_lower = pattern.to_lowercase();
            domain_lower == pattern_lower || domain_lower.ends_with(&format!(".{}", pattern_lower))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_address() {
        assert_eq!(DomainUtils::domain_from_address("a@B.COM"), "b.com");
        assert_eq!(
            DomainUtils::domain_from_address("user@example.com "),
            "example.com"
        );
        assert_eq!(DomainUtils::domain_from_address("no-at-sign"), "");
        assert_eq!(DomainUtils::domain_from_address(""), "");
    }

    #[test]
    fn test_domain_from_address_splits_on_first_at() {
        assert_eq!(DomainUtils::domain_from_address("a@b@c.com"), "b@c.com");
        assert_eq!(DomainUtils::domain_from_address("trailing@"), "");
    }

    #[test]
    fn test_domain_from_url() {
        assert_eq!(
            DomainUtils::domain_from_url("http://totally-fake.example/login"),
            "totally-fake.example"
        );
        assert_eq!(
            DomainUtils::domain_from_url("https://PayPal.COM/signin?x=1"),
            "paypal.com"
        );
        assert_eq!(
            DomainUtils::domain_from_url("http://secure-login.example:8080/a"),
            "secure-login.example:8080"
        );
    }

    #[test]
    fn test_domain_from_url_keeps_authority_as_written() {
        assert_eq!(DomainUtils::domain_from_url("https://bücher.de/shop"), "bücher.de");
        assert_eq!(
            DomainUtils::domain_from_url("https://example.com:443/x"),
            "example.com:443"
        );
        assert_eq!(
            DomainUtils::domain_from_url("https://info@example.com/x"),
            "info@example.com"
        );
        assert_eq!(
            DomainUtils::domain_from_url("http://Example.COM?next=/home"),
            "example.com"
        );
    }

    #[test]
    fn test_domain_from_url_never_fails() {
        assert_eq!(DomainUtils::domain_from_url("not a url"), "");
        assert_eq!(DomainUtils::domain_from_url("www.example.com/path"), "");
        assert_eq!(DomainUtils::domain_from_url(""), "");
        assert_eq!(DomainUtils::domain_from_url("http://"), "");
        assert_eq!(DomainUtils::domain_from_url("mailto:someone@example.com"), "");
        assert_eq!(DomainUtils::domain_from_url("http:example.com/path"), "");
    }

    #[test]
    fn test_matches_domain_list() {
        let domains = vec!["apple.com".to_string(), "icloud.com".to_string()];

        assert!(DomainUtils::matches_domain_list("apple.com", &domains));
        assert!(DomainUtils::matches_domain_list("mail.icloud.com", &domains));
        assert!(!DomainUtils::matches_domain_list("apple-id.com", &domains));
        assert!(!DomainUtils::matches_domain_list("", &domains));
    }
}
