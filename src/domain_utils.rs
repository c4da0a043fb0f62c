/// Sender address and domain helpers
pub struct DomainUtils;

impl DomainUtils {
    /// Extract the bare address from a "Display Name <addr>" header value
    pub fn extract_address(sender: &str) -> Option<String> {
        let trimmed = sender.trim();
        let candidate = match (trimmed.rfind('<'), trimmed.rfind('>')) {
            (Some(start), Some(end)) if end > start => &trimmed[start + 1..end],
            _ => trimmed,
        };
        let candidate = candidate.trim().trim_matches('"');
        if candidate.contains('@') && !candidate.contains(char::is_whitespace) {
            Some(candidate.to_lowercase())
        } else {
            None
        }
    }

    /// Extract domain from email address
    pub fn extract_domain(email: &str) -> Option<String> {
        email
            .split('@')
            .nth(1)
            .map(|s| s.trim_end_matches('>').to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Human-facing name for a sender.
    ///
    /// `Boss <b@x.com>` yields `Boss`, a bare `jane@x.com` yields `jane`.
    pub fn display_name(sender: &str) -> String {
        let trimmed = sender.trim();
        if let Some(idx) = trimmed.find('<') {
            let name = trimmed[..idx].trim().trim_matches('"').trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
        let address = Self::extract_address(trimmed).unwrap_or_else(|| trimmed.to_string());
        match address.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => trimmed.to_string(),
        }
    }

    /// Check if domain matches any in list (with hierarchy support)
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain_lower = domain.to_lowercase();

        for pattern in domain_list {
            let pattern_lower = pattern.trim_start_matches('@').to_lowercase();

            if domain_lower == pattern_lower {
                return true;
            }

            // Subdomain match (domain ends with .pattern)
            if domain_lower.ends_with(&format!(".{}", pattern_lower)) {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_address() {
        assert_eq!(
            DomainUtils::extract_address("Boss <B@X.com>"),
            Some("b@x.com".to_string())
        );
        assert_eq!(
            DomainUtils::extract_address("newsletter@news.com"),
            Some("newsletter@news.com".to_string())
        );
        assert_eq!(DomainUtils::extract_address("Unknown"), None);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            DomainUtils::extract_domain("user@example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(DomainUtils::extract_domain("invalid"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(DomainUtils::display_name("Boss <b@x.com>"), "Boss");
        assert_eq!(DomainUtils::display_name("\"Ana Ruiz\" <ana@x.com>"), "Ana Ruiz");
        assert_eq!(DomainUtils::display_name("newsletter@news.com"), "newsletter");
        assert_eq!(DomainUtils::display_name("<ops@x.com>"), "ops");
        assert_eq!(DomainUtils::display_name("Unknown"), "Unknown");
    }

    #[test]
    fn test_matches_domain_list() {
        let domains = vec!["example.com".to_string(), "@test.org".to_string()];

        assert!(DomainUtils::matches_domain_list("example.com", &domains));
        assert!(DomainUtils::matches_domain_list(
            "mail.example.com",
            &domains
        ));
        assert!(DomainUtils::matches_domain_list("test.org", &domains));
        assert!(!DomainUtils::matches_domain_list("other.com", &domains));
        assert!(!DomainUtils::matches_domain_list("notexample.com", &domains));
    }
}
