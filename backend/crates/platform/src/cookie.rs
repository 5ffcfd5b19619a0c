//! Cookie helpers
//!
//! Builds `Set-Cookie` values for short-lived, HttpOnly cookies (the OAuth
//! anti-CSRF state) and reads cookies back from request headers.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    /// Parse a configuration value (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Option<Duration>,
}

impl CookieConfig {
    /// HttpOnly, Secure, SameSite=Lax, Path=/ session cookie
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    fn attributes(&self) -> String {
        let mut attrs = String::new();
        if self.http_only {
            attrs.push_str("; HttpOnly");
        }
        // Browsers drop SameSite=None cookies that are not Secure
        if self.secure || self.same_site == SameSite::None {
            attrs.push_str("; Secure");
        }
        attrs.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        attrs.push_str(&format!("; Path={}", self.path));
        attrs
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}{}", self.name, value, self.attributes());
        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        cookie
    }

    /// Build Set-Cookie header value that expires the cookie
    pub fn build_delete_cookie(&self) -> String {
        format!("{}={}; Max-Age=0", self.name, self.attributes())
    }

    pub fn set_cookie_header(&self, value: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.build_set_cookie(value)).ok()
    }

    pub fn delete_cookie_header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.build_delete_cookie()).ok()
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cookie_attributes() {
        let config = CookieConfig::new("oauth_state").with_max_age(Duration::from_secs(300));

        let cookie = config.build_set_cookie("value123");
        assert!(cookie.starts_with("oauth_state=value123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=300"));
    }

    #[test]
    fn test_insecure_cookie_for_local_development() {
        let cookie = CookieConfig::new("oauth_state")
            .with_secure(false)
            .build_set_cookie("v");
        assert!(!cookie.contains("Secure"));

        let cookie = CookieConfig::new("oauth_state")
            .with_secure(false)
            .with_same_site(SameSite::None)
            .build_set_cookie("v");
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_delete_cookie() {
        let cookie = CookieConfig::new("oauth_state").build_delete_cookie();
        assert!(cookie.starts_with("oauth_state=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; oauth_state=abc123; other=xyz"),
        );

        assert_eq!(
            extract_cookie(&headers, "oauth_state"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_same_site_parse() {
        assert_eq!(SameSite::parse("Strict"), Some(SameSite::Strict));
        assert_eq!(SameSite::parse(" none "), Some(SameSite::None));
        assert_eq!(SameSite::parse("sideways"), None);
    }
}
