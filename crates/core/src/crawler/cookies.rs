//! Cookie file loading for authenticated listing crawls.
//!
//! Two export formats are understood: Netscape `cookies.txt` and a JSON array
//! (or single object) of `{domain, name, value, path, secure}` records as
//! written by common browser extensions.

use reqwest::cookie::Jar;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use url::Url;

use super::CrawlError;

/// Which format a cookie file was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieFormat {
    Netscape,
    Json,
}

impl std::fmt::Display for CookieFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookieFormat::Netscape => write!(f, "netscape"),
            CookieFormat::Json => write!(f, "json"),
        }
    }
}

/// A populated cookie jar.
pub struct LoadedCookies {
    pub jar: Arc<Jar>,
    pub format: CookieFormat,
    pub count: usize,
}

impl std::fmt::Debug for LoadedCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedCookies")
            .field("jar", &"<jar>")
            .field("format", &self.format)
            .field("count", &self.count)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonCookies {
    Many(Vec<JsonCookie>),
    One(JsonCookie),
}

#[derive(Debug, Deserialize)]
struct JsonCookie {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secure: bool,
}

/// Read a cookie export into a jar.
pub fn load_cookie_jar(path: &Path) -> Result<LoadedCookies, CrawlError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CrawlError::Cookies(format!("{}: {}", path.display(), e)))?;
    let text = String::from_utf8_lossy(&bytes);
    parse_cookies(&text)
}

fn parse_cookies(text: &str) -> Result<LoadedCookies, CrawlError> {
    let head = text.trim_start();
    let jar = Jar::default();

    let (format, count) = if head.starts_with("# Netscape") || head.starts_with("# HTTP Cookie File")
    {
        (CookieFormat::Netscape, add_netscape(&jar, text))
    } else if head.starts_with('{') || head.starts_with('[') {
        (CookieFormat::Json, add_json(&jar, head)?)
    } else {
        return Err(CrawlError::Cookies(
            "unrecognized cookies format (expected Netscape or JSON)".to_string(),
        ));
    };

    if count == 0 {
        return Err(CrawlError::Cookies(format!(
            "no usable cookies in {} file",
            format
        )));
    }

    Ok(LoadedCookies {
        jar: Arc::new(jar),
        format,
        count,
    })
}

fn add_netscape(jar: &Jar, text: &str) -> usize {
    let mut count = 0;
    for line in text.lines() {
        let line = line.trim_end_matches(['\r', '\n']);
        // `#HttpOnly_` prefixes real entries; other `#` lines are comments.
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.starts_with('#') || line.trim().is_empty() => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            continue;
        }
        let (domain, path, secure, name, value) =
            (fields[0], fields[2], fields[3], fields[5], fields[6]);
        if add_cookie(jar, domain, path, secure.eq_ignore_ascii_case("TRUE"), name, value) {
            count += 1;
        }
    }
    count
}

fn add_json(jar: &Jar, text: &str) -> Result<usize, CrawlError> {
    let parsed: JsonCookies = serde_json::from_str(text)
        .map_err(|e| CrawlError::Cookies(format!("invalid JSON cookie file: {}", e)))?;
    let cookies = match parsed {
        JsonCookies::Many(list) => list,
        JsonCookies::One(cookie) => vec![cookie],
    };

    let mut count = 0;
    for cookie in cookies {
        let (Some(domain), Some(name), Some(value)) = (cookie.domain, cookie.name, cookie.value)
        else {
            continue;
        };
        if domain.is_empty() {
            continue;
        }
        let path = cookie.path.unwrap_or_else(|| "/".to_string());
        if add_cookie(jar, &domain, &path, cookie.secure, &name, &value) {
            count += 1;
        }
    }
    Ok(count)
}

fn add_cookie(jar: &Jar, domain: &str, path: &str, secure: bool, name: &str, value: &str) -> bool {
    let host = domain.trim_start_matches('.');
    let path = if path.is_empty() { "/" } else { path };
    let Ok(url) = Url::parse(&format!("https://{}{}", host, path)) else {
        return false;
    };

    let mut cookie = format!("{}={}; Domain={}; Path={}", name, value, host, path);
    if secure {
        cookie.push_str("; Secure");
    }
    jar.add_cookie_str(&cookie, &url);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    fn header_for(loaded: &LoadedCookies, url: &str) -> String {
        loaded
            .jar
            .cookies(&Url::parse(url).unwrap())
            .map(|h| h.to_str().unwrap().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_netscape() {
        let text = "# Netscape HTTP Cookie File\n\
                    # comment line\n\
                    .steamcommunity.com\tTRUE\t/\tTRUE\t0\tsessionid\tabc123\n\
                    #HttpOnly_steamcommunity.com\tFALSE\t/\tTRUE\t0\tsteamLoginSecure\ttoken\n\
                    broken line\n";
        let loaded = parse_cookies(text).unwrap();
        assert_eq!(loaded.format, CookieFormat::Netscape);
        assert_eq!(loaded.count, 2);

        let header = header_for(&loaded, "https://steamcommunity.com/workshop/");
        assert!(header.contains("sessionid=abc123"));
        assert!(header.contains("steamLoginSecure=token"));
    }

    #[test]
    fn test_parse_json_array() {
        let text = r#"[
            {"domain": ".steamcommunity.com", "name": "sessionid", "value": "xyz"},
            {"domain": "", "name": "ignored", "value": "1"},
            {"name": "no-domain", "value": "1"}
        ]"#;
        let loaded = parse_cookies(text).unwrap();
        assert_eq!(loaded.format, CookieFormat::Json);
        assert_eq!(loaded.count, 1);
        assert!(header_for(&loaded, "https://steamcommunity.com/").contains("sessionid=xyz"));
    }

    #[test]
    fn test_parse_json_single_object() {
        let text = r#"{"domain": "steamcommunity.com", "name": "a", "value": "b", "secure": true}"#;
        let loaded = parse_cookies(text).unwrap();
        assert_eq!(loaded.count, 1);
    }

    #[test]
    fn test_json_without_usable_cookies_fails() {
        let err = parse_cookies(r#"[{"name": "x"}]"#).unwrap_err();
        assert!(matches!(err, CrawlError::Cookies(_)));
    }

    #[test]
    fn test_unknown_format_fails() {
        assert!(matches!(
            parse_cookies("sessionid=abc"),
            Err(CrawlError::Cookies(_))
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_cookie_jar(Path::new("/nonexistent/cookies.txt")).unwrap_err();
        assert!(matches!(err, CrawlError::Cookies(_)));
    }
}
