//! Session cookie reading and `Set-Cookie` directives.
//!
//! Header parsing stays minimal: the cookie named by the manager is pulled out
//! of the request's `Cookie` headers and percent-decoded. Everything else
//! about the cookie wire format belongs to the HTTP layer.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use http::HeaderMap;
use http::header::COOKIE;

use crate::id::SessionId;

/// `Expires` attribute format (IMF-fixdate, RFC 7231).
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A cookie the server wants the client to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDirective {
    /// Cookie name.
    pub name: String,
    /// Percent-escaped cookie value.
    pub value: String,
    /// `Path` attribute.
    pub path: String,
    /// Whether the `HttpOnly` flag is set.
    pub http_only: bool,
    /// `Max-Age` attribute.
    pub max_age: Duration,
    /// `Expires` attribute.
    pub expires: DateTime<Utc>,
}

impl CookieDirective {
    /// Directive carrying `id`, valid for `max_age` from `now`.
    pub fn issue(name: &str, id: &SessionId, max_age: Duration, now: DateTime<Utc>) -> Self {
        let expires = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            name: name.to_string(),
            value: urlencoding::encode(id.as_str()).into_owned(),
            path: "/".to_string(),
            http_only: true,
            max_age,
            expires,
        }
    }

    /// Directive telling the client to drop the cookie immediately.
    pub fn expire(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            path: "/".to_string(),
            http_only: true,
            max_age: Duration::ZERO,
            expires: DateTime::<Utc>::default(),
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CookieDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path={}; Max-Age={}; Expires={}",
            self.name,
            self.value,
            self.path,
            self.max_age.as_secs(),
            self.expires.format(HTTP_DATE_FORMAT)
        )?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
///
/// The value is percent-decoded; values that do not decode to UTF-8 are
/// treated as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .and_then(|(_, value)| {
            let value = value.trim().trim_matches('"');
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        })
}
