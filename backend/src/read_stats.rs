//! Once-per-session read counting.
//!
//! A visit counts as a read when the request does not yet carry the post's
//! read cookie. The handler sets the cookie on every detail response, so a
//! browser session counts each post at most once.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use serde::Serialize;

/// Cookie value written for posts that were read.
const READ_COOKIE_VALUE: &str = "true";

/// Cookie name that marks `post_id` as already read in this session.
pub fn read_cookie_key(post_id: &str) -> String {
    format!("post_{post_id}_read")
}

/// `Set-Cookie` value for a session-scoped read marker.
pub fn read_cookie_header(key: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{key}={READ_COOKIE_VALUE}; Path=/")).ok()
}

/// Whether the request carries a cookie named `key`.
pub fn has_cookie(headers: &HeaderMap, key: &str) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .any(|(name, value)| name.trim() == key && !value.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadCount {
    pub total: u64,
    pub today: u64,
}

/// In-memory read counters: a running total per post and one per day.
#[derive(Debug, Default)]
pub struct ReadStats {
    totals: DashMap<String, u64>,
    daily: DashMap<(String, NaiveDate), u64>,
}

impl ReadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a read of `post_id` unless the request already carries its
    /// read cookie. Returns the cookie key the response must set.
    pub fn once_read(&self, headers: &HeaderMap, post_id: &str) -> String {
        let key = read_cookie_key(post_id);
        if has_cookie(headers, &key) {
            tracing::debug!(post = post_id, "read already counted in this session");
        } else {
            self.record(post_id, Local::now().date_naive());
        }
        key
    }

    pub fn record(&self, post_id: &str, day: NaiveDate) {
        *self.totals.entry(post_id.to_string()).or_insert(0) += 1;
        *self.daily.entry((post_id.to_string(), day)).or_insert(0) += 1;
    }

    pub fn total(&self, post_id: &str) -> u64 {
        self.totals.get(post_id).map(|count| *count).unwrap_or(0)
    }

    pub fn on_day(&self, post_id: &str, day: NaiveDate) -> u64 {
        self.daily
            .get(&(post_id.to_string(), day))
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn count(&self, post_id: &str) -> ReadCount {
        ReadCount {
            total: self.total(post_id),
            today: self.on_day(post_id, Local::now().date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).expect("cookie header"));
        headers
    }

    #[test]
    fn cookie_key_is_per_post() {
        assert_eq!(read_cookie_key("hello-rust"), "post_hello-rust_read");
        let value = read_cookie_header("post_a_read").expect("header value");
        assert_eq!(value.to_str().expect("ascii"), "post_a_read=true; Path=/");
    }

    #[test]
    fn has_cookie_scans_every_pair() {
        let headers = headers_with_cookie("theme=dark; post_a_read=true;post_b_read=");
        assert!(has_cookie(&headers, "post_a_read"));
        assert!(!has_cookie(&headers, "post_b_read"));
        assert!(!has_cookie(&headers, "post_c_read"));
        assert!(!has_cookie(&HeaderMap::new(), "post_a_read"));
    }

    #[test]
    fn once_read_counts_only_without_cookie() {
        let stats = ReadStats::new();

        let key = stats.once_read(&HeaderMap::new(), "a");
        assert_eq!(key, "post_a_read");
        assert_eq!(stats.total("a"), 1);

        stats.once_read(&headers_with_cookie("post_a_read=true"), "a");
        assert_eq!(stats.total("a"), 1);

        stats.once_read(&headers_with_cookie("post_b_read=true"), "a");
        assert_eq!(stats.total("a"), 2);
        assert_eq!(stats.count("a").today, 2);
        assert_eq!(stats.total("b"), 0);
    }

    #[test]
    fn daily_counts_are_kept_per_day() {
        let stats = ReadStats::new();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");

        stats.record("a", monday);
        stats.record("a", monday);
        stats.record("a", tuesday);

        assert_eq!(stats.on_day("a", monday), 2);
        assert_eq!(stats.on_day("a", tuesday), 1);
        assert_eq!(stats.total("a"), 3);
    }
}
