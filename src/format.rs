//! Format validators
//!
//! A process-wide registry of (format name → predicate on strings).
//! Registration happens at startup; validation only reads. Formats the
//! registry does not know are treated as annotation-only.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, RwLock};
use url::Url;

type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

static FORMATS: Lazy<RwLock<HashMap<String, FormatCheck>>> =
    Lazy::new(|| RwLock::new(builtin_formats()));

/// Register a format validator process-wide
///
/// Later registrations replace earlier ones of the same name.
pub fn register_format(
    name: impl Into<String>,
    check: impl Fn(&str) -> bool + Send + Sync + 'static,
) {
    FORMATS
        .write()
        .expect("format registry poisoned")
        .insert(name.into(), Arc::new(check));
}

/// Check a string against a named format
///
/// Returns `None` when the format is unknown (annotation-only).
pub fn check_format(name: &str, value: &str) -> Option<bool> {
    let check = FORMATS
        .read()
        .expect("format registry poisoned")
        .get(name)
        .cloned()?;
    Some(check(value))
}

fn builtin_formats() -> HashMap<String, FormatCheck> {
    let mut formats: HashMap<String, FormatCheck> = HashMap::new();
    let mut add = |name: &str, check: fn(&str) -> bool| {
        formats.insert(name.to_string(), Arc::new(check));
    };
    add("date", is_date);
    add("time", is_time);
    add("date-time", is_date_time);
    add("duration", is_duration);
    add("email", is_email);
    add("hostname", is_hostname);
    add("ipv4", |s| s.parse::<Ipv4Addr>().is_ok());
    add("ipv6", |s| s.parse::<Ipv6Addr>().is_ok());
    add("uuid", is_uuid);
    add("uri", |s| Url::parse(s).is_ok());
    add("uri-reference", is_uri_reference);
    add("json-pointer", is_json_pointer);
    add("regex", |s| Regex::new(s).is_ok());
    formats
}

fn is_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        s.get(range)?.parse().ok()
    };
    let (Some(year), Some(month), Some(day)) = (digits(0..4), digits(5..7), digits(8..10)) else {
        return false;
    };
    if !(1..=12).contains(&month) || day == 0 {
        return false;
    }
    day <= days_in_month(year, month)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
            if leap {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn is_time(s: &str) -> bool {
    // HH:MM:SS with optional fraction, then Z or a ±HH:MM offset
    static TIME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([zZ]|[+-]\d{2}:\d{2})$")
            .expect("time regex")
    });
    let Some(captures) = TIME.captures(s) else {
        return false;
    };
    let field = |i: usize| -> u32 { captures[i].parse().unwrap_or(99) };
    let (hour, minute, second) = (field(1), field(2), field(3));
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    if let Some(offset) = captures.get(5) {
        let offset = offset.as_str();
        if offset.len() == 6 {
            let oh: u32 = offset[1..3].parse().unwrap_or(99);
            let om: u32 = offset[4..6].parse().unwrap_or(99);
            if oh > 23 || om > 59 {
                return false;
            }
        }
    }
    true
}

fn is_date_time(s: &str) -> bool {
    match s.find(['T', 't']) {
        Some(pos) => is_date(&s[..pos]) && is_time(&s[pos + 1..]),
        None => false,
    }
}

fn is_duration(s: &str) -> bool {
    static DURATION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^P(?:\d+W|(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?)$")
            .expect("duration regex")
    });
    // The regex admits bare "P" and "PT"; a duration needs a component
    DURATION.is_match(s) && s.len() > 1 && !s.ends_with('T')
}

fn is_email(s: &str) -> bool {
    static EMAIL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
            .expect("email regex")
    });
    EMAIL.is_match(s)
}

fn is_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.trim_end_matches('.').split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn is_uuid(s: &str) -> bool {
    static UUID: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("uuid regex")
    });
    UUID.is_match(s)
}

fn is_uri_reference(s: &str) -> bool {
    static DUMMY_BASE: Lazy<Url> =
        Lazy::new(|| Url::parse("thing://host/").expect("dummy base URI"));
    Url::parse(s).is_ok() || DUMMY_BASE.join(s).is_ok()
}

fn is_json_pointer(s: &str) -> bool {
    // Plain form only; the fragment form is not a json-pointer value
    !s.starts_with('#') && crate::pointer::JsonPointer::parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date() {
        assert_eq!(check_format("date", "2024-02-29"), Some(true));
        assert_eq!(check_format("date", "2023-02-29"), Some(false));
        assert_eq!(check_format("date", "2024-13-01"), Some(false));
        assert_eq!(check_format("date", "2024-1-01"), Some(false));
    }

    #[test]
    fn test_time_and_date_time() {
        assert_eq!(check_format("time", "23:59:60Z"), Some(true));
        assert_eq!(check_format("time", "12:00:00+05:30"), Some(true));
        assert_eq!(check_format("time", "24:00:00Z"), Some(false));
        assert_eq!(check_format("time", "12:00:00"), Some(false));
        assert_eq!(
            check_format("date-time", "2024-06-01T12:30:00.5Z"),
            Some(true)
        );
        assert_eq!(check_format("date-time", "2024-06-01 12:30:00Z"), Some(false));
    }

    #[test]
    fn test_duration() {
        assert_eq!(check_format("duration", "P3Y6M4DT12H30M5S"), Some(true));
        assert_eq!(check_format("duration", "P4W"), Some(true));
        assert_eq!(check_format("duration", "P"), Some(false));
        assert_eq!(check_format("duration", "P1DT"), Some(false));
    }

    #[test]
    fn test_network_formats() {
        assert_eq!(check_format("ipv4", "192.168.0.1"), Some(true));
        assert_eq!(check_format("ipv4", "256.1.1.1"), Some(false));
        assert_eq!(check_format("ipv6", "::1"), Some(true));
        assert_eq!(check_format("ipv6", "not-an-ip"), Some(false));
        assert_eq!(check_format("hostname", "example.com"), Some(true));
        assert_eq!(check_format("hostname", "-bad.example"), Some(false));
    }

    #[test]
    fn test_uri_formats() {
        assert_eq!(check_format("uri", "https://example.com/a?b=c"), Some(true));
        assert_eq!(check_format("uri", "relative/path"), Some(false));
        assert_eq!(check_format("uri-reference", "relative/path"), Some(true));
        assert_eq!(check_format("json-pointer", "/a/b~0c"), Some(true));
        assert_eq!(check_format("json-pointer", "a/b"), Some(false));
    }

    #[test]
    fn test_unknown_format_is_none() {
        assert_eq!(check_format("stock-ticker", "ANET"), None);
    }

    #[test]
    fn test_custom_registration() {
        register_format("even-length", |s| s.len() % 2 == 0);
        assert_eq!(check_format("even-length", "ab"), Some(true));
        assert_eq!(check_format("even-length", "abc"), Some(false));
    }
}
