//! `Set-Cookie` extraction
//!
//! The backends answer a login with several cookies, sometimes setting the
//! same one twice. All values of the header are joined with `", "` and split
//! back on that separator; the last entry that is a `name=value` pair wins.
//! Attributes after the first `;` are dropped.

use reqwest::header::{HeaderMap, HeaderName};

/// Last cookie pair carried by `header`, if any.
#[must_use]
pub fn last_cookie(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    let joined = headers
        .get_all(header)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(", ");

    joined
        .split(", ")
        .filter_map(cookie_pair)
        .last()
        .map(str::to_string)
}

fn cookie_pair(entry: &str) -> Option<&str> {
    let pair = entry.split(';').next()?.trim();
    let (name, _) = pair.split_once('=')?;
    if name.is_empty() || name.contains(' ') {
        return None;
    }
    Some(pair)
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, SET_COOKIE};

    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for value in values {
            map.append(SET_COOKIE, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(last_cookie(&HeaderMap::new(), &SET_COOKIE), None);
    }

    #[test]
    fn keeps_only_name_value() {
        let map = headers(&["PHPSESSID=abc; path=/; HttpOnly"]);
        assert_eq!(last_cookie(&map, &SET_COOKIE).as_deref(), Some("PHPSESSID=abc"));
    }

    #[test]
    fn last_duplicate_wins() {
        let map = headers(&["PHPSESSID=first; path=/", "webrole=gen", "PHPSESSID=second; path=/"]);
        assert_eq!(last_cookie(&map, &SET_COOKIE).as_deref(), Some("PHPSESSID=second"));
    }

    #[test]
    fn expires_dates_do_not_produce_fake_cookies() {
        let map = headers(&["PHPSESSID=abc; expires=Thu, 01-Jan-2099 00:00:00 GMT; path=/"]);
        assert_eq!(last_cookie(&map, &SET_COOKIE).as_deref(), Some("PHPSESSID=abc"));
    }

    #[test]
    fn single_folded_header_is_split() {
        let map = headers(&["a=1; path=/, b=2; path=/"]);
        assert_eq!(last_cookie(&map, &SET_COOKIE).as_deref(), Some("b=2"));
    }
}
