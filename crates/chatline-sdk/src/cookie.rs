//! Cookie reading.
//!
//! The chat server hands out its anti-forgery token as a cookie and expects
//! it back with every write. [`cookie`] reads one value out of a
//! `Cookie`-style header; [`CookieJar`] keeps the whole cookie string the
//! client presents and merges `Set-Cookie` answers into it.

/// Return the decoded value of cookie `name` in `header`, if present.
///
/// `header` is a `Cookie` header value such as `"user=ada; _xsrf=2%7Cab"`.
/// Values are percent-decoded; a value that does not decode is returned as
/// is. The first occurrence wins.
///
/// ```
/// use chatline_sdk::cookie;
///
/// assert_eq!(cookie("a=1; _xsrf=x%7Cy", "_xsrf").as_deref(), Some("x|y"));
/// assert_eq!(cookie("a=1", "_xsrf"), None);
/// ```
pub fn cookie(header: &str, name: &str) -> Option<String> {
    pairs(header)
        .find(|(key, _)| *key == name)
        .map(|(_, value)| decode(value))
}

fn pairs(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
}

fn decode(value: &str) -> String {
    let value = value.trim_matches('"');
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// The cookies a client presents to the chat server.
///
/// Values are stored exactly as they travel on the wire and decoded on
/// read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
    csrf_cookie: String,
}

impl CookieJar {
    /// Parse a `Cookie`-style string; `csrf_cookie` names the token cookie.
    pub fn parse(header: &str, csrf_cookie: &str) -> Self {
        let mut jar = Self {
            entries: Vec::new(),
            csrf_cookie: csrf_cookie.to_string(),
        };
        for (key, value) in pairs(header) {
            if jar.get(key).is_none() {
                jar.set(key, value);
            }
        }
        jar
    }

    /// Decoded value of cookie `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| decode(value))
    }

    /// The anti-forgery token, if the server has issued one.
    pub fn csrf_token(&self) -> Option<String> {
        self.get(&self.csrf_cookie)
    }

    /// Insert or replace a cookie (raw, undecoded value).
    pub fn set(&mut self, name: &str, raw_value: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = raw_value.to_string(),
            None => self
                .entries
                .push((name.to_string(), raw_value.to_string())),
        }
    }

    /// Merge one `Set-Cookie` header value (attributes are ignored).
    ///
    /// Returns the name of the cookie that was stored.
    pub fn absorb_set_cookie(&mut self, set_cookie: &str) -> Option<String> {
        let first = set_cookie.split(';').next()?;
        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.set(name, value.trim());
        Some(name.to_string())
    }

    /// The jar rendered as a `Cookie` header value.
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `true` when the jar holds no cookie at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_cookie() {
        assert_eq!(cookie("user=ada; _xsrf=tok", "_xsrf").as_deref(), Some("tok"));
        assert_eq!(cookie("_xsrf=tok", "_xsrf").as_deref(), Some("tok"));
    }

    #[test]
    fn missing_cookie_is_none() {
        assert_eq!(cookie("", "_xsrf"), None);
        assert_eq!(cookie("user=ada", "_xsrf"), None);
    }

    #[test]
    fn name_must_match_exactly() {
        assert_eq!(cookie("my_xsrf=nope; _xsrf=yes", "_xsrf").as_deref(), Some("yes"));
        assert_eq!(cookie("_xsrf_old=nope", "_xsrf"), None);
    }

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(cookie("a=1; a=2", "a").as_deref(), Some("1"));
    }

    #[test]
    fn value_is_percent_decoded_and_unquoted() {
        assert_eq!(cookie("n=%22hi%20there%22", "n").as_deref(), Some("\"hi there\""));
        assert_eq!(cookie("n=\"quoted\"", "n").as_deref(), Some("quoted"));
    }

    #[test]
    fn undecodable_value_is_returned_raw() {
        assert_eq!(cookie("n=%FF%FE", "n").as_deref(), Some("%FF%FE"));
    }

    #[test]
    fn empty_value_is_present() {
        assert_eq!(cookie("n=", "n").as_deref(), Some(""));
    }

    #[test]
    fn jar_absorbs_set_cookie() {
        let mut jar = CookieJar::parse("user=ada", "_xsrf");
        assert_eq!(jar.csrf_token(), None);

        let name = jar.absorb_set_cookie("_xsrf=2|abc|1700000000; expires=Thu, 01 Jan 2099; Path=/");
        assert_eq!(name.as_deref(), Some("_xsrf"));
        assert_eq!(jar.csrf_token().as_deref(), Some("2|abc|1700000000"));
        assert_eq!(jar.header_value(), "user=ada; _xsrf=2|abc|1700000000");
    }

    #[test]
    fn jar_replaces_existing_cookie() {
        let mut jar = CookieJar::parse("_xsrf=old; user=ada", "_xsrf");
        jar.absorb_set_cookie("_xsrf=new");
        assert_eq!(jar.header_value(), "_xsrf=new; user=ada");
    }

    #[test]
    fn jar_ignores_garbage_set_cookie() {
        let mut jar = CookieJar::default();
        assert_eq!(jar.absorb_set_cookie("no-equals-sign"), None);
        assert_eq!(jar.absorb_set_cookie("=value"), None);
        assert!(jar.is_empty());
    }
}
