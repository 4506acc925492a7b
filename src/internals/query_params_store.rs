use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::url::form_urlencoded;

use crate::HtestError;

/// An ordered multimap of query parameters.
///
/// The same key may appear many times, and every pair is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParamsStore {
    query_params: Vec<(String, String)>,
}

impl QueryParamsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string, such as `a=1&b=2&a=3`.
    ///
    /// Fails on invalid percent escapes, and on `;` separators.
    pub fn parse(raw_query: &str) -> Result<Self, String> {
        validate_raw_query(raw_query)?;

        let query_params = form_urlencoded::parse(raw_query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Ok(Self { query_params })
    }

    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params.push((key.into(), value.into()));
    }

    pub fn extend(&mut self, other: &QueryParamsStore) {
        self.query_params.extend(other.query_params.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.query_params.is_empty()
    }

    pub fn has_content(&self) -> bool {
        !self.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query_params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Encodes as `application/x-www-form-urlencoded`,
/// with keys sorted and repeated keys kept in the order they were added.
impl Display for QueryParamsStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut sorted: Vec<(&str, &str)> = self.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(sorted)
            .finish();

        write!(f, "{encoded}")
    }
}

/// Merges the query already on `path` with `query_params`.
///
/// When there are no extra params the path is returned untouched.
/// Otherwise the result is `<path>?<query>`, holding every pair from both.
///
/// Fragments are never sent, so a path holding one is rejected.
pub fn compose_request_path(
    path: &str,
    query_params: &QueryParamsStore,
) -> Result<String, HtestError> {
    if path.contains('#') {
        return Err(HtestError::parse(path, "request path must not contain a fragment"));
    }

    if !query_params.has_content() {
        return Ok(path.to_string());
    }

    let (base_path, raw_query) = match path.split_once('?') {
        Some((base_path, raw_query)) => (base_path, raw_query),
        None => (path, ""),
    };

    let mut combined =
        QueryParamsStore::parse(raw_query).map_err(|message| HtestError::parse(path, message))?;
    combined.extend(query_params);

    Ok(format!("{base_path}?{combined}"))
}

fn validate_raw_query(raw_query: &str) -> Result<(), String> {
    if raw_query.contains(';') {
        return Err(format!("invalid semicolon separator in query '{raw_query}'"));
    }

    let bytes = raw_query.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let is_valid_escape = bytes
                .get(i + 1..i + 3)
                .map(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);

            if !is_valid_escape {
                let escape: String = raw_query[i..].chars().take(3).collect();
                return Err(format!("invalid URL escape '{escape}'"));
            }

            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(())
}


#[cfg(test)]
mod test_fmt {
    use super::*;
    use ::pretty_assertions::assert_eq;

    #[test]
    fn it_should_sort_keys_and_keep_value_order() {
        let mut params = QueryParamsStore::new();
        params.add("b", "3");
        params.add("a", "2");
        params.add("a", "1");

        assert_eq!(params.to_string(), "a=2&a=1&b=3");
    }

    #[test]
    fn it_should_percent_encode_values() {
        let mut params = QueryParamsStore::new();
        params.add("key", "value&another=value");
        params.add("space", "a b");

        assert_eq!(
            params.to_string(),
            "key=value%26another%3Dvalue&space=a+b"
        );
    }

    #[test]
    fn it_should_encode_tilde_and_keep_asterisk_like_html_forms() {
        let mut params = QueryParamsStore::new();
        params.add("path", "~home*");

        assert_eq!(params.to_string(), "path=%7Ehome*");
    }
}

#[cfg(test)]
mod test_compose_request_path {
    use super::*;
    use ::pretty_assertions::assert_eq;

    #[test]
    fn it_should_return_path_unchanged_without_params() {
        let params = QueryParamsStore::new();

        // Not even parsed, so a bad query is left alone.
        let path = compose_request_path("/test?z=1&a=%zz", &params).unwrap();

        assert_eq!(path, "/test?z=1&a=%zz");
    }

    #[test]
    fn it_should_append_params_to_a_bare_path() {
        let mut params = QueryParamsStore::new();
        params.add("q", "v");

        let path = compose_request_path("/test", &params).unwrap();

        assert_eq!(path, "/test?q=v");
    }

    #[test]
    fn it_should_merge_with_existing_query_without_losing_pairs() {
        let mut params = QueryParamsStore::new();
        params.add("a", "2");
        params.add("b", "3");

        let path = compose_request_path("/test?a=1", &params).unwrap();

        assert_eq!(path, "/test?a=1&a=2&b=3");
    }

    #[test]
    fn it_should_keep_repeated_explicit_params() {
        let mut params = QueryParamsStore::new();
        params.add("tag", "red");
        params.add("tag", "red");

        let path = compose_request_path("/items?tag=blue", &params).unwrap();

        assert_eq!(path, "/items?tag=blue&tag=red&tag=red");
    }

    #[test]
    fn it_should_reject_a_fragment_instead_of_dropping_params() {
        let mut params = QueryParamsStore::new();
        params.add("q", "v");

        let result = compose_request_path("/test#frag", &params);

        match result {
            Err(HtestError::Parse { path, message }) => {
                assert_eq!(path, "/test#frag");
                assert_eq!(message, "request path must not contain a fragment");
            }
            other => panic!("expected parse error, received {other:?}"),
        }
    }

    #[test]
    fn it_should_fail_on_malformed_existing_query() {
        let mut params = QueryParamsStore::new();
        params.add("a", "2");

        let result = compose_request_path("/test?a=%zz", &params);

        match result {
            Err(HtestError::Parse { path, message }) => {
                assert_eq!(path, "/test?a=%zz");
                assert_eq!(message, "invalid URL escape '%zz'");
            }
            other => panic!("expected parse error, received {other:?}"),
        }
    }
}
