use ::bytes::Bytes;
use ::http::HeaderValue;
use ::serde::Serialize;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::url::form_urlencoded;

use crate::HtestError;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Form fields, where setting a key again replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormParamsStore {
    fields: Vec<(String, String)>,
}

impl FormParamsStore {
    pub fn set(&mut self, key: String, value: String) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.fields.push((key, value)),
        }
    }
}

impl Display for FormParamsStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut sorted: Vec<&(String, String)> = self.fields.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(sorted)
            .finish();

        write!(f, "{encoded}")
    }
}

/// The body being built for a request.
///
/// A body is either a form, or JSON, never both.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(FormParamsStore),
    Json(Bytes),
}

impl RequestBody {
    /// Adds a form field, replacing any earlier value for the same key.
    pub fn set_form_field(&mut self, key: String, value: String) -> Result<(), HtestError> {
        match self {
            Self::Empty => {
                let mut fields = FormParamsStore::default();
                fields.set(key, value);
                *self = Self::Form(fields);
            }
            Self::Form(fields) => fields.set(key, value),
            Self::Json(_) => {
                return Err(HtestError::configuration(format!(
                    "content-type should be empty or '{FORM_CONTENT_TYPE}', can't mix .form(...) with .body_json(...)"
                )));
            }
        }

        Ok(())
    }

    /// Serializes `value` as the JSON body.
    ///
    /// This fails if a content type is already in play,
    /// either from an explicit header or from an earlier body.
    pub fn set_json<J>(
        &mut self,
        value: &J,
        explicit_content_type: Option<&HeaderValue>,
    ) -> Result<(), HtestError>
    where
        J: ?Sized + Serialize,
    {
        if let Some(content_type) = self.content_type() {
            return Err(HtestError::configuration(format!(
                "content-type is already set to '{content_type}', can't mix .body_json(...) with another body"
            )));
        }

        if let Some(content_type) = explicit_content_type.filter(|value| !value.is_empty()) {
            return Err(HtestError::configuration(format!(
                "content-type header is already set to {content_type:?}, .body_json(...) expects it to be empty"
            )));
        }

        let body_bytes =
            ::serde_json::to_vec(value).map_err(|source| HtestError::Serialization {
                message: "Failed to serialize request body to JSON".to_string(),
                source,
            })?;

        *self = Self::Json(body_bytes.into());
        Ok(())
    }

    /// The content type this body would send, if none is set explicitly.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Form(_) => Some(FORM_CONTENT_TYPE),
            Self::Json(_) => Some(JSON_CONTENT_TYPE),
        }
    }

    /// Encodes the body, returning the bytes and default content type.
    /// `None` when no body was set.
    pub fn finish(self) -> Option<(Bytes, &'static str)> {
        match self {
            Self::Empty => None,
            Self::Form(fields) => Some((Bytes::from(fields.to_string()), FORM_CONTENT_TYPE)),
            Self::Json(bytes) => Some((bytes, JSON_CONTENT_TYPE)),
        }
    }
}


#[cfg(test)]
mod test_set_json {
    use super::*;
    use ::pretty_assertions::assert_eq;
    use ::std::collections::BTreeMap;

    #[test]
    fn it_should_serialize_json() {
        let value = BTreeMap::from([("hello", 1), ("world", 2)]);
        let mut body = RequestBody::default();
        body.set_json(&value, None).unwrap();

        let (bytes, content_type) = body.finish().unwrap();

        assert_eq!(bytes, Bytes::from(r#"{"hello":1,"world":2}"#));
        assert_eq!(content_type, JSON_CONTENT_TYPE);
    }

    #[test]
    fn it_should_reject_json_after_form() {
        let mut body = RequestBody::default();
        body.set_form_field("k".to_string(), "v".to_string()).unwrap();

        let result = body.set_json(&"hello", None);

        assert!(matches!(result, Err(HtestError::Configuration(_))));
    }

    #[test]
    fn it_should_reject_json_set_twice() {
        let mut body = RequestBody::default();
        body.set_json(&"first", None).unwrap();

        let result = body.set_json(&"second", None);

        assert!(matches!(result, Err(HtestError::Configuration(_))));
    }

    #[test]
    fn it_should_reject_json_after_explicit_content_type() {
        let mut body = RequestBody::default();
        let content_type = HeaderValue::from_static("text/plain");

        let result = body.set_json(&"hello", Some(&content_type));

        assert!(matches!(result, Err(HtestError::Configuration(_))));
    }

    #[test]
    fn it_should_allow_json_after_empty_content_type() {
        let mut body = RequestBody::default();
        let content_type = HeaderValue::from_static("");

        let result = body.set_json(&"hello", Some(&content_type));

        assert!(result.is_ok());
    }

    #[test]
    fn it_should_fail_on_unserializable_values() {
        // JSON object keys must be strings.
        let value = BTreeMap::from([(vec![1], "a")]);
        let mut body = RequestBody::default();

        let result = body.set_json(&value, None);

        assert!(matches!(result, Err(HtestError::Serialization { .. })));
    }

    #[test]
    fn it_should_return_nothing_when_empty() {
        assert!(RequestBody::default().finish().is_none());
    }
}
