use ::bytes::Bytes;
use ::bytesize::ByteSize;
use ::mime::Mime;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

/// An arbituary limit to avoid printing gigabytes to the terminal.
const MAX_TEXT_PRINT_LEN: usize = 10_000;

/// Renders a response body for humans reading a failed test.
#[derive(Debug)]
pub struct DebugResponseBody<'a> {
    pub content_type: Option<&'a str>,
    pub body: &'a Bytes,
}

impl Display for DebugResponseBody<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let maybe_mime = self
            .content_type
            .and_then(|content_type| content_type.parse::<Mime>().ok());

        let Some(mime) = maybe_mime else {
            return write_text(f, &String::from_utf8_lossy(self.body));
        };

        let (type_, subtype) = (mime.type_(), mime.subtype());
        let len = ByteSize(self.body.len() as u64);

        if subtype == mime::JSON && (type_ == mime::APPLICATION || type_ == mime::TEXT) {
            write_json(f, self.body)
        } else if type_ == mime::TEXT || subtype == mime::WWW_FORM_URLENCODED {
            write_text(f, &String::from_utf8_lossy(self.body))
        } else if type_ == mime::APPLICATION && subtype == mime::OCTET_STREAM {
            write!(f, "<Bytes, with len {len}>")
        } else {
            write!(f, "<Unknown content type {mime}, with len {len}>")
        }
    }
}

fn write_text(f: &mut Formatter<'_>, text: &str) -> FmtResult {
    if text.chars().count() <= MAX_TEXT_PRINT_LEN {
        return write!(f, "'{text}'");
    }

    write!(f, "'")?;
    for c in text.chars().take(MAX_TEXT_PRINT_LEN) {
        write!(f, "{c}")?;
    }
    write!(f, "...'")
}

fn write_json(f: &mut Formatter<'_>, body: &Bytes) -> FmtResult {
    let pretty = ::serde_json::from_slice::<::serde_json::Value>(body)
        .ok()
        .and_then(|value| ::serde_json::to_string_pretty(&value).ok());

    match pretty {
        Some(pretty_raw) => write!(f, "{pretty_raw}"),
        None => {
            write!(f, "!!! YOUR JSON IS MALFORMED !!!\nBody: ")?;
            write_text(f, &String::from_utf8_lossy(body))
        }
    }
}
