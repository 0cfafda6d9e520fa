use crate::xml::{normalize_document, parse_document, CanonicalValue};

/// Key wrapping an XML body that failed to parse.
pub const RAW_XML_KEY: &str = "raw_xml";
/// Key wrapping any non-XML body.
pub const RAW_CONTENT_KEY: &str = "raw_content";

const XML_MEDIA_TYPE: &str = "application/xml";

/// Decode a response body according to its declared content type.
///
/// XML bodies are parsed and normalized; a body that claims to be XML but does
/// not parse is passed through under `raw_xml`. Anything else is passed through
/// under `raw_content`.
#[must_use]
pub fn decode(body: &str, content_type: Option<&str>) -> CanonicalValue {
    if !is_xml_content_type(content_type) {
        return passthrough(RAW_CONTENT_KEY, body);
    }

    match parse_document(body) {
        Ok(root) => normalize_document(&root),
        Err(err) => {
            tracing::debug!(error = %err, "XML response did not parse, passing through raw body");
            passthrough(RAW_XML_KEY, body)
        }
    }
}

#[inline]
fn is_xml_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(str::trim_start)
        .and_then(|value| value.get(..XML_MEDIA_TYPE.len()))
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(XML_MEDIA_TYPE))
}

fn passthrough(key: &str, body: &str) -> CanonicalValue {
    CanonicalValue::mapping([(key, CanonicalValue::text(body))])
}
