use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Deepest element nesting accepted by [`parse_document`]; the root is depth 1.
pub const MAX_DEPTH: usize = 512;

/// A parsed XML element. Built once from a response body, consumed by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name exactly as written (`ops:world-patent-data`).
    pub name: String,
    /// Attributes in document order; namespace declarations are excluded.
    pub attributes: Vec<(String, String)>,
    /// Text preceding the first child element, entity-unescaped, CDATA included.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Direct text with surrounding whitespace removed, or `None` when blank.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    fn push_text(&mut self, text: &str) {
        // Tail text after a child belongs to that child in the tree model; drop it.
        if self.children.is_empty() {
            self.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

/// Error raised when a body cannot be turned into an element tree.
#[derive(Debug, thiserror::Error)]
pub enum XmlParseError {
    #[error("XML syntax error {0}")]
    Syntax(String),
    #[error("invalid UTF-8 in {0}")]
    Utf8(&'static str),
    #[error("unclosed element(s): <{0}>")]
    Unclosed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("content after the document element {0}")]
    TrailingContent(String),
    #[error("elements nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Parse a complete XML document into its root [`Element`].
///
/// Comments, processing instructions and the DOCTYPE are skipped.
///
/// # Errors
///
/// Returns [`XmlParseError`] for malformed markup, mismatched or unclosed
/// tags, a missing root, anything other than whitespace after the root, or
/// nesting deeper than [`MAX_DEPTH`].
pub fn parse_document(xml: &str) -> Result<Element, XmlParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|err| {
            XmlParseError::Syntax(format!("at byte {}: {err}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(ref start) => {
                if root.is_some() {
                    return Err(trailing_content(&reader));
                }
                check_depth(&stack)?;
                stack.push(start_element(start)?);
            }
            Event::Empty(ref start) => {
                if root.is_some() {
                    return Err(trailing_content(&reader));
                }
                check_depth(&stack)?;
                let element = start_element(start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(XmlParseError::Syntax(format!(
                        "at byte {}: unexpected closing tag",
                        reader.buffer_position()
                    )));
                };
                attach(&mut stack, &mut root, element);
            }
            Event::Text(ref text) => {
                let text = text.unescape().map_err(|err| {
                    XmlParseError::Syntax(format!("at byte {}: {err}", reader.buffer_position()))
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(&text),
                    None if is_blank(&text) => {}
                    None => return Err(trailing_content(&reader)),
                }
            }
            Event::CData(ref cdata) => {
                let text =
                    std::str::from_utf8(&**cdata).map_err(|_| XmlParseError::Utf8("CDATA"))?;
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text),
                    None => return Err(trailing_content(&reader)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        let unclosed: Vec<&str> = stack.iter().map(|el| el.name.as_str()).collect();
        return Err(XmlParseError::Unclosed(unclosed.join(">, <")));
    }

    root.ok_or(XmlParseError::NoRoot)
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, XmlParseError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|_| XmlParseError::Utf8("element name"))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlParseError::Syntax(format!("in attribute: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| XmlParseError::Utf8("attribute name"))?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| XmlParseError::Syntax(format!("in attribute '{key}': {err}")))?;
        attributes.push((key.to_string(), value.into_owned()));
    }

    Ok(Element {
        name,
        attributes,
        text: None,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

#[inline]
fn check_depth(stack: &[Element]) -> Result<(), XmlParseError> {
    if stack.len() >= MAX_DEPTH {
        return Err(XmlParseError::TooDeep(MAX_DEPTH));
    }
    Ok(())
}

fn trailing_content(reader: &Reader<&[u8]>) -> XmlParseError {
    XmlParseError::TrailingContent(format!("at byte {}", reader.buffer_position()))
}

#[inline]
fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}
