use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use super::canonical::{CanonicalValue, ATTRIBUTES_KEY, TEXT_KEY};
use super::parse::Element;

/// Fold an element tree into a [`CanonicalValue`].
///
/// - attributes go under `@attributes`, values untouched
/// - an element with only non-blank text becomes that trimmed text
/// - text next to attributes or children goes under `#text`
/// - children are keyed by tag; repeated tags become a sequence in document order
/// - an element with none of the above is [`CanonicalValue::Empty`]
///
/// Unlike a bare text short-circuit, a leaf carrying attributes keeps them:
/// `<a id="1">x</a>` yields `{"@attributes": {"id": "1"}, "#text": "x"}`.
#[must_use]
pub fn normalize(element: &Element) -> CanonicalValue {
    let text = element.trimmed_text();
    if let Some(text) = text {
        if element.attributes.is_empty() && element.children.is_empty() {
            return CanonicalValue::Text(text.to_string());
        }
    }

    let mut result: FxHashMap<String, CanonicalValue> = FxHashMap::default();

    if !element.attributes.is_empty() {
        let attributes = element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), CanonicalValue::Text(value.clone())))
            .collect();
        result.insert(ATTRIBUTES_KEY.to_string(), CanonicalValue::Mapping(attributes));
    }

    if let Some(text) = text {
        result.insert(TEXT_KEY.to_string(), CanonicalValue::Text(text.to_string()));
    }

    for child in &element.children {
        merge_child(&mut result, &child.name, normalize(child));
    }

    if result.is_empty() {
        CanonicalValue::Empty
    } else {
        CanonicalValue::Mapping(result)
    }
}

/// Normalize a document root. A root that reduces to plain text is marked
/// [`CanonicalValue::RawText`]; an empty root stays the explicit empty marker.
#[must_use]
pub fn normalize_document(root: &Element) -> CanonicalValue {
    match normalize(root) {
        CanonicalValue::Text(text) => CanonicalValue::RawText(text),
        other => other,
    }
}

fn merge_child(result: &mut FxHashMap<String, CanonicalValue>, tag: &str, value: CanonicalValue) {
    match result.entry(tag.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            CanonicalValue::Sequence(items) => items.push(value),
            existing => {
                let prior = std::mem::replace(existing, CanonicalValue::Empty);
                *existing = CanonicalValue::Sequence(vec![prior, value]);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn norm(xml: &str) -> CanonicalValue {
        normalize(&parse_document(xml).unwrap())
    }

    #[test]
    fn test_leaf_text_short_circuits() {
        assert_eq!(norm("<a>Hello</a>"), CanonicalValue::text("Hello"));
        assert_eq!(norm("<a>  padded \n</a>"), CanonicalValue::text("padded"));
    }

    #[test]
    fn test_attributes_only() {
        assert_eq!(
            norm(r#"<a id="1"/>"#),
            CanonicalValue::mapping([(
                "@attributes",
                CanonicalValue::mapping([("id", CanonicalValue::text("1"))]),
            )])
        );
    }

    #[test]
    fn test_leaf_with_attributes_keeps_both() {
        assert_eq!(
            norm(r#"<a id="1">x</a>"#),
            CanonicalValue::mapping([
                (
                    "@attributes",
                    CanonicalValue::mapping([("id", CanonicalValue::text("1"))]),
                ),
                ("#text", CanonicalValue::text("x")),
            ])
        );
    }

    #[test]
    fn test_repeated_tags_become_sequence() {
        assert_eq!(
            norm("<r><c>1</c><c>2</c><c>3</c></r>"),
            CanonicalValue::mapping([(
                "c",
                CanonicalValue::Sequence(vec![
                    CanonicalValue::text("1"),
                    CanonicalValue::text("2"),
                    CanonicalValue::text("3"),
                ]),
            )])
        );
    }

    #[test]
    fn test_single_child_is_not_wrapped() {
        let value = norm("<r><c>1</c><d/></r>");
        assert_eq!(value.get("c"), Some(&CanonicalValue::text("1")));
        assert_eq!(value.get("d"), Some(&CanonicalValue::Empty));
    }

    #[test]
    fn test_interleaved_repeats_keep_order_per_tag() {
        let value = norm("<r><c>1</c><d>x</d><c>2</c></r>");
        assert_eq!(
            value.get("c").and_then(CanonicalValue::as_sequence),
            Some(&[CanonicalValue::text("1"), CanonicalValue::text("2")][..])
        );
        assert_eq!(value.get("d"), Some(&CanonicalValue::text("x")));
    }

    #[test]
    fn test_mixed_text_and_children() {
        let value = norm("<p>intro<b>bold</b></p>");
        assert_eq!(value.get("#text"), Some(&CanonicalValue::text("intro")));
        assert_eq!(value.get("b"), Some(&CanonicalValue::text("bold")));
    }

    #[test]
    fn test_empty_and_whitespace_elements() {
        assert_eq!(norm("<e/>"), CanonicalValue::Empty);
        assert_eq!(norm("<e></e>"), CanonicalValue::Empty);
        assert_eq!(norm("<a>   </a>"), norm("<a/>"));
    }

    #[test]
    fn test_whitespace_text_with_children_is_ignored() {
        let value = norm("<r>\n  <c>1</c>\n</r>");
        assert!(value.get("#text").is_none());
    }

    #[test]
    fn test_document_wrapping() {
        let root = parse_document("<a>Hello</a>").unwrap();
        assert_eq!(normalize_document(&root), CanonicalValue::RawText("Hello".into()));

        let root = parse_document("<a/>").unwrap();
        assert!(normalize_document(&root).is_empty_marker());

        let root = parse_document("<a><b>1</b></a>").unwrap();
        assert_eq!(normalize_document(&root), normalize(&root));
    }

    #[test]
    fn test_normalize_on_built_tree() {
        let tree = Element::new("root")
            .with_attribute("lang", "en")
            .with_child(Element::new("x").with_text("1"))
            .with_child(Element::new("x"));
        let value = normalize(&tree);
        assert_eq!(
            value.get("x"),
            Some(&CanonicalValue::Sequence(vec![
                CanonicalValue::text("1"),
                CanonicalValue::Empty
            ]))
        );
        assert!(value.get("@attributes").is_some());
    }
}
