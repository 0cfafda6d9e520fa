//! Schema-agnostic XML handling: a `quick-xml` tree builder and the
//! normalizer that folds any element tree into a [`CanonicalValue`].

pub mod canonical;
pub mod normalize;
pub mod parse;

pub use canonical::CanonicalValue;
pub use normalize::{normalize, normalize_document};
pub use parse::{parse_document, Element, XmlParseError, MAX_DEPTH};
