// crates/xenospec-yaml/src/loader.rs
// ============================================================================
// Module: XenoSpec YAML Loader
// Description: Parses YAML text into a `Node` tree, recognizing the four
// structural/deferred/quoted tags.
// Purpose: Single entry point turning scenario source text into the tree the
// rest of the pipeline consumes.
// Dependencies: serde_yaml, indexmap, thiserror
// ============================================================================

//! ## Overview
//! [`load_str`] and [`load_file`] are the only two ways a [`Node`] tree gets
//! created. Both recognize `!include`, `!ref`, `!ev`, and `!_`; any other tag
//! fails to load with a source-located [`LoadError::UnknownTag`].

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;
use xenospec_core::SourceId;
use xenospec_core::SourceSpan;

use crate::node::Mapping;
use crate::node::Node;
use crate::node::NodeValue;
use crate::node::Scalar;
use crate::node::TagValue;

/// Errors raised while loading YAML text into a [`Node`] tree.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The underlying YAML text failed to parse.
    #[error("failed to parse yaml in {source}: {message}")]
    Syntax {
        /// Document the error occurred in.
        source: SourceId,
        /// Parser-reported message.
        message: String,
    },
    /// A YAML tag other than `!include`, `!ref`, `!ev`, `!_` was used.
    #[error("unknown tag `{tag}` at {span}")]
    UnknownTag {
        /// The offending tag text, including its leading `!`.
        tag: String,
        /// Where the tag appeared.
        span: SourceSpan,
    },
    /// A mapping used a non-string key, which XenoSpec documents do not
    /// support.
    #[error("non-string mapping key at {span}")]
    NonStringKey {
        /// Where the offending key appeared.
        span: SourceSpan,
    },
    /// The file at the given path could not be read.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Parses YAML source text into a [`Node`] tree.
///
/// `origin` names the document for diagnostics; it need not be a real
/// filesystem path (`load_str` is also used for inline/DAT-embedded text).
///
/// # Errors
///
/// Returns [`LoadError::Syntax`] on malformed YAML, [`LoadError::UnknownTag`]
/// on any tag other than the four recognized ones, and
/// [`LoadError::NonStringKey`] if a mapping uses a non-string key.
pub fn load_str(src: &str, origin: SourceId) -> Result<Node, LoadError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(src).map_err(|err| LoadError::Syntax {
            source: origin.clone(),
            message: err.to_string(),
        })?;
    convert(&value, &origin)
}

/// Loads and parses the YAML file at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise the same
/// errors as [`load_str`].
pub fn load_file(path: &Path) -> Result<Node, LoadError> {
    let text = fs::read_to_string(path).map_err(|err| LoadError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    load_str(&text, SourceId::from(path.display().to_string()))
}

/// Recursively converts a `serde_yaml::Value` into a `Node`, resolving tags.
fn convert(value: &serde_yaml::Value, origin: &SourceId) -> Result<Node, LoadError> {
    let span = SourceSpan::unknown(origin.clone());
    match value {
        serde_yaml::Value::Null => Ok(Node::new(NodeValue::Scalar(Scalar::Null), span)),
        serde_yaml::Value::Bool(b) => Ok(Node::new(NodeValue::Scalar(Scalar::Bool(*b)), span)),
        serde_yaml::Value::Number(n) => Ok(Node::new(NodeValue::Scalar(number_scalar(n)), span)),
        serde_yaml::Value::String(s) => {
            Ok(Node::new(NodeValue::Scalar(Scalar::String(s.clone())), span))
        }
        serde_yaml::Value::Sequence(seq) => {
            let mut items = Vec::with_capacity(seq.len());
            for item in seq {
                items.push(convert(item, origin)?);
            }
            Ok(Node::new(NodeValue::Sequence(items), span))
        }
        serde_yaml::Value::Mapping(map) => {
            let mapping = convert_mapping(map, origin, &span)?;
            Ok(Node::new(NodeValue::Mapping(mapping), span))
        }
        serde_yaml::Value::Tagged(tagged) => convert_tagged(tagged, origin, span),
    }
}

/// Converts a scalar YAML number into the appropriate [`Scalar`] variant.
fn number_scalar(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else {
        Scalar::Float(n.as_f64().unwrap_or_default())
    }
}

/// Converts a YAML mapping, requiring string keys and preserving order.
fn convert_mapping(
    map: &serde_yaml::Mapping,
    origin: &SourceId,
    span: &SourceSpan,
) -> Result<Mapping, LoadError> {
    let mut out: Mapping = IndexMap::with_capacity(map.len());
    for (key, value) in map {
        let key_str = key
            .as_str()
            .ok_or_else(|| LoadError::NonStringKey { span: span.clone() })?;
        out.insert(key_str.to_owned(), convert(value, origin)?);
    }
    Ok(out)
}

/// Converts a tagged YAML value into a [`TagValue`] node, rejecting any tag
/// other than the four recognized ones.
fn convert_tagged(
    tagged: &serde_yaml::value::TaggedValue,
    origin: &SourceId,
    span: SourceSpan,
) -> Result<Node, LoadError> {
    let tag_text = tagged.tag.to_string();
    let name = tag_text.strip_prefix('!').unwrap_or(&tag_text);
    let source_text = tagged_source_text(&tagged.value)?;
    let tag_value = match name {
        "include" => TagValue::Include(source_text),
        "ref" => TagValue::Reference(source_text),
        "ev" => TagValue::Evaluable(source_text),
        "_" => TagValue::Quoted(source_text),
        _ => {
            return Err(LoadError::UnknownTag {
                tag: tag_text,
                span,
            })
        }
    };
    Ok(Node::new(NodeValue::Tag(Box::new(tag_value)), span))
}

/// Extracts the scalar string payload carried by a tagged value. Tags are
/// only meaningful over string payloads in this grammar.
fn tagged_source_text(value: &serde_yaml::Value) -> Result<String, LoadError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => Ok(serde_yaml::to_string(other).unwrap_or_default().trim().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;

    #[test]
    fn loads_a_plain_mapping_preserving_key_order() {
        let node = load_str("b: 1\na: 2\n", SourceId::from("<test>")).expect("load");
        let mapping = node.as_mapping().expect("mapping");
        let keys: Vec<&str> = mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn recognizes_all_four_tags() {
        let node = load_str(
            "include: !include other.yaml\nref: !ref some.name\nev: !ev \"1 + 1\"\nquoted: !_ \"rate(x)\"\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let mapping = node.as_mapping().expect("mapping");
        assert!(matches!(
            mapping["include"].as_tag(),
            Some(TagValue::Include(_))
        ));
        assert!(matches!(
            mapping["ref"].as_tag(),
            Some(TagValue::Reference(_))
        ));
        assert!(matches!(
            mapping["ev"].as_tag(),
            Some(TagValue::Evaluable(_))
        ));
        assert!(matches!(mapping["quoted"].as_tag(), Some(TagValue::Quoted(_))));
    }

    #[test]
    fn rejects_unknown_tags() {
        let err = load_str("x: !bogus value\n", SourceId::from("<test>")).unwrap_err();
        assert!(matches!(err, LoadError::UnknownTag { .. }));
    }
}
