// crates/xenospec-yaml/src/node.rs
// ============================================================================
// Module: XenoSpec Node Tree
// Description: The recursively-typed, source-spanned value produced by the
// YAML loader: scalar, ordered mapping, sequence, or tagged value.
// Purpose: Single representation shared by the resolver, scope graph,
// hydrator, and template expander.
// Dependencies: indexmap, serde
// ============================================================================

//! ## Overview
//! [`Node`] is XenoSpec's one recursively-typed document value. Every node
//! carries the [`SourceSpan`] it was parsed from, so diagnostics anywhere
//! downstream can still point at the original YAML text.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use xenospec_core::SourceSpan;

/// Insertion-order-preserving mapping, as required by template expansion
/// ordering (spec.md §4.1).
pub type Mapping = IndexMap<String, Node>;

/// A leaf scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// YAML `null` / `~`.
    Null,
    /// YAML boolean.
    Bool(bool),
    /// YAML integer.
    Int(i64),
    /// YAML floating point.
    Float(f64),
    /// YAML string (quoted or bare).
    String(String),
}

/// One of the four tag value variants named in spec.md §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// `!include path` — structural; replaced by the parsed content of an
    /// external file.
    Include(String),
    /// `!ref dotted.name` — structural; replaced by a deep copy of the
    /// referenced subtree.
    Reference(String),
    /// `!ev "expression"` — deferred; evaluated lazily under a scope at
    /// materialization time.
    Evaluable(String),
    /// `!_ "expression"` — opaque; preserved verbatim, meaningful only to a
    /// downstream consumer.
    Quoted(String),
}

impl TagValue {
    /// Returns `true` if this tag is [`TagValue::Quoted`].
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        matches!(self, TagValue::Quoted(_))
    }

    /// Returns the tag's inner source text, regardless of variant.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            TagValue::Include(s)
            | TagValue::Reference(s)
            | TagValue::Evaluable(s)
            | TagValue::Quoted(s) => s,
        }
    }
}

/// The payload of a [`Node`], without its span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeValue {
    /// A leaf scalar.
    Scalar(Scalar),
    /// An ordered mapping of string keys to child nodes.
    Mapping(Mapping),
    /// An ordered sequence of child nodes.
    Sequence(Vec<Node>),
    /// A tagged value: `!include`, `!ref`, `!ev`, or `!_`.
    Tag(Box<TagValue>),
}

/// A document value together with the source location it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The node's payload.
    pub value: NodeValue,
    /// Where in the source document this node came from.
    pub span: SourceSpan,
}

impl Node {
    /// Builds a node from a value and its span.
    #[must_use]
    pub fn new(value: NodeValue, span: SourceSpan) -> Self {
        Self { value, span }
    }

    /// Builds a null scalar node.
    #[must_use]
    pub fn null(span: SourceSpan) -> Self {
        Self::new(NodeValue::Scalar(Scalar::Null), span)
    }

    /// Returns this node as a mapping, if it is one.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.value {
            NodeValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Returns this node as a sequence, if it is one.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this node as a scalar string, if it is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns this node's tag, if it is a tagged value.
    #[must_use]
    pub fn as_tag(&self) -> Option<&TagValue> {
        match &self.value {
            NodeValue::Tag(t) => Some(t),
            _ => None,
        }
    }

    /// Returns `true` if this node (or any node it structurally contains)
    /// still carries an `Include` or `Reference` tag. Used to check
    /// invariant 1 from spec.md §3: resolution produces a tree with no
    /// `Include`/`Reference` nodes remaining.
    #[must_use]
    pub fn contains_structural_tag(&self) -> bool {
        match &self.value {
            NodeValue::Tag(t) => matches!(**t, TagValue::Include(_) | TagValue::Reference(_)),
            NodeValue::Mapping(m) => m.values().any(Node::contains_structural_tag),
            NodeValue::Sequence(s) => s.iter().any(Node::contains_structural_tag),
            NodeValue::Scalar(_) => false,
        }
    }

    /// Looks up a single mapping key on this node, returning `None` if this
    /// node is not a mapping or the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xenospec_core::SourceId;

    fn span() -> SourceSpan {
        SourceSpan::unknown(SourceId::from("<test>"))
    }

    #[test]
    fn detects_structural_tags_nested_in_a_sequence() {
        let inner = Node::new(
            NodeValue::Tag(Box::new(TagValue::Include("other.yaml".into()))),
            span(),
        );
        let seq = Node::new(NodeValue::Sequence(vec![inner]), span());
        assert!(seq.contains_structural_tag());
    }

    #[test]
    fn evaluable_and_quoted_are_not_structural() {
        let ev = Node::new(
            NodeValue::Tag(Box::new(TagValue::Evaluable("1 + 1".into()))),
            span(),
        );
        assert!(!ev.contains_structural_tag());
    }

    #[test]
    fn quoted_tag_reports_is_quoted() {
        let tag = TagValue::Quoted("rate(x)".into());
        assert!(tag.is_quoted());
        assert_eq!(tag.source(), "rate(x)");
    }
}
