// crates/xenospec-template/src/ports.rs
// ============================================================================
// Module: XenoSpec Template Ports
// Description: Parses `_ports_:` typed connection-point declarations and
// records bindings made at instantiation time.
// Purpose: Implements spec.md §4.6's port wiring.
// Dependencies: xenospec-yaml
// ============================================================================

//! ## Overview
//! A port is declared as `path: type.direction`, where `direction` is
//! `in` or `out`. When an instantiation site's overrides contain a key
//! matching a declared port's path, its value (a dotted path to a producer
//! element) becomes a [`PortBinding`] — "recorded as a reference field on
//! the consuming reaction/molecule" (spec.md §4.6).

use indexmap::IndexMap;

use crate::error::TemplateError;

/// A port's declared flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The port consumes a value produced elsewhere.
    In,
    /// The port produces a value for another port to consume.
    Out,
}

/// One `_ports_:` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDecl {
    /// The port's dotted path within its owning element.
    pub path: String,
    /// The port's declared value type (opaque to this crate; interpreted
    /// by the consumer that reads bound values).
    pub port_type: String,
    /// The port's flow direction.
    pub direction: Direction,
}

/// A binding from a consuming port to the dotted path of its producer.
#[derive(Debug, Clone, PartialEq)]
pub struct PortBinding {
    /// The consuming port's declared path.
    pub port_path: String,
    /// The dotted path of the element producing this port's value.
    pub producer_path: String,
}

/// Parses a `_ports_:` mapping's `path: type.direction` entries.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidPort`] if an entry's value is not a
/// string of the form `type.direction` with `direction` being `in` or
/// `out`.
pub fn parse_ports(ports_node: &xenospec_yaml::Node) -> Result<Vec<PortDecl>, TemplateError> {
    let Some(mapping) = ports_node.as_mapping() else {
        return Ok(Vec::new());
    };
    let mut decls = Vec::with_capacity(mapping.len());
    for (path, value) in mapping {
        let declared = value.as_str().ok_or_else(|| TemplateError::InvalidPort {
            path: path.clone(),
            value: "expected a string of the form `type.direction`".to_owned(),
        })?;
        let Some((port_type, direction)) = declared.rsplit_once('.') else {
            return Err(TemplateError::InvalidPort {
                path: path.clone(),
                value: declared.to_owned(),
            });
        };
        let direction = match direction {
            "in" => Direction::In,
            "out" => Direction::Out,
            other => {
                return Err(TemplateError::InvalidPort {
                    path: path.clone(),
                    value: other.to_owned(),
                })
            }
        };
        decls.push(PortDecl {
            path: path.clone(),
            port_type: port_type.to_owned(),
            direction,
        });
    }
    Ok(decls)
}

/// Matches instantiation-site overrides against declared ports, producing
/// the bindings whose keys named a declared port path.
///
/// Overrides are given as raw source text (a dotted producer path) rather
/// than an [`xenospec_eval::EvalValue`], since a port binding is itself a
/// structural reference, not a data value.
#[must_use]
pub fn bind_ports(ports: &[PortDecl], overrides: &IndexMap<String, String>) -> Vec<PortBinding> {
    let declared: std::collections::BTreeSet<&str> =
        ports.iter().map(|p| p.path.as_str()).collect();
    overrides
        .iter()
        .filter(|(path, _)| declared.contains(path.as_str()))
        .map(|(path, producer)| PortBinding {
            port_path: path.clone(),
            producer_path: producer.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    #[test]
    fn parses_in_and_out_ports() {
        let node = load_str(
            "inlet: concentration.in\noutlet: rate.out\n",
            SourceId::from("<test>"),
        )
        .expect("load");
        let decls = parse_ports(&node).expect("parse");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].port_type, "concentration");
        assert_eq!(decls[0].direction, Direction::In);
        assert_eq!(decls[1].direction, Direction::Out);
    }

    #[test]
    fn rejects_an_unknown_direction() {
        let node = load_str("inlet: concentration.sideways\n", SourceId::from("<test>"))
            .expect("load");
        let err = parse_ports(&node).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPort { .. }));
    }

    #[test]
    fn binds_overrides_matching_declared_ports() {
        let ports = vec![PortDecl {
            path: "inlet".into(),
            port_type: "concentration".into(),
            direction: Direction::In,
        }];
        let mut overrides = IndexMap::new();
        overrides.insert("inlet".to_owned(), "upstream.outlet".to_owned());
        overrides.insert("unrelated".to_owned(), "foo.bar".to_owned());
        let bindings = bind_ports(&ports, &overrides);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].producer_path, "upstream.outlet");
    }
}
