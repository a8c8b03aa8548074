// crates/xenospec-template/src/guard.rs
// ============================================================================
// Module: XenoSpec Template Guards
// Description: Named validators run over expanded content, with
// reject/retry/prune fail modes.
// Purpose: Implements spec.md §4.6's guard system.
// Dependencies: xenospec-core
// ============================================================================

//! ## Overview
//! A [`Guard`] receives already-expanded content and a [`GuardContext`] and
//! either accepts it or raises a [`GuardViolation`]. The fail mode attached
//! to a guard *application* (not the guard itself — the same guard may be
//! applied in `reject` mode at one instantiation site and `retry` at
//! another) governs what the expander does with a violation.

use std::collections::BTreeMap;

use xenospec_core::SourceSpan;

use crate::error::TemplateError;

/// The expanded content and enclosing state a [`Guard`] validates against.
#[derive(Debug, Clone)]
pub struct GuardContext {
    /// The name of the scope the expanded content lives in.
    pub scope_name: String,
    /// The current instantiation namespace (e.g. `"molecule3"`).
    pub namespace: String,
    /// The seed in force for this expansion.
    pub seed: u64,
    /// The retry attempt number, starting at `0`.
    pub attempt: u32,
}

/// A violation a [`Guard`] raises when it rejects expanded content.
#[derive(Debug, Clone)]
pub struct GuardViolation {
    /// A human-readable description of what failed.
    pub message: String,
    /// Where the offending content originated.
    pub span: SourceSpan,
    /// Top-level keys in the expansion the violation applies to — used by
    /// `prune` mode to remove only the offending elements. Empty means the
    /// violation applies to the whole expansion.
    pub offending_keys: Vec<String>,
}

/// A named, registered content validator.
pub trait Guard: Send + Sync {
    /// Validates `content`, returning a violation if it is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardViolation`] describing why `content` was rejected.
    fn check(&self, content: &xenospec_yaml::Node, ctx: &GuardContext) -> Result<(), GuardViolation>;
}

/// How a guard application responds to a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailMode {
    /// Abort the entire build with the violation (the default).
    Reject,
    /// Re-derive the RNG substream and re-expand, up to `max_attempts`
    /// times, with no partial state carried between attempts.
    Retry {
        /// The maximum number of expansion attempts, including the first.
        max_attempts: u32,
    },
    /// Remove the offending elements from the expansion and continue.
    Prune,
}

/// One guard applied at a particular instantiation site, in its configured
/// fail mode.
#[derive(Debug, Clone)]
pub struct GuardApplication {
    /// The registered guard's name.
    pub name: String,
    /// How a violation from this application is handled.
    pub mode: FailMode,
}

/// A process-wide (or build-wide) registry of named guards.
#[derive(Default)]
pub struct GuardRegistry {
    /// Registered guards, keyed by name.
    guards: BTreeMap<String, Box<dyn Guard>>,
}

impl GuardRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            guards: BTreeMap::new(),
        }
    }

    /// Registers a guard under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::DuplicateGuard`] if `name` is already
    /// registered.
    pub fn register(&mut self, name: impl Into<String>, guard: Box<dyn Guard>) -> Result<(), TemplateError> {
        let name = name.into();
        if self.guards.contains_key(&name) {
            return Err(TemplateError::DuplicateGuard { name });
        }
        self.guards.insert(name, guard);
        Ok(())
    }

    /// Looks up a registered guard by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Guard> {
        self.guards.get(name).map(AsRef::as_ref)
    }
}

/// The two distinct ways checking a named guard can fail: the name was
/// never registered (a build-configuration mistake), or the registered
/// guard ran and rejected the content (a genuine violation, whose handling
/// depends on the application's [`FailMode`]).
#[derive(Debug)]
pub enum GuardCheckError {
    /// No guard is registered under the requested name.
    Unknown(TemplateError),
    /// The guard ran and rejected the content.
    Violation(GuardViolation),
}

/// Runs one named guard against `content`, distinguishing an unregistered
/// name from a genuine violation so callers implementing `retry`/`prune`
/// fail modes can react to the violation itself.
///
/// # Errors
///
/// Returns [`GuardCheckError::Unknown`] if `name` is not registered, or
/// [`GuardCheckError::Violation`] if the guard rejects `content`.
pub fn check_guard(
    name: &str,
    content: &xenospec_yaml::Node,
    ctx: &GuardContext,
    registry: &GuardRegistry,
) -> Result<(), GuardCheckError> {
    let guard = registry.get(name).ok_or_else(|| {
        GuardCheckError::Unknown(TemplateError::UnknownGuard {
            name: name.to_owned(),
        })
    })?;
    guard.check(content, ctx).map_err(GuardCheckError::Violation)
}

/// Runs one guard application against `content` in `reject` semantics,
/// translating any failure straight into a [`TemplateError`]. A thin
/// convenience over [`check_guard`] for callers that do not need
/// `retry`/`prune` handling.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownGuard`] if `name` is not registered, or
/// [`TemplateError::GuardRejected`] if the guard rejects `content`.
pub fn run_guard(
    name: &str,
    content: &xenospec_yaml::Node,
    ctx: &GuardContext,
    registry: &GuardRegistry,
) -> Result<(), TemplateError> {
    check_guard(name, content, ctx, registry).map_err(|err| match err {
        GuardCheckError::Unknown(template_error) => template_error,
        GuardCheckError::Violation(violation) => TemplateError::GuardRejected {
            guard: name.to_owned(),
            message: violation.message,
            span: violation.span,
        },
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::load_str;

    /// A guard that always rejects, for exercising the `reject` path.
    struct AlwaysFails;

    impl Guard for AlwaysFails {
        fn check(&self, content: &xenospec_yaml::Node, _ctx: &GuardContext) -> Result<(), GuardViolation> {
            Err(GuardViolation {
                message: "always fails".to_owned(),
                span: content.span.clone(),
                offending_keys: Vec::new(),
            })
        }
    }

    fn ctx() -> GuardContext {
        GuardContext {
            scope_name: "world".into(),
            namespace: "molecule1".into(),
            seed: 0,
            attempt: 0,
        }
    }

    #[test]
    fn unregistered_guard_is_an_error() {
        let registry = GuardRegistry::empty();
        let content = load_str("x: 1\n", SourceId::from("<test>")).expect("load");
        let err = run_guard("missing", &content, &ctx(), &registry).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownGuard { .. }));
    }

    #[test]
    fn rejecting_guard_surfaces_as_guard_rejected() {
        let mut registry = GuardRegistry::empty();
        registry.register("always_fails", Box::new(AlwaysFails)).expect("register");
        let content = load_str("x: 1\n", SourceId::from("<test>")).expect("load");
        let err = run_guard("always_fails", &content, &ctx(), &registry).unwrap_err();
        assert!(matches!(err, TemplateError::GuardRejected { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = GuardRegistry::empty();
        registry.register("g", Box::new(AlwaysFails)).expect("register");
        let err = registry.register("g", Box::new(AlwaysFails)).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateGuard { .. }));
    }
}
