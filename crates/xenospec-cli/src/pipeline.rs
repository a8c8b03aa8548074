// crates/xenospec-cli/src/pipeline.rs
// ============================================================================
// Module: XenoSpec CLI Pipeline Glue
// Description: Wires the load -> resolve -> scope -> hydrate stages into one
// call and gives the rest of the binary a single error type for them.
// Purpose: Shared foundation for `build`, `validate`, `run`, and `experiment`;
// none of those subcommands re-implement pipeline wiring of their own.
// Dependencies: xenospec-core, xenospec-fetch, xenospec-hydrate,
// xenospec-resolve, xenospec-scope, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`Pipeline::build`] runs every stage up to and including hydration and
//! hands back the hydrated entity map plus the fetch engine and scope graph
//! those entities still reference. [`Pipeline::find`] then locates one
//! entity by its dotted name, walking [`xenospec_hydrate::Entity::child`]
//! links the way [`xenospec_scope::ScopeGraph::lookup`] walks scopes.

use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;
use xenospec_core::SourceId;
use xenospec_fetch::FetchEngine;
use xenospec_hydrate::hydrate;
use xenospec_hydrate::Entity;
use xenospec_hydrate::HydrateError;
use xenospec_hydrate::TypeRegistry;
use xenospec_resolve::resolve;
use xenospec_resolve::ResolveError;
use xenospec_scope::ScopeError;
use xenospec_scope::ScopeGraph;
use xenospec_scope::ScopeId;
use xenospec_yaml::load_file;
use xenospec_yaml::LoadError;

/// Everything that can go wrong turning a spec file into hydrated entities.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The root YAML document failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// `!include`/`!ref` expansion failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Scope graph construction failed.
    #[error(transparent)]
    Scope(#[from] ScopeError),
    /// Hydration rejected a typed element's body.
    #[error(transparent)]
    Hydrate(#[from] HydrateError),
    /// Template expansion failed on an entity's body.
    #[error(transparent)]
    Template(#[from] xenospec_template::TemplateError),
    /// The requested entity name was not found anywhere in the hydrated tree.
    #[error("no entity named `{name}`")]
    EntityNotFound {
        /// The dotted name that did not resolve.
        name: String,
    },
}

/// The hydrated result of running a spec file through every stage up to and
/// including hydration, plus the collaborators later stages still need.
pub struct Pipeline {
    /// The fetch engine the resolve stage consulted; kept alive so later
    /// stages (template expansion, DAT loads) can keep using the same
    /// identity cache.
    pub fetch: FetchEngine,
    /// The scope graph built over the resolved tree.
    pub graph: ScopeGraph,
    /// The root scope, as returned by [`ScopeGraph::build`].
    pub root: ScopeId,
    /// Every top-level hydrated entity, keyed by its dotted name.
    pub entities: IndexMap<String, Entity>,
}

impl Pipeline {
    /// Runs `spec_path` through load, resolve, scope, and hydrate.
    ///
    /// `roots` are additional filesystem roots consulted for dotted-name and
    /// relative specifiers; `spec_path`'s own parent directory is always
    /// prepended so `!include`/`!ref` targets alongside the spec resolve
    /// without an explicit `--root`.
    ///
    /// # Errors
    ///
    /// Returns whichever [`PipelineError`] variant the first failing stage
    /// raises.
    pub fn build(spec_path: &Path, roots: &[PathBuf]) -> Result<Self, PipelineError> {
        let mut all_roots = Vec::with_capacity(roots.len() + 1);
        if let Some(parent) = spec_path.parent() {
            all_roots.push(parent.to_path_buf());
        }
        all_roots.extend(roots.iter().cloned());

        let raw = load_file(spec_path)?;
        let fetch = FetchEngine::new(all_roots);
        let resolved = resolve(&raw, &fetch)?;
        let (graph, root) = ScopeGraph::build(&resolved)?;
        let registry = TypeRegistry::with_builtins();
        let entities = hydrate(&resolved, root, &graph, &registry)?;

        Ok(Pipeline {
            fetch,
            graph,
            root,
            entities,
        })
    }

    /// Looks up an entity by its dotted name, descending through
    /// [`Entity::child`] links one segment at a time.
    #[must_use]
    pub fn find(&self, dotted_name: &str) -> Option<&Entity> {
        let mut segments = dotted_name.split('.');
        let first = segments.next()?;
        let mut current = self.entities.get(first)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// [`Pipeline::find`], converted into a [`PipelineError::EntityNotFound`]
    /// when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EntityNotFound`] if no entity has this name.
    pub fn require(&self, dotted_name: &str) -> Result<&Entity, PipelineError> {
        self.find(dotted_name).ok_or_else(|| PipelineError::EntityNotFound {
            name: dotted_name.to_owned(),
        })
    }

    /// Lists every hydrated entity's dotted name and type tag, depth-first,
    /// for `build`'s summary output.
    #[must_use]
    pub fn summary(&self) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        for entity in self.entities.values() {
            collect_summary(entity, &mut rows);
        }
        rows
    }

    /// Runs `entity`'s body through the Template Expander (spec.md §4.6),
    /// re-wrapping the result as an [`Entity`] of the same type/name/scope.
    ///
    /// spec.md §2's data flow runs expansion before "a Session then
    /// consumes the hydrated scenario", so `run`/`experiment` call this on
    /// every `scenario`/`experiment` entity they build a session from — not
    /// only `build --expand`'s standalone inspection path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Template`] if a directive is malformed, a
    /// `_template_:` path fails to load, or a guard rejects the expansion.
    pub fn expand_entity(&self, entity: &Entity, seed: u64) -> Result<Entity, PipelineError> {
        let loader = FetchTemplateLoader::new(&self.fetch, None);
        let registry = xenospec_template::GuardRegistry::empty();
        let overrides = IndexMap::new();
        let outcome = xenospec_template::expand(entity.body(), &loader, &registry, &[], &overrides, seed, entity.name())?;
        Ok(entity.with_body(outcome.tree))
    }
}

/// Depth-first walk collecting `(dotted_name, type_tag)` pairs.
fn collect_summary(entity: &Entity, rows: &mut Vec<(String, String)>) {
    rows.push((entity.name().to_owned(), entity.type_tag().to_owned()));
    for child in entity.children().values() {
        collect_summary(child, rows);
    }
}

/// A [`xenospec_template::TemplateLoader`] backed by a [`FetchEngine`].
///
/// Template loading resolves `path` against the DAT currently in scope, if
/// any, exactly as `!include` does; this is the only template-loading
/// strategy this binary needs since it never serves templates from
/// anywhere but the filesystem roots a [`Pipeline`] was built over.
pub struct FetchTemplateLoader<'a> {
    fetch: &'a FetchEngine,
    current_dat: Option<&'a Path>,
}

impl<'a> FetchTemplateLoader<'a> {
    /// Builds a loader over `fetch`, resolving relative specifiers against
    /// `current_dat` when given.
    #[must_use]
    pub fn new(fetch: &'a FetchEngine, current_dat: Option<&'a Path>) -> Self {
        Self { fetch, current_dat }
    }
}

impl xenospec_template::TemplateLoader for FetchTemplateLoader<'_> {
    fn load_template(&self, path: &str) -> Result<xenospec_yaml::Node, xenospec_template::TemplateError> {
        let specifier = xenospec_core::Specifier::parse(path);
        self.fetch
            .fetch_raw(&specifier, self.current_dat)
            .map_err(|err| xenospec_template::TemplateError::TemplateLoad {
                path: path.to_owned(),
                message: err.to_string(),
            })
    }
}

/// Resolves a spec file's own source identifier, for diagnostics that want
/// to name where a pipeline run's root document came from.
#[must_use]
pub fn source_id_for(spec_path: &Path) -> SourceId {
    SourceId::from(spec_path.display().to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use std::io::Write;

    use super::Pipeline;

    fn write_spec(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create spec file");
        file.write_all(contents.as_bytes()).expect("write spec file");
        path
    }

    #[test]
    fn builds_and_finds_a_top_level_entity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_spec(
            dir.path(),
            "scenario.yaml",
            "scenario.trial:\n  briefing: survive\n  interface:\n    actions: {}\n",
        );
        let pipeline = Pipeline::build(&path, &[]).expect("build");
        let entity = pipeline.require("trial").expect("find trial");
        assert_eq!(entity.type_tag(), "scenario");
        assert_eq!(pipeline.summary(), vec![("trial".to_owned(), "scenario".to_owned())]);
    }

    #[test]
    fn expand_entity_strips_resolved_directives_from_the_body() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_spec(
            dir.path(),
            "scenario.yaml",
            "scenario.trial:\n  briefing: survive\n  interface:\n    actions: {}\n  _params_:\n    count: 1\n",
        );
        let pipeline = Pipeline::build(&path, &[]).expect("build");
        let entity = pipeline.require("trial").expect("find trial");
        assert!(entity.body().get("_params_").is_some());

        let expanded = pipeline.expand_entity(entity, 0).expect("expand");
        assert!(expanded.body().get("_params_").is_none());
        assert!(expanded.body().get("briefing").is_some());
        assert_eq!(expanded.type_tag(), entity.type_tag());
        assert_eq!(expanded.name(), entity.name());
    }

    #[test]
    fn missing_entity_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_spec(dir.path(), "scenario.yaml", "scenario.trial:\n  interface:\n    actions: {}\n");
        let pipeline = Pipeline::build(&path, &[]).expect("build");
        assert!(pipeline.find("nonexistent").is_none());
        assert!(pipeline.require("nonexistent").is_err());
    }
}
