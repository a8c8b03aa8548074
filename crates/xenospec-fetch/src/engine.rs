// crates/xenospec-fetch/src/engine.rs
// ============================================================================
// Module: XenoSpec Fetch Engine
// Description: Specifier resolution (spec.md §4.7) and the process-wide
// identity cache.
// Purpose: The single entry point every other crate calls to turn a
// `Specifier` into a `Node` tree, with ORM-style identity guarantees.
// Dependencies: indexmap, xenospec-core, xenospec-yaml
// ============================================================================

//! ## Overview
//! [`FetchEngine::fetch`] implements spec.md §4.7's five-step resolution
//! order. Repeated calls resolving to the same [`CanonicalPath`] return the
//! same [`Arc<Node>`] (cache identity); [`FetchEngine::fetch_raw`] bypasses
//! the cache entirely, per spec.md's "cache is bypassed when the caller
//! requests a raw (unprocessed) dict."

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use xenospec_core::CanonicalPath;
use xenospec_core::SourceId;
use xenospec_core::Specifier;
use xenospec_core::SpecifierForm;
use xenospec_yaml::load_file;
use xenospec_yaml::Node;

use crate::error::FetchError;
use crate::registry::ModuleRegistry;

/// Default filename loaded as a DAT folder's index content.
const INDEX_FILENAME: &str = "index.yaml";

/// The primary loading primitive: resolves specifiers to cached [`Node`]
/// trees, consulting an in-memory module registry before an ordered list of
/// filesystem roots.
pub struct FetchEngine {
    /// Ordered filesystem roots scanned for dotted-name and path specifiers.
    roots: Vec<PathBuf>,
    /// In-memory modules, consulted before the filesystem roots.
    modules: ModuleRegistry,
    /// Identity cache, keyed by canonical path. Serialized behind a mutex
    /// since the fetch cache is documented as the one process-wide mutable
    /// store (spec.md §5).
    cache: Mutex<HashMap<CanonicalPath, Arc<Node>>>,
}

impl FetchEngine {
    /// Builds a fetch engine over the given ordered roots with an empty
    /// module registry.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            modules: ModuleRegistry::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an in-memory module, consulted before the filesystem roots
    /// for dotted specifiers whose first segment matches `name`.
    pub fn register_module(&mut self, name: impl Into<String>, value: Node) {
        self.modules.register(name, value);
    }

    /// Explicitly clears the identity cache (spec.md §4.7: "Invalidation is
    /// explicit").
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::CachePoisoned`] if another thread panicked
    /// while holding the cache lock.
    pub fn clear_cache(&self) -> Result<(), FetchError> {
        self.cache
            .lock()
            .map_err(|_| FetchError::CachePoisoned)?
            .clear();
        Ok(())
    }

    /// Resolves `specifier` to content, returning the cached instance if one
    /// already exists for the same canonical path.
    ///
    /// `current_dat` is the directory of the DAT currently in scope, used to
    /// resolve `./`-relative specifiers; pass `None` outside any DAT
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] if no module, DAT, or file satisfies
    /// the specifier, or the more specific variants raised while loading one
    /// that was found.
    pub fn fetch(
        &self,
        specifier: &Specifier,
        current_dat: Option<&Path>,
    ) -> Result<Arc<Node>, FetchError> {
        if let Some(module) = self.resolve_module(specifier) {
            return Ok(Arc::new(module));
        }
        let (canonical, node) = self.resolve_path_based(specifier, current_dat)?;
        let mut cache = self.cache.lock().map_err(|_| FetchError::CachePoisoned)?;
        if let Some(existing) = cache.get(&canonical) {
            return Ok(Arc::clone(existing));
        }
        let arc = Arc::new(node);
        cache.insert(canonical, Arc::clone(&arc));
        Ok(arc)
    }

    /// Resolves `specifier` exactly as [`FetchEngine::fetch`] does, but
    /// bypasses and does not populate the identity cache.
    ///
    /// # Errors
    ///
    /// Same as [`FetchEngine::fetch`].
    pub fn fetch_raw(
        &self,
        specifier: &Specifier,
        current_dat: Option<&Path>,
    ) -> Result<Node, FetchError> {
        if let Some(module) = self.resolve_module(specifier) {
            return Ok(module);
        }
        let (_, node) = self.resolve_path_based(specifier, current_dat)?;
        Ok(node)
    }

    /// Attempts dotted-name resolution against the in-memory module
    /// registry only (step 4's first half). Returns `None` for non-dotted
    /// specifiers or dotted names whose first segment is unregistered.
    fn resolve_module(&self, specifier: &Specifier) -> Option<Node> {
        if specifier.form() != SpecifierForm::Dotted {
            return None;
        }
        let segments = specifier.dotted_segments();
        let (first, rest) = segments.split_first()?;
        let module = self.modules.get(first)?;
        dereference_segments(module, rest).ok()
    }

    /// Resolves specifiers that are not satisfied by the module registry:
    /// absolute paths, relative paths, bare paths containing `/`, and
    /// dotted names falling back to the filesystem roots.
    fn resolve_path_based(
        &self,
        specifier: &Specifier,
        current_dat: Option<&Path>,
    ) -> Result<(CanonicalPath, Node), FetchError> {
        match specifier.form() {
            SpecifierForm::Absolute => {
                let path = PathBuf::from(specifier.as_str());
                self.load_dat_path(&path, specifier.as_str())
            }
            SpecifierForm::Relative => {
                let raw = specifier.as_str();
                let base = if let Some(stripped) = raw.strip_prefix("./") {
                    let dat = current_dat.ok_or_else(|| FetchError::NoCurrentDat {
                        specifier: raw.to_owned(),
                    })?;
                    dat.join(stripped)
                } else {
                    // Contains `/` but doesn't start with `./`: rooted at
                    // the first configured root (spec.md §4.7 step 3).
                    self.first_root().join(raw)
                };
                self.load_dat_path(&base, raw)
            }
            SpecifierForm::Dotted => self.resolve_dotted_on_roots(specifier),
        }
    }

    /// Returns the first configured root, or `.` if none are configured.
    fn first_root(&self) -> PathBuf {
        self.roots
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Scans roots in order for a dotted specifier, converting all but the
    /// final segment to path separators and preferring `.yaml` over `.py`
    /// for the final segment (spec.md §4.7 step 4).
    fn resolve_dotted_on_roots(
        &self,
        specifier: &Specifier,
    ) -> Result<(CanonicalPath, Node), FetchError> {
        let segments = specifier.dotted_segments();
        for root in &self.roots {
            let mut base = root.clone();
            if let Some((last, init)) = segments.split_last() {
                for segment in init {
                    base.push(segment);
                }
                let yaml_candidate = base.join(format!("{last}.yaml"));
                if yaml_candidate.is_file() {
                    return self.load_single_file(&yaml_candidate, specifier.as_str());
                }
                let py_candidate = base.join(format!("{last}.py"));
                if py_candidate.is_file() {
                    return self.load_single_file(&py_candidate, specifier.as_str());
                }
                let dir_candidate = base.join(last);
                if dir_candidate.is_dir() {
                    return self.load_dat_path(&dir_candidate, specifier.as_str());
                }
            }
        }
        Err(FetchError::NotFound {
            specifier: specifier.as_str().to_owned(),
        })
    }

    /// Loads a path specifier that may carry a trailing dotted suffix
    /// (`a/b/c.x.y`), splitting it into the path portion (`a/b/c`) and the
    /// member-access suffix (`.x.y`), dereferenced before hydration.
    fn load_dat_path(
        &self,
        path: &Path,
        original_specifier: &str,
    ) -> Result<(CanonicalPath, Node), FetchError> {
        if path.exists() {
            return self.load_existing_path(path);
        }
        let Some(file_stem_parent) = path.parent() else {
            return Err(FetchError::NotFound {
                specifier: original_specifier.to_owned(),
            });
        };
        let Some(last) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(FetchError::NotFound {
                specifier: original_specifier.to_owned(),
            });
        };
        let mut parts = last.splitn(2, '.');
        let stem = parts.next().unwrap_or_default();
        let Some(suffix) = parts.next() else {
            return Err(FetchError::NotFound {
                specifier: original_specifier.to_owned(),
            });
        };
        let base_path = file_stem_parent.join(stem);
        if !base_path.exists() {
            return Err(FetchError::NotFound {
                specifier: original_specifier.to_owned(),
            });
        }
        let (canonical, node) = self.load_existing_path(&base_path)?;
        let mut current = node;
        for segment in suffix.split('.') {
            current = current
                .get(segment)
                .cloned()
                .ok_or_else(|| FetchError::NoSuchMember {
                    specifier: original_specifier.to_owned(),
                    segment: segment.to_owned(),
                })?;
        }
        Ok((canonical, current))
    }

    /// Loads a path already known to exist on disk: a directory (DAT folder,
    /// loading its `index.yaml`) or a single file.
    fn load_existing_path(&self, path: &Path) -> Result<(CanonicalPath, Node), FetchError> {
        if path.is_dir() {
            let index = path.join(INDEX_FILENAME);
            if !index.is_file() {
                return Err(FetchError::MissingIndex {
                    path: path.display().to_string(),
                });
            }
            self.load_single_file(&index, &path.display().to_string())
        } else {
            self.load_single_file(path, &path.display().to_string())
        }
    }

    /// Loads and canonicalizes a single YAML file.
    fn load_single_file(
        &self,
        path: &Path,
        specifier: &str,
    ) -> Result<(CanonicalPath, Node), FetchError> {
        let canonical = canonicalize_lexically(path);
        let node = load_file(path).map_err(|source| FetchError::Load {
            path: specifier.to_owned(),
            source,
        })?;
        Ok((CanonicalPath::new(canonical), node))
    }
}

/// Dereferences a chain of member-access segments against a node, used for
/// in-memory module lookups (`world.tide_pool.species` against a registered
/// `world` module).
fn dereference_segments(node: &Node, segments: &[&str]) -> Result<Node, ()> {
    let mut current = node.clone();
    for segment in segments {
        current = current.get(segment).cloned().ok_or(())?;
    }
    Ok(current)
}

/// Lexically normalizes `.`/`..` components without requiring the path to
/// exist (unlike `std::fs::canonicalize`), so identity comparisons work the
/// same whether or not the filesystem round-trips symlinks.
fn canonicalize_lexically(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                std::path::Component::ParentDir => {
                    normalized.pop();
                }
                std::path::Component::CurDir => {}
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized
    })
}

impl std::fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;
    use xenospec_core::SourceId;
    use xenospec_yaml::NodeValue;

    #[test]
    fn resolves_dotted_module_first_segment() {
        let mut engine = FetchEngine::new(vec![]);
        let module = xenospec_yaml::load_str("earth:\n  tide: 1\n", SourceId::from("<mem>"))
            .expect("load");
        engine.register_module("world", module);
        let got = engine
            .fetch(&Specifier::parse("world.earth.tide"), None)
            .expect("fetch");
        assert_eq!(got.as_str(), None);
        assert!(matches!(got.value, NodeValue::Scalar(_)));
    }

    #[test]
    fn loads_dat_folder_index_from_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("scenarios/alpha")).expect("mkdir");
        fs::write(
            dir.path().join("scenarios/alpha/index.yaml"),
            "name: alpha\n",
        )
        .expect("write");
        let engine = FetchEngine::new(vec![dir.path().join("scenarios")]);
        let got = engine
            .fetch(&Specifier::parse("alpha"), None)
            .expect("fetch");
        assert_eq!(got.get("name").and_then(Node::as_str), Some("alpha"));
    }

    #[test]
    fn identity_cache_returns_same_instance() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.yaml"), "x: 1\n").expect("write");
        let engine = FetchEngine::new(vec![]);
        let specifier = Specifier::parse(dir.path().join("a.yaml").to_str().expect("utf8"));
        let first = engine.fetch(&specifier, None).expect("fetch 1");
        let second = engine.fetch(&specifier, None).expect("fetch 2");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn trailing_dotted_suffix_dereferences_before_hydration() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("a/b")).expect("mkdir");
        fs::write(
            dir.path().join("a/b/c.yaml"),
            "x:\n  y: 42\n",
        )
        .expect("write");
        let engine = FetchEngine::new(vec![]);
        let specifier_text = format!("{}/a/b/c.x.y", dir.path().display());
        let specifier = Specifier::parse(specifier_text);
        let got = engine.fetch(&specifier, None).expect("fetch");
        assert!(matches!(got.value, NodeValue::Scalar(_)));
    }
}
