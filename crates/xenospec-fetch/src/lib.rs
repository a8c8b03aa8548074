// crates/xenospec-fetch/src/lib.rs
// ============================================================================
// Module: XenoSpec Fetch
// Description: Specifier resolution, the in-memory module registry, and the
// DAT folder model with its process-wide identity cache.
// Purpose: Implement spec.md §4.7 end to end: the primary `fetch()` loading
// primitive consulted by the scope graph's fallback lookup, the reference
// resolver's `!include`, and the CLI's top-level pipeline.
// Dependencies: indexmap, xenospec-core, xenospec-yaml, thiserror
// ============================================================================

//! Specifier resolution and the DAT folder model.
//!
//! This crate owns the one process-wide mutable store named in spec.md §5:
//! the fetch identity cache. [`FetchEngine`] is the only type that touches
//! it; every other crate asks it for content by [`xenospec_core::Specifier`]
//! rather than touching the filesystem directly.

#![forbid(unsafe_code)]

mod dat;
mod engine;
mod error;
mod registry;

pub use dat::DatSpec;
pub use dat::DatSpecError;
pub use dat::RunStep;
pub use engine::FetchEngine;
pub use error::FetchError;
pub use registry::ModuleRegistry;
