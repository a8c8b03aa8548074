// crates/xenospec-cli/src/lib.rs
// ============================================================================
// Module: XenoSpec CLI Library
// Description: Shared helpers for the XenoSpec command-line interface.
// Purpose: Provide reusable components (i18n, pipeline glue, reference
// runtime, DAT commands) for the CLI binary and its integration tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities: the internationalized
//! message catalog, the load/resolve/scope/hydrate pipeline glue, the
//! built-in reference `Simulator`/`Agent` pair, and the DAT folder
//! `build:`/`run:` executor. The binary entry point (`src/main.rs`) imports
//! these helpers to keep all user-facing output and subcommand behavior
//! consistent and testable.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;

/// Pipeline glue: load/resolve/scope/hydrate wiring and entity lookup.
pub mod pipeline;

/// The built-in reference `Simulator`/`Agent` pair `run`/`experiment` drive.
pub mod runtime;

/// DAT folder `build:`/`run:` command implementations.
pub mod dat;
