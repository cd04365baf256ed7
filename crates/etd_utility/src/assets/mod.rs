//! Client-side module loader (RequireJS) configuration.
//!
//! # Responsibility
//! - Accumulate modules, packages, path remaps, client strings and deferred
//!   inline scripts during one page render.
//! - Serialize the accumulated state into a loader configuration block
//!   followed by ordered `require(...)` invocations.
//!
//! # Invariants
//! - One builder instance per render pass; nothing is shared across passes.
//! - Every map preserves insertion order.

pub mod bust;
pub mod module_name;
pub mod require_config;
