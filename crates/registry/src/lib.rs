//! Scoped mapping contexts and key-sequence resolution.
//!
//! A [`Context`] is a named, scoped, prioritized container of mappings. The
//! [`Registry`] holds contexts in a sparse, append-only table indexed by
//! [`ContextId`], so ids stay valid for the whole session and are never
//! reused. The resolver queries every enabled context for a (possibly
//! partial) key sequence and reconciles three precedence signals: priority,
//! creation order, and the nowait escape for exact matches shadowed by
//! longer mappings.
//!
//! [`Session`] is the lifecycle entry point: it bootstraps the three
//! built-in contexts (global, current buffer, current window), rebinds the
//! buffer/window contexts when the host switches, and carries the
//! definition-time surface (`define`, `undefine`, `create_context`, ...).

pub use context::{Context, ContextId, Priority, Scope, SharedStore, StoreRef};
pub use error::RegistryError;
pub use registry::Registry;
pub use resolver::{ResolvedMatch, Resolution, resolve, resolve_on_timeout};
pub use session::Session;

mod context;
mod error;
mod registry;
mod resolver;
mod session;
