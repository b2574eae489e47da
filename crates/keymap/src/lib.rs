//! Mapping records and the fixed-bucket mapping store.
//!
//! A [`MapRecord`] binds a left-hand key sequence (lhs) to an action: either
//! a literal replacement sequence or an opaque scripting-engine callback.
//! Records live in a [`MapStore`], a fixed-size hash table bucketed by the
//! first byte of the lhs. Lookup classifies the query against every record
//! in its bucket with a four-way comparison ([`SeqCompare`]) so callers can
//! drive incremental key-sequence input: an exact hit, a prefix of a longer
//! mapping, and an overrun of a shorter one are all distinct outcomes.
//!
//! Stores are scope-agnostic; layering, priorities, and enablement live in
//! `keyscope-registry`.

pub use error::MapError;
pub use record::{CallbackRef, KeySeq, MAX_LHS_LEN, MapAction, MapFlags, MapRecord, RemapMode};
pub use store::{MAP_HASH_SIZE, LookupResult, MapStore, SeqCompare, compare_seqs};

mod error;
mod record;
mod store;
