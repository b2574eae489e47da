//! The mapping record: one lhs-to-action binding plus its arguments.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::error::MapError;

/// Maximum length of a left-hand key sequence, in bytes.
///
/// Sequences longer than this are rejected at record construction so the
/// store never has to deal with unbounded keys.
pub const MAX_LHS_LEN: usize = 50;

/// A bounded key sequence. Short sequences stay inline.
pub type KeySeq = SmallVec<[u8; 32]>;

/// Opaque handle to a scripting-engine callback.
///
/// The core never inspects the payload: it only clones and drops the handle
/// and hands it back to the action-execution layer on a match. Cloning
/// acquires a reference, dropping releases it, so a record can never leave
/// a callback dangling or release it twice.
///
/// Equality is pointer identity: two handles are equal only if they refer
/// to the same acquired callback.
#[derive(Clone)]
pub struct CallbackRef(Rc<dyn Any>);

impl CallbackRef {
	/// Wraps an engine payload in a reference-counted handle.
	pub fn new(payload: impl Any + 'static) -> Self {
		Self(Rc::new(payload))
	}

	/// Returns the payload for the action-execution collaborator.
	pub fn payload(&self) -> &dyn Any {
		&*self.0
	}

	/// Number of live handles to this callback, the wrapped payload's own
	/// handle included. Exposed for release-tracking tests.
	pub fn handle_count(&self) -> usize {
		Rc::strong_count(&self.0)
	}
}

impl PartialEq for CallbackRef {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for CallbackRef {}

impl fmt::Debug for CallbackRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CallbackRef({:p})", Rc::as_ptr(&self.0))
	}
}

/// What typing the lhs resolves to.
///
/// Exactly one side is populated by construction; there is no record state
/// where both a replacement sequence and a callback exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAction {
	/// Literal replacement byte sequence. An empty sequence is a no-op
	/// binding (the mapping consumes its keys and does nothing).
	Keys(KeySeq),
	/// Callback reference, forwarded opaquely to the scripting engine.
	Callback(CallbackRef),
}

impl MapAction {
	/// Convenience constructor for a literal replacement.
	pub fn keys(rhs: impl AsRef<[u8]>) -> Self {
		Self::Keys(KeySeq::from_slice(rhs.as_ref()))
	}

	/// True for an empty replacement sequence.
	pub fn is_noop(&self) -> bool {
		matches!(self, Self::Keys(keys) if keys.is_empty())
	}
}

/// Remapping behavior for the right-hand side, mirroring the classic
/// tri-state `noremap` argument plus the skip-first variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemapMode {
	/// Allow remapping.
	#[default]
	Remap,
	/// No remapping.
	NoRemap,
	/// Remap script-local mappings only.
	Script,
	/// No remapping for the first character.
	SkipFirst,
}

bitflags! {
	/// Boolean mapping arguments.
	#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
	pub struct MapFlags: u8 {
		/// The rhs is evaluated as an expression.
		const EXPR = 1 << 0;
		/// An exact match fires immediately, without waiting to see if a
		/// longer mapping could still complete.
		const NOWAIT = 1 << 1;
		/// Suppress command-line echo while the mapping runs.
		const SILENT = 1 << 2;
		/// Definition fails rather than replacing an existing mapping.
		const UNIQUE = 1 << 3;
		/// The mapping was defined by a script.
		const SCRIPT = 1 << 4;
	}
}

/// One key-sequence-to-action binding.
///
/// Owns its lhs and action. Dropping the record releases the callback
/// reference (if any) through the handle's own drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRecord {
	lhs: KeySeq,
	action: MapAction,
	remap: RemapMode,
	flags: MapFlags,
	desc: Option<String>,
}

impl MapRecord {
	/// Creates a record, validating the lhs bound.
	///
	/// # Errors
	///
	/// [`MapError::EmptyLhs`] for an empty sequence,
	/// [`MapError::LhsTooLong`] past [`MAX_LHS_LEN`] bytes.
	pub fn new(lhs: impl AsRef<[u8]>, action: MapAction) -> Result<Self, MapError> {
		let lhs = lhs.as_ref();
		if lhs.is_empty() {
			return Err(MapError::EmptyLhs);
		}
		if lhs.len() > MAX_LHS_LEN {
			return Err(MapError::LhsTooLong(lhs.len()));
		}

		Ok(Self {
			lhs: KeySeq::from_slice(lhs),
			action,
			remap: RemapMode::default(),
			flags: MapFlags::empty(),
			desc: None,
		})
	}

	/// Sets the remap mode.
	pub fn with_remap(mut self, remap: RemapMode) -> Self {
		self.remap = remap;
		self
	}

	/// Sets the boolean arguments.
	pub fn with_flags(mut self, flags: MapFlags) -> Self {
		self.flags = flags;
		self
	}

	/// Attaches a human-readable description.
	pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
		self.desc = Some(desc.into());
		self
	}

	pub fn lhs(&self) -> &[u8] {
		&self.lhs
	}

	pub fn action(&self) -> &MapAction {
		&self.action
	}

	pub fn remap(&self) -> RemapMode {
		self.remap
	}

	pub fn flags(&self) -> MapFlags {
		self.flags
	}

	/// True when the record should fire on an exact match without waiting
	/// out longer candidates.
	pub fn nowait(&self) -> bool {
		self.flags.contains(MapFlags::NOWAIT)
	}

	pub fn desc(&self) -> Option<&str> {
		self.desc.as_deref()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn record_validates_lhs_bounds() {
		assert_eq!(
			MapRecord::new(b"", MapAction::keys(b"x")).unwrap_err(),
			MapError::EmptyLhs
		);
		let long = vec![b'a'; MAX_LHS_LEN + 1];
		assert_eq!(
			MapRecord::new(&long, MapAction::keys(b"x")).unwrap_err(),
			MapError::LhsTooLong(MAX_LHS_LEN + 1)
		);
		let max = vec![b'a'; MAX_LHS_LEN];
		assert!(MapRecord::new(&max, MapAction::keys(b"x")).is_ok());
	}

	#[test]
	fn noop_action_is_empty_keys() {
		assert!(MapAction::keys(b"").is_noop());
		assert!(!MapAction::keys(b"x").is_noop());
		assert!(!MapAction::Callback(CallbackRef::new(7u32)).is_noop());
	}

	#[test]
	fn callback_handles_count_acquires() {
		let cb = CallbackRef::new("payload");
		assert_eq!(cb.handle_count(), 1);

		let record = MapRecord::new(b"q", MapAction::Callback(cb.clone())).unwrap();
		assert_eq!(cb.handle_count(), 2);

		let copy = record.clone();
		assert_eq!(cb.handle_count(), 3);

		drop(copy);
		drop(record);
		assert_eq!(cb.handle_count(), 1);
	}

	#[test]
	fn callback_equality_is_identity() {
		let a = CallbackRef::new(1u8);
		let b = CallbackRef::new(1u8);
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}

	#[test]
	fn builder_style_arguments() {
		let record = MapRecord::new(b"gd", MapAction::keys(b":definition\r"))
			.unwrap()
			.with_remap(RemapMode::NoRemap)
			.with_flags(MapFlags::SILENT | MapFlags::NOWAIT)
			.with_desc("go to definition");

		assert_eq!(record.lhs(), b"gd");
		assert_eq!(record.remap(), RemapMode::NoRemap);
		assert!(record.nowait());
		assert!(record.flags().contains(MapFlags::SILENT));
		assert_eq!(record.desc(), Some("go to definition"));
	}
}
