//! Context identity, scope, priority, and store ownership.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use keyscope_keymap::MapStore;

use crate::error::RegistryError;

/// Stable identifier of a context: its slot in the registry table.
///
/// Assigned monotonically at creation and never reused, so an id stays a
/// valid index for the whole session even after the context is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl ContextId {
	/// The bootstrap global context.
	pub const GLOBAL: ContextId = ContextId(0);
	/// The bootstrap current-buffer context.
	pub const BUFFER: ContextId = ContextId(1);
	/// The bootstrap current-window context.
	pub const WINDOW: ContextId = ContextId(2);

	/// True for the three fixed bootstrap ids.
	pub fn is_bootstrap(self) -> bool {
		self <= Self::WINDOW
	}

	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Context scope, in reverse order of default precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	Global,
	Buffer,
	Window,
	User,
}

impl Scope {
	pub fn as_str(self) -> &'static str {
		match self {
			Scope::Global => "global",
			Scope::Buffer => "buffer",
			Scope::Window => "window",
			Scope::User => "user",
		}
	}

	/// The precedence a context of this scope gets unless overridden.
	/// User contexts start at the bottom; their creation order and an
	/// explicit priority override are the ways to climb.
	pub fn default_priority(self) -> Priority {
		match self {
			Scope::Global | Scope::User => Priority::Global,
			Scope::Buffer => Priority::Buffer,
			Scope::Window => Priority::Window,
		}
	}
}

impl FromStr for Scope {
	type Err = RegistryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"global" => Ok(Scope::Global),
			"buffer" => Ok(Scope::Buffer),
			"window" => Ok(Scope::Window),
			"user" => Ok(Scope::User),
			other => Err(RegistryError::InvalidScope(other.to_string())),
		}
	}
}

/// Resolution precedence, independent of scope.
///
/// Defaults to the scope's own level; a context may be raised up to `Max`
/// to override beyond what its scope would allow (for example a
/// buffer-scoped context outranking window-local ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
	Global = 0,
	Buffer = 1,
	Window = 2,
	Max = 3,
}

/// Handle to a mapping store that lives inside a host buffer or window
/// object. The host keeps its own handle, so dropping this one never frees
/// the store.
pub type SharedStore = Rc<RefCell<MapStore>>;

/// A context's link to its mapping store, with ownership in the type.
#[derive(Debug)]
pub enum StoreRef {
	/// The context owns the store outright (global and user contexts).
	Owned(MapStore),
	/// Non-owning back-reference to host storage (bootstrap buffer and
	/// window contexts).
	Shared(SharedStore),
	/// No storage attached; resolves as no-match. The bootstrap window
	/// context stays detached until the host provides per-window storage.
	Detached,
}

impl StoreRef {
	pub fn is_detached(&self) -> bool {
		matches!(self, StoreRef::Detached)
	}
}

/// A named, scoped, prioritized container of mappings.
#[derive(Debug)]
pub struct Context {
	id: ContextId,
	name: String,
	scope: Scope,
	priority: Priority,
	enabled: bool,
	store: StoreRef,
}

impl Context {
	pub(crate) fn new(id: ContextId, name: String, scope: Scope, store: StoreRef) -> Self {
		Self {
			id,
			name,
			scope,
			priority: scope.default_priority(),
			enabled: true,
			store,
		}
	}

	pub fn id(&self) -> ContextId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn scope(&self) -> Scope {
		self.scope
	}

	pub fn priority(&self) -> Priority {
		self.priority
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}

	pub(crate) fn set_enabled(&mut self, enabled: bool) {
		self.enabled = enabled;
	}

	pub(crate) fn set_priority(&mut self, priority: Priority) {
		self.priority = priority;
	}

	pub(crate) fn set_store(&mut self, store: StoreRef) {
		self.store = store;
	}

	pub fn has_store(&self) -> bool {
		!self.store.is_detached()
	}

	/// Runs `f` against the context's store, owned or shared.
	///
	/// Returns `None` for a detached store, which resolution treats as
	/// "no match" rather than an error.
	pub fn with_store<R>(&self, f: impl FnOnce(&MapStore) -> R) -> Option<R> {
		match &self.store {
			StoreRef::Owned(store) => Some(f(store)),
			StoreRef::Shared(store) => Some(f(&store.borrow())),
			StoreRef::Detached => None,
		}
	}

	/// Mutable counterpart of [`Context::with_store`].
	pub fn with_store_mut<R>(&mut self, f: impl FnOnce(&mut MapStore) -> R) -> Option<R> {
		match &mut self.store {
			StoreRef::Owned(store) => Some(f(store)),
			StoreRef::Shared(store) => Some(f(&mut store.borrow_mut())),
			StoreRef::Detached => None,
		}
	}

	/// Releases owned storage ahead of tombstoning. Shared stores belong
	/// to the host and are left alone.
	pub(crate) fn release_store(&mut self) {
		if let StoreRef::Owned(store) = &mut self.store {
			store.clear();
		}
		self.store = StoreRef::Detached;
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn scope_parsing_round_trips() {
		for scope in [Scope::Global, Scope::Buffer, Scope::Window, Scope::User] {
			assert_eq!(scope.as_str().parse::<Scope>().unwrap(), scope);
		}
		assert_eq!(
			"tab".parse::<Scope>().unwrap_err(),
			RegistryError::InvalidScope("tab".to_string())
		);
	}

	#[test]
	fn default_priorities_follow_scope() {
		assert_eq!(Scope::Global.default_priority(), Priority::Global);
		assert_eq!(Scope::Buffer.default_priority(), Priority::Buffer);
		assert_eq!(Scope::Window.default_priority(), Priority::Window);
		assert_eq!(Scope::User.default_priority(), Priority::Global);
		assert!(Priority::Max > Priority::Window);
	}

	#[test]
	fn bootstrap_ids_are_fixed() {
		assert!(ContextId::GLOBAL.is_bootstrap());
		assert!(ContextId::WINDOW.is_bootstrap());
		assert!(!ContextId(3).is_bootstrap());
	}

	#[test]
	fn detached_store_yields_none() {
		let ctx = Context::new(ContextId(5), "floating".into(), Scope::Window, StoreRef::Detached);
		assert!(!ctx.has_store());
		assert_eq!(ctx.with_store(|s| s.len()), None);
	}
}
