//! Sparse, append-only context table.

use keyscope_keymap::MapStore;
use tracing::{debug, trace};

use crate::context::{Context, ContextId, Priority, Scope, SharedStore, StoreRef};
use crate::error::RegistryError;

/// Ordered collection of contexts indexed by [`ContextId`].
///
/// Slots are appended at creation and tombstoned on free, never compacted
/// or renumbered, so an id handed out once stays a valid index for the
/// whole session. The table starts empty; [`Registry::bootstrap`] installs
/// the three built-in contexts at their fixed ids.
#[derive(Debug, Default)]
pub struct Registry {
	contexts: Vec<Option<Context>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs the bootstrap contexts at ids 0, 1, 2.
	///
	/// The global context owns its store. The current-buffer and
	/// current-window contexts reference host storage and start detached
	/// until the first rebind.
	pub(crate) fn bootstrap(&mut self) {
		if !self.contexts.is_empty() {
			return;
		}
		self.push("global".into(), Scope::Global, StoreRef::Owned(MapStore::new()));
		self.push("current_buffer".into(), Scope::Buffer, StoreRef::Detached);
		self.push("current_window".into(), Scope::Window, StoreRef::Detached);
	}

	fn push(&mut self, name: String, scope: Scope, store: StoreRef) -> ContextId {
		let id = ContextId(self.contexts.len() as u32);
		debug!(id = %id, name = %name, scope = scope.as_str(), "creating context");
		self.contexts.push(Some(Context::new(id, name, scope, store)));
		id
	}

	/// Creates a context with an owned, empty mapping store.
	///
	/// Contexts created here are user contexts regardless of the scope
	/// value: the scope sets the default priority, not store ownership.
	///
	/// # Errors
	///
	/// [`RegistryError::DuplicateName`] if a live context already uses
	/// the name.
	pub fn create(&mut self, name: &str, scope: Scope) -> Result<ContextId, RegistryError> {
		if self.get_by_name(name).is_some() {
			return Err(RegistryError::DuplicateName(name.to_string()));
		}
		Ok(self.push(name.to_string(), scope, StoreRef::Owned(MapStore::new())))
	}

	/// Direct indexed access; `None` for out-of-range ids and tombstones.
	pub fn get(&self, id: ContextId) -> Option<&Context> {
		self.contexts.get(id.index())?.as_ref()
	}

	pub fn get_mut(&mut self, id: ContextId) -> Option<&mut Context> {
		self.contexts.get_mut(id.index())?.as_mut()
	}

	/// Linear scan by name; the table stays small enough that an index
	/// is not worth maintaining.
	pub fn get_by_name(&self, name: &str) -> Option<&Context> {
		self.contexts().find(|c| c.name() == name)
	}

	pub fn id_by_name(&self, name: &str) -> Option<ContextId> {
		self.get_by_name(name).map(Context::id)
	}

	pub fn set_enabled(&mut self, id: ContextId, enabled: bool) -> Result<(), RegistryError> {
		let ctx = self.get_mut(id).ok_or(RegistryError::NotFound)?;
		ctx.set_enabled(enabled);
		trace!(id = %id, enabled, "context enablement changed");
		Ok(())
	}

	pub fn set_priority(&mut self, id: ContextId, priority: Priority) -> Result<(), RegistryError> {
		let ctx = self.get_mut(id).ok_or(RegistryError::NotFound)?;
		ctx.set_priority(priority);
		Ok(())
	}

	/// Frees a user context: releases its owned store and tombstones the
	/// slot. The slot is never reused.
	///
	/// # Errors
	///
	/// [`RegistryError::Protected`] for bootstrap ids;
	/// [`RegistryError::NotFound`] for missing ids and tombstones.
	pub fn free(&mut self, id: ContextId) -> Result<(), RegistryError> {
		if id.is_bootstrap() {
			return Err(RegistryError::Protected(id));
		}
		let slot = self.contexts.get_mut(id.index()).ok_or(RegistryError::NotFound)?;
		let mut ctx = slot.take().ok_or(RegistryError::NotFound)?;
		ctx.release_store();
		debug!(id = %id, name = %ctx.name(), "freed context");
		Ok(())
	}

	/// Teardown-only path: frees every context in id order, bootstrap
	/// ones included, and empties the table.
	pub(crate) fn free_all(&mut self) {
		for slot in &mut self.contexts {
			if let Some(mut ctx) = slot.take() {
				ctx.release_store();
			}
		}
		self.contexts.clear();
	}

	/// Repoints the bootstrap buffer context at the active buffer's store.
	/// The previous store belongs to its buffer and is not freed.
	pub fn rebind_buffer_scope(&mut self, store: SharedStore) {
		if let Some(ctx) = self.get_mut(ContextId::BUFFER) {
			ctx.set_store(StoreRef::Shared(store));
			trace!("buffer-scope store rebound");
		}
	}

	/// Window counterpart of [`Registry::rebind_buffer_scope`]; hosts
	/// without per-window storage simply never call it.
	pub fn rebind_window_scope(&mut self, store: SharedStore) {
		if let Some(ctx) = self.get_mut(ContextId::WINDOW) {
			ctx.set_store(StoreRef::Shared(store));
			trace!("window-scope store rebound");
		}
	}

	/// Live contexts in id order.
	pub fn contexts(&self) -> impl Iterator<Item = &Context> {
		self.contexts.iter().flatten()
	}

	/// Number of slots, tombstones included. Only ever grows between
	/// bootstrap and teardown.
	pub fn slot_count(&self) -> usize {
		self.contexts.len()
	}
}
