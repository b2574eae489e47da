//! Session lifecycle and the definition-time surface.

use keyscope_keymap::{MapFlags, MapRecord};
use tracing::{debug, trace};

use crate::context::{ContextId, Priority, Scope, SharedStore};
use crate::error::RegistryError;
use crate::registry::Registry;
use crate::resolver::{self, Resolution};

/// Owns the registry for one editor session.
///
/// All mutation funnels through here: context lifecycle, buffer/window
/// rebinding, and mapping definition. Resolution reads go through
/// [`Session::resolve`]. Nothing in this type is process-global; a host
/// creates one session at startup and tears it down at shutdown.
#[derive(Debug, Default)]
pub struct Session {
	registry: Registry,
	initialized: bool,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	/// Bootstraps the registry. Idempotent: a second call is a no-op.
	pub fn initialize(&mut self) {
		if self.initialized {
			return;
		}
		debug!("initializing mapping contexts");
		self.registry.bootstrap();
		self.initialized = true;
	}

	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	/// Frees every context in id order, bootstrap ones included.
	///
	/// This is the only path allowed to free the bootstrap contexts; it
	/// runs at full shutdown. A later [`Session::initialize`] starts a
	/// fresh registry.
	pub fn teardown(&mut self) {
		debug!("tearing down mapping contexts");
		self.registry.free_all();
		self.initialized = false;
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn registry_mut(&mut self) -> &mut Registry {
		&mut self.registry
	}

	/// Called by the host once per buffer activation; repoints the
	/// buffer-scope context at the new buffer's store.
	pub fn on_buffer_switch(&mut self, store: SharedStore) {
		self.registry.rebind_buffer_scope(store);
	}

	/// Window counterpart of [`Session::on_buffer_switch`], for hosts
	/// that keep per-window mapping storage.
	pub fn on_window_switch(&mut self, store: SharedStore) {
		self.registry.rebind_window_scope(store);
	}

	/// Creates a user context from a scope string.
	///
	/// # Errors
	///
	/// [`RegistryError::InvalidScope`] for an unrecognized scope string,
	/// [`RegistryError::DuplicateName`] for a name collision.
	pub fn create_context(&mut self, name: &str, scope: &str) -> Result<ContextId, RegistryError> {
		let scope: Scope = scope.parse()?;
		self.registry.create(name, scope)
	}

	pub fn enable_context(&mut self, id: ContextId, enabled: bool) -> Result<(), RegistryError> {
		self.registry.set_enabled(id, enabled)
	}

	pub fn set_context_priority(&mut self, id: ContextId, priority: Priority) -> Result<(), RegistryError> {
		self.registry.set_priority(id, priority)
	}

	pub fn free_context(&mut self, id: ContextId) -> Result<(), RegistryError> {
		self.registry.free(id)
	}

	/// Defines one mapping in a context.
	///
	/// An existing mapping with the same lhs is replaced, unless the new
	/// record carries [`MapFlags::UNIQUE`], in which case definition
	/// fails and the old mapping survives.
	///
	/// # Errors
	///
	/// [`RegistryError::NotFound`] if the context is missing or has no
	/// storage attached; [`RegistryError::NotUnique`] on a `UNIQUE`
	/// collision.
	pub fn define(&mut self, id: ContextId, record: MapRecord) -> Result<(), RegistryError> {
		let ctx = self.registry.get_mut(id).ok_or(RegistryError::NotFound)?;
		ctx.with_store_mut(|store| {
			if store.get_exact(record.lhs()).is_some() {
				if record.flags().contains(MapFlags::UNIQUE) {
					return Err(RegistryError::NotUnique);
				}
				store.delete(record.lhs());
				trace!(context = %id, "replacing existing mapping");
			}
			store.insert(record);
			Ok(())
		})
		.ok_or(RegistryError::NotFound)?
	}

	/// Replaces a user context's entire mapping set.
	///
	/// # Errors
	///
	/// [`RegistryError::Protected`] for bootstrap contexts: their mapping
	/// sets cannot be swapped wholesale, only edited one mapping at a
	/// time. [`RegistryError::NotFound`] if the context is missing.
	pub fn define_all(&mut self, id: ContextId, records: Vec<MapRecord>) -> Result<(), RegistryError> {
		if id.is_bootstrap() {
			return Err(RegistryError::Protected(id));
		}
		let ctx = self.registry.get_mut(id).ok_or(RegistryError::NotFound)?;
		ctx.with_store_mut(|store| {
			store.clear();
			for record in records {
				store.insert(record);
			}
		})
		.ok_or(RegistryError::NotFound)
	}

	/// Removes the mapping for `lhs` from a context.
	///
	/// # Errors
	///
	/// [`RegistryError::NotFound`] if the context is missing, has no
	/// storage, or holds no exact mapping for `lhs`.
	pub fn undefine(&mut self, id: ContextId, lhs: &[u8]) -> Result<(), RegistryError> {
		let ctx = self.registry.get_mut(id).ok_or(RegistryError::NotFound)?;
		let deleted = ctx
			.with_store_mut(|store| store.delete(lhs))
			.ok_or(RegistryError::NotFound)?;
		if !deleted {
			return Err(RegistryError::NotFound);
		}
		Ok(())
	}

	/// Resolves a (possibly partial) key sequence; see
	/// [`resolver::resolve`].
	pub fn resolve(&self, query: &[u8]) -> Resolution {
		resolver::resolve(&self.registry, query)
	}

	/// Timeout-path resolution; see [`resolver::resolve_on_timeout`].
	pub fn resolve_on_timeout(&self, query: &[u8]) -> Resolution {
		resolver::resolve_on_timeout(&self.registry, query)
	}
}
