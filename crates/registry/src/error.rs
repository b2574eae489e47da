use thiserror::Error;

use keyscope_keymap::MapError;

use crate::context::ContextId;

/// Errors returned by registry, session, and definition-time operations.
///
/// All of these are local, recoverable conditions for the caller to report
/// or work around; none are fatal and nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	/// A context with this name already exists.
	#[error("context name already exists: {0}")]
	DuplicateName(String),
	/// The scope string is not one of global/buffer/window/user.
	#[error("unrecognized scope: {0}")]
	InvalidScope(String),
	/// No context or mapping at the given id/sequence.
	#[error("no such context or mapping")]
	NotFound,
	/// The mapping conflicts with an existing one, or resolution found
	/// equally ranked candidates in several contexts.
	#[error("entry is not unique")]
	NotUnique,
	/// Malformed mapping definition.
	#[error("invalid mapping arguments: {0}")]
	InvalidArguments(#[from] MapError),
	/// Bootstrap contexts cannot be freed or have their mapping set
	/// replaced outside of full teardown.
	#[error("context {0} is protected")]
	Protected(ContextId),
}
