use thiserror::Error;

use crate::record::MAX_LHS_LEN;

/// Errors produced when constructing a mapping record.
///
/// Both are caller errors on the definition path; nothing here is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
	/// The left-hand key sequence was empty.
	#[error("mapping has an empty key sequence")]
	EmptyLhs,
	/// The left-hand key sequence exceeds [`MAX_LHS_LEN`] bytes.
	#[error("key sequence is {0} bytes, the maximum is {MAX_LHS_LEN}")]
	LhsTooLong(usize),
}
