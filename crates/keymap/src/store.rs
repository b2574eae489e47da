//! Fixed-bucket hash table of mapping records.

use crate::record::MapRecord;

/// Number of hash buckets in a store.
pub const MAP_HASH_SIZE: usize = 256;

/// Bucket index for a key sequence: its first byte, modulo the table size.
///
/// Every sequence that could exactly match, extend, or overrun a query
/// shares the query's first byte, so a single bucket scan sees all of them.
fn bucket_of(lhs: &[u8]) -> usize {
	lhs[0] as usize % MAP_HASH_SIZE
}

/// Four-way classification of a query against one stored key sequence.
///
/// A plain equal/unequal check cannot express the ambiguity that drives
/// incremental key-sequence input, so both strict-prefix directions are
/// distinct outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqCompare {
	/// The sequences do not match.
	Unequal,
	/// The sequences match exactly.
	Exact,
	/// The query matches the initial bytes of the stored sequence
	/// (`fo` vs `foo`): more input could still complete it.
	QueryIsPrefix,
	/// The stored sequence matches the initial bytes of the query
	/// (`foo` vs `fo`): the query has overrun a shorter mapping.
	StoredIsPrefix,
}

/// Classifies `query` against `stored`.
pub fn compare_seqs(query: &[u8], stored: &[u8]) -> SeqCompare {
	let len = query.len().min(stored.len());
	if query[..len] != stored[..len] {
		return SeqCompare::Unequal;
	}
	match query.len().cmp(&stored.len()) {
		std::cmp::Ordering::Equal => SeqCompare::Exact,
		std::cmp::Ordering::Less => SeqCompare::QueryIsPrefix,
		std::cmp::Ordering::Greater => SeqCompare::StoredIsPrefix,
	}
}

/// Aggregate result of probing one store with a query sequence.
///
/// All three facets are reported together so the caller can apply its
/// nowait/timeout policy: an exact hit may coexist with longer mappings
/// still pending, and a query may overrun a shorter mapping while another
/// record could still complete.
#[derive(Debug, Default)]
pub struct LookupResult<'a> {
	/// The first record whose lhs matches the query exactly.
	pub exact: Option<&'a MapRecord>,
	/// True if some stored lhs strictly extends the query: more input
	/// could complete a longer mapping.
	pub pending: bool,
	/// The record with the longest lhs that the query strictly overruns.
	pub overrun: Option<&'a MapRecord>,
}

impl LookupResult<'_> {
	/// True when the query matched nothing at all.
	pub fn is_unmatched(&self) -> bool {
		self.exact.is_none() && !self.pending && self.overrun.is_none()
	}
}

/// A fixed number of buckets, each an owned list of records.
///
/// The store performs no duplicate detection: `insert` appends
/// unconditionally, and callers that need exactly-one-per-lhs semantics
/// probe with [`MapStore::get_exact`] first. Record deallocation is
/// ownership-driven; removing a record drops its key sequence and releases
/// its callback handle.
#[derive(Debug)]
pub struct MapStore {
	buckets: Box<[Vec<MapRecord>]>,
}

impl Default for MapStore {
	fn default() -> Self {
		Self::new()
	}
}

impl MapStore {
	/// Creates an empty store with [`MAP_HASH_SIZE`] buckets.
	pub fn new() -> Self {
		Self {
			buckets: (0..MAP_HASH_SIZE).map(|_| Vec::new()).collect(),
		}
	}

	/// Adds a record to the bucket its lhs hashes to.
	pub fn insert(&mut self, record: MapRecord) {
		self.buckets[bucket_of(record.lhs())].push(record);
	}

	/// Probes the store with a (possibly partial) query sequence.
	///
	/// Scans only the query's bucket; see [`bucket_of`]. An empty query
	/// matches nothing.
	pub fn lookup(&self, query: &[u8]) -> LookupResult<'_> {
		let mut result = LookupResult::default();
		if query.is_empty() {
			return result;
		}

		for record in &self.buckets[bucket_of(query)] {
			match compare_seqs(query, record.lhs()) {
				SeqCompare::Unequal => {}
				SeqCompare::Exact => {
					if result.exact.is_none() {
						result.exact = Some(record);
					}
				}
				SeqCompare::QueryIsPrefix => result.pending = true,
				SeqCompare::StoredIsPrefix => {
					let longer = result
						.overrun
						.is_none_or(|prev| record.lhs().len() > prev.lhs().len());
					if longer {
						result.overrun = Some(record);
					}
				}
			}
		}

		result
	}

	/// Returns the first record whose lhs matches `lhs` exactly.
	pub fn get_exact(&self, lhs: &[u8]) -> Option<&MapRecord> {
		if lhs.is_empty() {
			return None;
		}
		self.buckets[bucket_of(lhs)].iter().find(|r| r.lhs() == lhs)
	}

	/// Removes the first exact-match record for `lhs`.
	///
	/// Returns whether a record was removed; deleting a missing sequence
	/// is a no-op, not an error.
	pub fn delete(&mut self, lhs: &[u8]) -> bool {
		if lhs.is_empty() {
			return false;
		}
		let bucket = &mut self.buckets[bucket_of(lhs)];
		match bucket.iter().position(|r| r.lhs() == lhs) {
			Some(idx) => {
				bucket.remove(idx);
				true
			}
			None => false,
		}
	}

	/// Drops every record in every bucket.
	pub fn clear(&mut self) {
		for bucket in &mut self.buckets {
			bucket.clear();
		}
	}

	/// Total number of records across all buckets.
	pub fn len(&self) -> usize {
		self.buckets.iter().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.iter().all(Vec::is_empty)
	}

	/// Iterates every record, bucket by bucket.
	pub fn iter(&self) -> impl Iterator<Item = &MapRecord> {
		self.buckets.iter().flatten()
	}
}
