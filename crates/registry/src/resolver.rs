//! Cross-context resolution of (possibly partial) key sequences.
//!
//! The resolver reconciles three independent precedence signals: declared
//! priority (descending), creation order (a later context outranks an
//! earlier one of equal priority for listing purposes), and the per-record
//! `NOWAIT` escape that lets an exact match fire while longer mappings
//! could still complete. Equal-priority exact conflicts across contexts
//! are reported as [`Resolution::Ambiguous`] rather than silently picking
//! one.

use keyscope_keymap::MapRecord;

use crate::context::{Context, ContextId, Priority};
use crate::registry::Registry;

/// A mapping selected by resolution, cloned out of its store.
///
/// Cloning the record acquires its callback reference, so the match stays
/// valid even if the mapping is deleted before the action runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
	/// The context the winning record came from.
	pub context: ContextId,
	/// The winning record.
	pub record: MapRecord,
	/// Bytes of the query covered by the record's lhs. Less than the
	/// query length when a shorter mapping was overrun; the caller
	/// re-feeds the remainder.
	pub consumed: usize,
}

/// Outcome of resolving a key sequence across all enabled contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
	/// No context matched any part of the query.
	NoMatch,
	/// Some stored mapping strictly extends the query; the input loop
	/// must buffer more key events. If a shorter mapping already matched
	/// it rides along so the timeout policy can commit it without a
	/// second pass.
	NeedMoreInput { sticky: Option<ResolvedMatch> },
	/// Exactly one top-ranked mapping matched.
	Unique(ResolvedMatch),
	/// Several contexts of equal top priority matched; listed in
	/// precedence order (context id descending). The caller reports the
	/// conflict instead of guessing.
	Ambiguous(Vec<ResolvedMatch>),
}

struct Candidate {
	priority: Priority,
	matched: ResolvedMatch,
	exact: bool,
}

/// Queries one enabled context, cloning out the best usable record.
///
/// Exact matches are preferred over overruns; a detached store yields
/// nothing. The second tuple field reports whether longer mappings are
/// still pending in this context.
fn probe(ctx: &Context, query: &[u8]) -> (Option<Candidate>, bool) {
	let Some((found, pending)) = ctx.with_store(|store| {
		let result = store.lookup(query);
		let found = match result.exact {
			Some(record) => Some((record.clone(), query.len(), true)),
			None => result
				.overrun
				.map(|record| (record.clone(), record.lhs().len(), false)),
		};
		(found, result.pending)
	}) else {
		return (None, false);
	};

	let candidate = found.map(|(record, consumed, exact)| Candidate {
		priority: ctx.priority(),
		matched: ResolvedMatch {
			context: ctx.id(),
			record,
			consumed,
		},
		exact,
	});
	(candidate, pending)
}

/// Resolves `query` against every enabled context in `registry`.
pub fn resolve(registry: &Registry, query: &[u8]) -> Resolution {
	let mut pending = false;
	let mut candidates: Vec<Candidate> = Vec::new();

	for ctx in registry.contexts().filter(|c| c.enabled()) {
		let (candidate, ctx_pending) = probe(ctx, query);
		pending |= ctx_pending;
		candidates.extend(candidate);
	}

	// Priority descending, then context id descending: later-created
	// contexts outrank earlier ones of equal priority in listing order.
	candidates.sort_by(|a, b| {
		b.priority
			.cmp(&a.priority)
			.then(b.matched.context.cmp(&a.matched.context))
	});

	// An exact match anywhere beats every overrun: it covers the whole
	// query, the overrun only a prefix of it.
	if candidates.iter().any(|c| c.exact) {
		candidates.retain(|c| c.exact);
	}

	let Some(top) = candidates.first() else {
		return if pending {
			Resolution::NeedMoreInput { sticky: None }
		} else {
			Resolution::NoMatch
		};
	};

	let top_priority = top.priority;
	let peers = candidates.iter().take_while(|c| c.priority == top_priority).count();
	if peers > 1 {
		return Resolution::Ambiguous(
			candidates
				.into_iter()
				.take(peers)
				.map(|c| c.matched)
				.collect(),
		);
	}

	let winner = candidates.swap_remove(0).matched;
	if pending && !winner.record.nowait() {
		return Resolution::NeedMoreInput { sticky: Some(winner) };
	}
	Resolution::Unique(winner)
}

/// Timeout-path resolution: identical to [`resolve`], but a pending state
/// with an already-matched shorter mapping commits to it instead of
/// waiting for more input.
///
/// The input loop calls this after its bounded wait expires; the core has
/// no timer of its own.
pub fn resolve_on_timeout(registry: &Registry, query: &[u8]) -> Resolution {
	match resolve(registry, query) {
		Resolution::NeedMoreInput { sticky: Some(m) } => Resolution::Unique(m),
		Resolution::NeedMoreInput { sticky: None } => Resolution::NoMatch,
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use keyscope_keymap::{MapAction, MapFlags, MapRecord};

	use super::*;
	use crate::context::Scope;

	fn registry() -> Registry {
		let mut registry = Registry::new();
		registry.bootstrap();
		registry
	}

	fn define(registry: &mut Registry, id: ContextId, lhs: &[u8], rhs: &[u8]) {
		define_record(registry, id, MapRecord::new(lhs, MapAction::keys(rhs)).unwrap());
	}

	fn define_record(registry: &mut Registry, id: ContextId, record: MapRecord) {
		registry
			.get_mut(id)
			.unwrap()
			.with_store_mut(|store| store.insert(record))
			.unwrap();
	}

	#[test]
	fn exact_match_in_global_context() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"gd", b"definition");

		match resolve(&reg, b"gd") {
			Resolution::Unique(m) => {
				assert_eq!(m.context, ContextId::GLOBAL);
				assert_eq!(m.record.action(), &MapAction::keys(b"definition"));
				assert_eq!(m.consumed, 2);
			}
			other => panic!("expected unique match, got {other:?}"),
		}
		assert_eq!(resolve(&reg, b"zz"), Resolution::NoMatch);
	}

	#[test]
	fn prefix_of_longer_mapping_needs_more_input() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"gdd", b"long");

		assert_eq!(resolve(&reg, b"gd"), Resolution::NeedMoreInput { sticky: None });
	}

	#[test]
	fn exact_shadowed_by_longer_mapping_rides_along() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"g", b"short");
		define(&mut reg, ContextId::GLOBAL, b"gg", b"long");

		match resolve(&reg, b"g") {
			Resolution::NeedMoreInput { sticky: Some(m) } => {
				assert_eq!(m.record.action(), &MapAction::keys(b"short"));
			}
			other => panic!("expected pending with sticky match, got {other:?}"),
		}

		// The timeout path commits the shorter mapping.
		match resolve_on_timeout(&reg, b"g") {
			Resolution::Unique(m) => assert_eq!(m.record.action(), &MapAction::keys(b"short")),
			other => panic!("expected unique match on timeout, got {other:?}"),
		}
	}

	#[test]
	fn nowait_fires_through_pending_longer_mapping() {
		let mut reg = registry();
		define_record(
			&mut reg,
			ContextId::GLOBAL,
			MapRecord::new(b"g", MapAction::keys(b"short"))
				.unwrap()
				.with_flags(MapFlags::NOWAIT),
		);
		define(&mut reg, ContextId::GLOBAL, b"gg", b"long");

		match resolve(&reg, b"g") {
			Resolution::Unique(m) => assert_eq!(m.record.action(), &MapAction::keys(b"short")),
			other => panic!("expected immediate match with nowait, got {other:?}"),
		}
	}

	#[test]
	fn equal_priority_conflict_is_ambiguous() {
		let mut reg = registry();
		let a = reg.create("plugin_a", Scope::User).unwrap();
		let b = reg.create("plugin_b", Scope::User).unwrap();
		define(&mut reg, a, b"x", b"from_a");
		define(&mut reg, b, b"x", b"from_b");

		match resolve(&reg, b"x") {
			Resolution::Ambiguous(matches) => {
				// Listed in precedence order: later-created first.
				assert_eq!(matches.len(), 2);
				assert_eq!(matches[0].context, b);
				assert_eq!(matches[1].context, a);
			}
			other => panic!("expected ambiguous resolution, got {other:?}"),
		}
	}

	#[test]
	fn raised_priority_wins_deterministically() {
		let mut reg = registry();
		let a = reg.create("plugin_a", Scope::User).unwrap();
		let b = reg.create("plugin_b", Scope::User).unwrap();
		define(&mut reg, a, b"x", b"from_a");
		define(&mut reg, b, b"x", b"from_b");

		reg.set_priority(a, Priority::Max).unwrap();
		match resolve(&reg, b"x") {
			Resolution::Unique(m) => assert_eq!(m.context, a),
			other => panic!("expected unique match after priority raise, got {other:?}"),
		}
	}

	#[test]
	fn higher_priority_context_beats_global() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"w", b"global");
		let user = reg.create("overlay", Scope::User).unwrap();
		reg.set_priority(user, Priority::Window).unwrap();
		define(&mut reg, user, b"w", b"overlay");

		match resolve(&reg, b"w") {
			Resolution::Unique(m) => assert_eq!(m.context, user),
			other => panic!("expected overlay to win, got {other:?}"),
		}
	}

	#[test]
	fn disabled_contexts_are_skipped() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"q", b"quit");
		reg.set_enabled(ContextId::GLOBAL, false).unwrap();

		assert_eq!(resolve(&reg, b"q"), Resolution::NoMatch);
	}

	#[test]
	fn overrun_match_reports_consumed_prefix() {
		let mut reg = registry();
		define(&mut reg, ContextId::GLOBAL, b"ab", b"pair");

		match resolve(&reg, b"abc") {
			Resolution::Unique(m) => {
				assert_eq!(m.record.lhs(), b"ab");
				assert_eq!(m.consumed, 2);
			}
			other => panic!("expected overrun match, got {other:?}"),
		}
	}

	#[test]
	fn exact_beats_overrun_across_contexts() {
		let mut reg = registry();
		let user = reg.create("overlay", Scope::User).unwrap();
		define(&mut reg, ContextId::GLOBAL, b"ab", b"short_global");
		define(&mut reg, user, b"abc", b"exact_user");

		match resolve(&reg, b"abc") {
			Resolution::Unique(m) => {
				assert_eq!(m.context, user);
				assert_eq!(m.consumed, 3);
			}
			other => panic!("expected the exact match to win, got {other:?}"),
		}
	}

	#[test]
	fn detached_window_context_never_matches() {
		let reg = registry();
		// The bootstrap window context has no storage yet; resolution
		// must treat it as no-match rather than erroring.
		assert_eq!(resolve(&reg, b"w"), Resolution::NoMatch);
	}
}
