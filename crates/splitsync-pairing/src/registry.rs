//! Pair registry: which window is mirrored to which.
//!
//! `PairTable` stores each pair as two directed entries so the partner of
//! either window is a single lookup. Both entries are only ever inserted by
//! `link` and removed by `unlink`, which keeps the relation symmetric.
//! `PairRegistry` wraps the table for shared use; every method takes the
//! lock once and never holds it across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use splitsync_common::WindowId;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PairTable {
    links: HashMap<WindowId, WindowId>,
}

impl PairTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `a` with `b`. Refuses (returns false) when `a == b` or when
    /// either window already has a partner.
    pub fn link(&mut self, a: WindowId, b: WindowId) -> bool {
        if a == b || self.links.contains_key(&a) || self.links.contains_key(&b) {
            return false;
        }
        self.links.insert(a, b);
        self.links.insert(b, a);
        true
    }

    /// Dissolve the pair containing `window`. Returns `(window, partner)`.
    pub fn unlink(&mut self, window: WindowId) -> Option<(WindowId, WindowId)> {
        let partner = self.links.remove(&window)?;
        self.links.remove(&partner);
        Some((window, partner))
    }

    pub fn partner_of(&self, window: WindowId) -> Option<WindowId> {
        self.links.get(&window).copied()
    }

    pub fn is_paired(&self, window: WindowId) -> bool {
        self.links.contains_key(&window)
    }

    /// Number of pairs (not entries).
    pub fn len(&self) -> usize {
        self.links.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Every paired window, in no particular order.
    pub fn windows(&self) -> Vec<WindowId> {
        self.links.keys().copied().collect()
    }

    /// Each pair once, smaller id first.
    pub fn pairs(&self) -> Vec<(WindowId, WindowId)> {
        let mut pairs: Vec<_> = self
            .links
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (*a, *b))
            .collect();
        pairs.sort();
        pairs
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    table: PairTable,
    /// Windows whose pages should show the sync overlay.
    overlay: HashSet<WindowId>,
}

/// Shared, lock-protected pair table plus the overlay-visible window set.
#[derive(Debug, Default)]
pub struct PairRegistry {
    state: Mutex<RegistryState>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // The state is plain data with no invariant spanning a panic point.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new pair and mark both windows overlay-visible.
    pub fn link(&self, a: WindowId, b: WindowId) -> bool {
        let mut state = self.lock();
        if !state.table.link(a, b) {
            return false;
        }
        state.overlay.insert(a);
        state.overlay.insert(b);
        debug!(window_id = a.0, partner = b.0, "pair registered");
        true
    }

    pub fn unlink(&self, window: WindowId) -> Option<(WindowId, WindowId)> {
        let mut state = self.lock();
        let (a, b) = state.table.unlink(window)?;
        state.overlay.remove(&a);
        state.overlay.remove(&b);
        debug!(window_id = a.0, partner = b.0, "pair removed");
        Some((a, b))
    }

    pub fn partner_of(&self, window: WindowId) -> Option<WindowId> {
        self.lock().table.partner_of(window)
    }

    pub fn is_paired(&self, window: WindowId) -> bool {
        self.lock().table.is_paired(window)
    }

    pub fn shows_overlay(&self, window: WindowId) -> bool {
        self.lock().overlay.contains(&window)
    }

    pub fn paired_windows(&self) -> Vec<WindowId> {
        self.lock().table.windows()
    }

    pub fn pairs(&self) -> Vec<(WindowId, WindowId)> {
        self.lock().table.pairs()
    }

    pub fn pair_count(&self) -> usize {
        self.lock().table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: WindowId = WindowId(1);
    const B: WindowId = WindowId(2);
    const C: WindowId = WindowId(3);

    #[test]
    fn link_is_symmetric() {
        let mut t = PairTable::new();
        assert!(t.link(A, B));
        assert_eq!(t.partner_of(A), Some(B));
        assert_eq!(t.partner_of(B), Some(A));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn unpaired_window_has_no_entry() {
        let t = PairTable::new();
        assert!(!t.is_paired(A));
        assert_eq!(t.partner_of(A), None);
        assert!(t.is_empty());
    }

    #[test]
    fn a_window_cannot_have_two_partners() {
        let mut t = PairTable::new();
        assert!(t.link(A, B));
        assert!(!t.link(A, C));
        assert!(!t.link(C, B));
        assert_eq!(t.partner_of(A), Some(B));
        assert!(!t.is_paired(C));
    }

    #[test]
    fn a_window_cannot_pair_with_itself() {
        let mut t = PairTable::new();
        assert!(!t.link(A, A));
        assert!(t.is_empty());
    }

    #[test]
    fn unlink_from_either_side_removes_both_entries() {
        let mut t = PairTable::new();
        t.link(A, B);
        assert_eq!(t.unlink(B), Some((B, A)));
        assert!(!t.is_paired(A));
        assert!(!t.is_paired(B));
        assert!(t.is_empty());
    }

    #[test]
    fn unlink_unpaired_is_noop() {
        let mut t = PairTable::new();
        t.link(A, B);
        assert_eq!(t.unlink(C), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn relink_after_unlink() {
        let mut t = PairTable::new();
        t.link(A, B);
        t.unlink(A);
        assert!(t.link(A, C));
        assert_eq!(t.partner_of(C), Some(A));
        assert!(!t.is_paired(B));
    }

    #[test]
    fn pairs_lists_each_pair_once() {
        let mut t = PairTable::new();
        t.link(B, A);
        t.link(C, WindowId(10));
        assert_eq!(t.pairs(), vec![(A, B), (C, WindowId(10))]);
        assert_eq!(t.windows().len(), 4);
    }

    #[test]
    fn registry_tracks_overlay_with_pairs() {
        let r = PairRegistry::new();
        assert!(r.link(A, B));
        assert!(r.shows_overlay(A));
        assert!(r.shows_overlay(B));
        r.unlink(A);
        assert!(!r.shows_overlay(A));
        assert!(!r.shows_overlay(B));
        assert_eq!(r.pair_count(), 0);
    }

    #[test]
    fn registry_refused_link_leaves_overlay_alone() {
        let r = PairRegistry::new();
        r.link(A, B);
        assert!(!r.link(A, C));
        assert!(!r.shows_overlay(C));
    }
}
