//! The decrypted entry cache and its search projection.

use shepherd_api::Entry;

/// The last-fetched entry list, in backend order.
///
/// A cache exists only while the session is unlocked and only after an
/// explicit load round trip; it is replaced wholesale, never patched.
/// Filtering is a pure projection over the snapshot — it never touches
/// the network.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: Vec<Entry>,
}

impl EntryCache {
    /// Wrap a fully-fetched entry list.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// All entries, in the order the backend returned them.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose name or username contains `query`,
    /// case-insensitively, preserving order. An empty query matches
    /// everything.
    pub fn filter(&self, query: &str) -> Vec<&Entry> {
        self.filter_indexed(query).into_iter().map(|(_, e)| e).collect()
    }

    /// Like [`filter`](EntryCache::filter), but each hit carries its
    /// position in the *unfiltered* cache — the backend-order index
    /// that entry mutations address. Displays must print this index,
    /// not the hit's position in the filtered result.
    pub fn filter_indexed(&self, query: &str) -> Vec<(usize, &Entry)> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                needle.is_empty()
                    || e.name.to_lowercase().contains(&needle)
                    || (!e.username.is_empty() && e.username.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
