//! Arena-backed version chains. Nodes live in a per-chain vector and link
//! through indices, so popping a rolled-back head leaks nothing and whole
//! chains drop with their table.

use hashbrown::HashMap;

/// One historical version of a row.
#[derive(Debug, Clone)]
pub struct VersionNode {
    values: Vec<String>,
    xmin: String,
    xmax: Option<String>,
    committed: bool,
    next: Option<usize>,
}

impl VersionNode {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn xmin(&self) -> &str {
        &self.xmin
    }

    pub fn xmax(&self) -> Option<&str> {
        self.xmax.as_deref()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Singly linked list of versions, head = most recent. The chain is never
/// reordered; commit flips the flag in place.
#[derive(Debug, Default)]
pub struct VersionChain {
    nodes: Vec<VersionNode>,
    head: Option<usize>,
}

impl VersionChain {
    /// Pushes a new uncommitted head.
    pub fn push_uncommitted(&mut self, values: Vec<String>, xmin: impl Into<String>) {
        let idx = self.nodes.len();
        self.nodes.push(VersionNode {
            values,
            xmin: xmin.into(),
            xmax: None,
            committed: false,
            next: self.head,
        });
        self.head = Some(idx);
    }

    /// Commits the head iff it is `txid`'s own uncommitted version.
    pub fn commit_head(&mut self, txid: &str) -> bool {
        let Some(head) = self.head else {
            return false;
        };
        let node = &mut self.nodes[head];
        if node.xmin == txid && !node.committed {
            node.committed = true;
            true
        } else {
            false
        }
    }

    /// Pops the head iff it is `txid`'s own uncommitted version. The slot
    /// is reclaimed when it sits at the arena tail.
    pub fn rollback_head(&mut self, txid: &str) -> bool {
        let Some(head) = self.head else {
            return false;
        };
        let node = &self.nodes[head];
        if node.xmin != txid || node.committed {
            return false;
        }
        self.head = node.next;
        if head == self.nodes.len() - 1 {
            self.nodes.pop();
        }
        true
    }

    /// Stamps `xmax` on the first committed version that has none.
    pub fn mark_delete_commit(&mut self, txid: &str) -> bool {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = &mut self.nodes[idx];
            if node.committed && node.xmax.is_none() {
                node.xmax = Some(txid.to_string());
                return true;
            }
            cursor = node.next;
        }
        false
    }

    /// Walks head→tail and returns the first version visible to `reader`
    /// against the caller-supplied active set: either the reader's own
    /// uncommitted write, or a committed, undeleted version whose writer
    /// is not in flight.
    pub fn lookup_visible(&self, reader: &str, active: &[String]) -> Option<&[String]> {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if !node.committed {
                if node.xmin == reader {
                    return Some(&node.values);
                }
            } else if node.xmax.is_none() && !active.iter().any(|t| t == &node.xmin) {
                return Some(&node.values);
            }
            cursor = node.next;
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// All version chains, keyed by table name and primary-key value.
#[derive(Debug, Default)]
pub struct VersionStore {
    chains: HashMap<String, HashMap<String, VersionChain>>,
}

impl VersionStore {
    /// Pushes an uncommitted version for the row's primary key. Fails when
    /// `pk_index` is out of range.
    pub fn insert_uncommitted(
        &mut self,
        table: &str,
        values: Vec<String>,
        txid: &str,
        pk_index: usize,
    ) -> bool {
        let Some(pk) = values.get(pk_index).cloned() else {
            return false;
        };
        self.chains
            .entry(table.to_string())
            .or_default()
            .entry(pk)
            .or_default()
            .push_uncommitted(values, txid);
        true
    }

    pub fn commit_insert(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.chain_mut(table, pk)
            .map_or(false, |chain| chain.commit_head(txid))
    }

    pub fn rollback_insert(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.chain_mut(table, pk)
            .map_or(false, |chain| chain.rollback_head(txid))
    }

    pub fn mark_delete_commit(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.chain_mut(table, pk)
            .map_or(false, |chain| chain.mark_delete_commit(txid))
    }

    pub fn lookup_visible(
        &self,
        table: &str,
        pk: &str,
        reader: &str,
        active: &[String],
    ) -> Option<&[String]> {
        self.chains
            .get(table)?
            .get(pk)?
            .lookup_visible(reader, active)
    }

    /// Drops every chain belonging to a table.
    pub fn clear_table(&mut self, table: &str) {
        self.chains.remove(table);
    }

    fn chain_mut(&mut self, table: &str, pk: &str) -> Option<&mut VersionChain> {
        self.chains.get_mut(table)?.get_mut(pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn uncommitted_version_visible_only_to_its_writer() {
        let mut store = VersionStore::default();
        assert!(store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0));

        assert_eq!(store.lookup_visible("v", "1", "T2", &[]), None);
        assert_eq!(
            store.lookup_visible("v", "1", "T1", &[]),
            Some(&row(&["1", "A"])[..])
        );
    }

    #[test]
    fn commit_makes_version_visible_to_all() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        assert!(store.commit_insert("v", "1", "T1"));

        assert_eq!(
            store.lookup_visible("v", "1", "T2", &[]),
            Some(&row(&["1", "A"])[..])
        );
    }

    #[test]
    fn commit_requires_matching_writer() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        assert!(!store.commit_insert("v", "1", "T2"));
        assert!(!store.commit_insert("v", "2", "T1"));

        // Double commit is rejected.
        assert!(store.commit_insert("v", "1", "T1"));
        assert!(!store.commit_insert("v", "1", "T1"));
    }

    #[test]
    fn rollback_pops_only_the_writers_uncommitted_head() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        store.commit_insert("v", "1", "T1");
        store.insert_uncommitted("v", row(&["1", "B"]), "T2", 0);

        // Wrong transaction cannot pop.
        assert!(!store.rollback_insert("v", "1", "T1"));
        assert!(store.rollback_insert("v", "1", "T2"));

        // The committed version resurfaces.
        assert_eq!(
            store.lookup_visible("v", "1", "T3", &[]),
            Some(&row(&["1", "A"])[..])
        );

        // A committed head cannot be rolled back.
        assert!(!store.rollback_insert("v", "1", "T1"));
    }

    #[test]
    fn active_writers_are_invisible_to_snapshot_readers() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        store.commit_insert("v", "1", "T1");

        let active = vec!["T1".to_string()];
        assert_eq!(store.lookup_visible("v", "1", "T2", &active), None);
        assert_eq!(
            store.lookup_visible("v", "1", "T2", &[]),
            Some(&row(&["1", "A"])[..])
        );
    }

    #[test]
    fn delete_stamp_hides_the_version() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        store.commit_insert("v", "1", "T1");

        assert!(store.mark_delete_commit("v", "1", "T2"));
        assert_eq!(store.lookup_visible("v", "1", "T3", &[]), None);

        // Only the first committed live version gets stamped.
        assert!(!store.mark_delete_commit("v", "1", "T3"));
    }

    #[test]
    fn newer_version_shadows_older_in_chain_order() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "old"]), "T1", 0);
        store.commit_insert("v", "1", "T1");
        store.insert_uncommitted("v", row(&["1", "new"]), "T2", 0);
        store.commit_insert("v", "1", "T2");

        assert_eq!(
            store.lookup_visible("v", "1", "T3", &[]),
            Some(&row(&["1", "new"])[..])
        );

        // With T2 still in the active set, the older version is returned.
        let active = vec!["T2".to_string()];
        assert_eq!(
            store.lookup_visible("v", "1", "T3", &active),
            Some(&row(&["1", "old"])[..])
        );
    }

    #[test]
    fn pk_index_out_of_range_is_rejected() {
        let mut store = VersionStore::default();
        assert!(!store.insert_uncommitted("v", row(&["1"]), "T1", 3));
    }

    #[test]
    fn clear_table_drops_all_chains() {
        let mut store = VersionStore::default();
        store.insert_uncommitted("v", row(&["1", "A"]), "T1", 0);
        store.commit_insert("v", "1", "T1");
        store.clear_table("v");
        assert_eq!(store.lookup_visible("v", "1", "T1", &[]), None);
    }
}
