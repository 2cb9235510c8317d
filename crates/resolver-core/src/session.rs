//! Per-resolution accumulator of discovered accounts and lookup tables.

use std::collections::{HashMap, HashSet};

use executor_resolver_types::{Address, LookupTable};

/// Ordered, deduplicated state of one `resolve()` call.
///
/// Both sets only grow, and keep first-seen order: the probe hands accounts
/// to the program positionally.
#[derive(Debug, Default, Clone)]
pub struct ResolutionSession {
    refs: Vec<Address>,
    ref_set: HashSet<Address>,
    table_keys: Vec<Address>,
    /// Materialized contents of every known table.
    tables: HashMap<Address, LookupTable>,
    round: usize,
}

impl ResolutionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known_refs(&self) -> &[Address] {
        &self.refs
    }

    pub fn known_table_keys(&self) -> &[Address] {
        &self.table_keys
    }

    pub fn knows_ref(&self, address: &Address) -> bool {
        self.ref_set.contains(address)
    }

    pub fn knows_table(&self, key: &Address) -> bool {
        self.tables.contains_key(key)
    }

    /// Materialized tables in first-seen order.
    pub fn known_tables(&self) -> Vec<LookupTable> {
        self.table_keys
            .iter()
            .filter_map(|k| self.tables.get(k).cloned())
            .collect()
    }

    pub fn table(&self, key: &Address) -> Option<&LookupTable> {
        self.tables.get(key)
    }

    /// Table keys from `keys` not yet known, deduplicated, in first-seen order.
    pub fn unknown_tables(&self, keys: &[Address]) -> Vec<Address> {
        let mut seen = HashSet::new();
        keys.iter()
            .filter(|k| !self.knows_table(k) && seen.insert(**k))
            .copied()
            .collect()
    }

    /// Append unseen references and tables; returns how many were new.
    ///
    /// Tables must already be materialized; a table whose key is known is ignored.
    pub fn merge(&mut self, refs: &[Address], tables: Vec<LookupTable>) -> usize {
        let mut added = 0;
        for address in refs {
            if self.ref_set.insert(*address) {
                self.refs.push(*address);
                added += 1;
            }
        }
        for table in tables {
            if !self.tables.contains_key(&table.key) {
                self.table_keys.push(table.key);
                self.tables.insert(table.key, table);
                added += 1;
            }
        }
        added
    }

    /// Advance to the next round and return its number (1-based).
    pub fn begin_round(&mut self) -> usize {
        self.round += 1;
        self.round
    }

    pub fn round(&self) -> usize {
        self.round
    }
}
