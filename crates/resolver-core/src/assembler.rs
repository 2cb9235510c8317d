//! Call plan assembly and lookup table materialization.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use executor_resolver_transport::DryRunTransport;
use executor_resolver_types::{Address, CallGroup, LookupTable, PlannedGroup};
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::ResolutionError;
use crate::placeholder::PlaceholderBindings;
use crate::session::ResolutionSession;

/// Fetch every table in `keys` with at most `concurrency` requests in flight.
///
/// Duplicate keys are fetched once. All fetches are joined before returning;
/// the result holds one table per distinct key in first-seen order. Any
/// failed fetch fails the whole batch.
pub async fn fetch_tables<T>(
    transport: &T,
    keys: &[Address],
    concurrency: usize,
) -> Result<Vec<LookupTable>>
where
    T: DryRunTransport + ?Sized,
{
    let mut seen = HashSet::with_capacity(keys.len());
    let unique: Vec<Address> = keys.iter().copied().filter(|k| seen.insert(*k)).collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }
    debug!(count = unique.len(), concurrency, "fetching lookup tables");

    let results: Vec<(Address, Result<LookupTable>)> = stream::iter(unique.iter().copied())
        .map(|key| async move { (key, transport.fetch_table(&key).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut fetched = HashMap::with_capacity(results.len());
    for (key, result) in results {
        let table = result.map_err(|e| e.context(format!("fetch lookup table {}", key)))?;
        debug!(table = %key, entries = table.addresses.len(), "lookup table fetched");
        fetched.insert(key, table);
    }
    Ok(unique.iter().filter_map(|key| fetched.remove(key)).collect())
}

/// Turn the declared groups into executable ones.
///
/// Descriptor and group order is kept as declared. Each table referenced by
/// any group is fetched once (tables already in the session are reused), and
/// bound placeholders are substituted in every descriptor.
pub async fn assemble<T>(
    transport: &T,
    groups: &[PlannedGroup],
    session: &ResolutionSession,
    bindings: &PlaceholderBindings,
    concurrency: usize,
) -> Result<Vec<CallGroup>, ResolutionError>
where
    T: DryRunTransport + ?Sized,
{
    let referenced: Vec<Address> = groups
        .iter()
        .flat_map(|g| g.table_keys.iter().copied())
        .collect();
    let to_fetch = session.unknown_tables(&referenced);
    let fetched: HashMap<Address, LookupTable> =
        fetch_tables(transport, &to_fetch, concurrency)
            .await
            .map_err(ResolutionError::Transport)?
            .into_iter()
            .map(|t| (t.key, t))
            .collect();

    let materialize = |key: &Address| -> Result<LookupTable, ResolutionError> {
        fetched
            .get(key)
            .or_else(|| session.table(key))
            .cloned()
            .ok_or_else(|| ResolutionError::Transport(anyhow!("lookup table {} unavailable", key)))
    };

    groups
        .iter()
        .map(|group| {
            Ok(CallGroup {
                descriptors: group.descriptors.iter().map(|d| bindings.apply(d)).collect(),
                tables: group
                    .table_keys
                    .iter()
                    .map(&materialize)
                    .collect::<Result<Vec<_>, _>>()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use executor_resolver_transport::ScriptedTransport;
    use executor_resolver_types::constants::RESOLVER_PUBKEY_PAYER;
    use executor_resolver_types::{CallDescriptor, ResourceRef};

    fn addr(b: u8) -> Address {
        Address::new_from_array([b; 32])
    }

    fn table(b: u8) -> LookupTable {
        LookupTable::new(addr(b), vec![addr(b.wrapping_add(100)), addr(b.wrapping_add(101))])
    }

    #[tokio::test]
    async fn test_fetch_tables_keeps_key_order() {
        let transport = ScriptedTransport::new(addr(5))
            .with_table(table(1))
            .with_table(table(2))
            .with_table(table(3));
        let tables = fetch_tables(&transport, &[addr(3), addr(1), addr(2)], 2)
            .await
            .unwrap();
        let keys: Vec<_> = tables.iter().map(|t| t.key).collect();
        assert_eq!(keys, vec![addr(3), addr(1), addr(2)]);
    }

    #[tokio::test]
    async fn test_fetch_tables_dedups_keys() {
        let transport = ScriptedTransport::new(addr(5))
            .with_table(table(1))
            .with_table(table(2));
        let tables = fetch_tables(&transport, &[addr(2), addr(1), addr(2), addr(1)], 4)
            .await
            .unwrap();
        assert_eq!(tables, vec![table(2), table(1)]);
        assert_eq!(transport.table_fetch_count(&addr(1)), 1);
        assert_eq!(transport.table_fetch_count(&addr(2)), 1);
    }

    #[tokio::test]
    async fn test_fetch_tables_fails_on_any_error() {
        let transport = ScriptedTransport::new(addr(5)).with_table(table(1));
        let err = fetch_tables(&transport, &[addr(1), addr(2)], 4).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[tokio::test]
    async fn test_shared_table_fetched_once() {
        let transport = ScriptedTransport::new(addr(5)).with_table(table(9));
        let descriptor = CallDescriptor::new(addr(7), vec![ResourceRef::readonly(addr(1))], vec![]);
        let groups = vec![
            PlannedGroup {
                descriptors: vec![descriptor.clone(), descriptor.clone()],
                table_keys: vec![addr(9)],
            },
            PlannedGroup {
                descriptors: vec![descriptor],
                table_keys: vec![addr(9)],
            },
        ];
        let out = assemble(
            &transport,
            &groups,
            &ResolutionSession::new(),
            &PlaceholderBindings::new(),
            8,
        )
        .await
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].tables, vec![table(9)]);
        assert_eq!(out[1].tables, vec![table(9)]);
        assert_eq!(transport.table_fetch_count(&addr(9)), 1);
    }

    #[tokio::test]
    async fn test_known_tables_are_reused() {
        let transport = ScriptedTransport::new(addr(5));
        let mut session = ResolutionSession::new();
        session.merge(&[], vec![table(9)]);
        let groups = vec![PlannedGroup {
            descriptors: vec![],
            table_keys: vec![addr(9)],
        }];
        let out = assemble(&transport, &groups, &session, &PlaceholderBindings::new(), 8)
            .await
            .unwrap();
        assert_eq!(out[0].tables, vec![table(9)]);
        assert_eq!(transport.total_table_fetches(), 0);
    }

    #[tokio::test]
    async fn test_substitutes_and_preserves_order() {
        let transport = ScriptedTransport::new(addr(5));
        let first = CallDescriptor::new(
            addr(7),
            vec![ResourceRef::writable(RESOLVER_PUBKEY_PAYER)],
            vec![1],
        );
        let second = CallDescriptor::new(addr(8), vec![], vec![2]);
        let groups = vec![PlannedGroup {
            descriptors: vec![first, second.clone()],
            table_keys: vec![],
        }];
        let out = assemble(
            &transport,
            &groups,
            &ResolutionSession::new(),
            &PlaceholderBindings::for_caller(addr(1)),
            8,
        )
        .await
        .unwrap();
        assert_eq!(out[0].descriptors[0].accounts, vec![ResourceRef::new(addr(1), true, true)]);
        assert_eq!(out[0].descriptors[1], second);
    }
}
