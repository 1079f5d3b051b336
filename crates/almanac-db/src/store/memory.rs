//! In-process [`EventStore`] keyed the same way as the database.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EventStore;
use crate::error::DbResult;
use crate::model::{EventOccurrence, EventSpecification};

#[derive(Default)]
struct MemoryState {
    specifications: BTreeMap<Uuid, EventSpecification>,
    /// Keyed by `(specification_id, start_at)`, the same identity the
    /// database enforces with a unique constraint.
    occurrences: BTreeMap<(Uuid, DateTime<Utc>), EventOccurrence>,
}

/// Stores everything behind a single mutex, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored occurrences across all specifications.
    pub async fn occurrence_count(&self) -> usize {
        self.state.lock().await.occurrences.len()
    }
}

impl EventStore for MemoryStore {
    fn save_specification<'a>(
        &'a self,
        spec: &'a EventSpecification,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            self.state
                .lock()
                .await
                .specifications
                .insert(spec.id, spec.clone());
            Ok(())
        })
    }

    fn specification<'a>(
        &'a self,
        id: Uuid,
    ) -> BoxFuture<'a, DbResult<Option<EventSpecification>>> {
        Box::pin(async move { Ok(self.state.lock().await.specifications.get(&id).cloned()) })
    }

    fn specifications<'a>(&'a self) -> BoxFuture<'a, DbResult<Vec<EventSpecification>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut specs: Vec<_> = state.specifications.values().cloned().collect();
            specs.sort_by_key(|spec| (spec.created_at, spec.id));
            Ok(specs)
        })
    }

    fn occurrences_at<'a>(
        &'a self,
        specification_id: Uuid,
        instants: &'a [DateTime<Utc>],
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut found: Vec<_> = instants
                .iter()
                .filter_map(|instant| state.occurrences.get(&(specification_id, *instant)))
                .cloned()
                .collect();
            found.sort_by_key(|occurrence| occurrence.start_at);
            found.dedup_by_key(|occurrence| occurrence.start_at);
            Ok(found)
        })
    }

    fn insert_occurrences<'a>(
        &'a self,
        occurrences: &'a [EventOccurrence],
    ) -> BoxFuture<'a, DbResult<usize>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let mut inserted = 0;
            for occurrence in occurrences {
                let key = (occurrence.specification_id, occurrence.start_at);
                if let Entry::Vacant(slot) = state.occurrences.entry(key) {
                    slot.insert(occurrence.clone());
                    inserted += 1;
                }
            }
            tracing::trace!(inserted, offered = occurrences.len(), "Inserted occurrences");
            Ok(inserted)
        })
    }

    fn delete_occurrences_from<'a>(
        &'a self,
        specification_id: Uuid,
        from: DateTime<Utc>,
    ) -> BoxFuture<'a, DbResult<usize>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let before = state.occurrences.len();
            state
                .occurrences
                .retain(|(spec_id, start_at), _| *spec_id != specification_id || *start_at < from);
            Ok(before - state.occurrences.len())
        })
    }

    fn occurrences_for<'a>(
        &'a self,
        specification_id: Uuid,
    ) -> BoxFuture<'a, DbResult<Vec<EventOccurrence>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .occurrences
                .range(
                    (specification_id, DateTime::<Utc>::MIN_UTC)
                        ..=(specification_id, DateTime::<Utc>::MAX_UTC),
                )
                .map(|(_, occurrence)| occurrence.clone())
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpecificationDraft;
    use chrono::{TimeDelta, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2011, 1, 15, 12, 0, 0).unwrap()
    }

    fn occurrences(spec: &EventSpecification, days: i64) -> Vec<EventOccurrence> {
        (0..days)
            .map(|day| EventOccurrence::from_specification(spec, start() + TimeDelta::days(day)))
            .collect()
    }

    #[test_log::test(tokio::test)]
    async fn duplicate_instants_are_skipped() {
        let store = MemoryStore::new();
        let spec = SpecificationDraft::new("walk the dog").build(start());

        let first = store.insert_occurrences(&occurrences(&spec, 3)).await.unwrap();
        let second = store.insert_occurrences(&occurrences(&spec, 5)).await.unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 2);
        assert_eq!(store.occurrence_count().await, 5);
    }

    #[test_log::test(tokio::test)]
    async fn lookups_are_scoped_to_the_specification() {
        let store = MemoryStore::new();
        let dog = SpecificationDraft::new("walk the dog").build(start());
        let trash = SpecificationDraft::new("take out the trash").build(start());
        store.insert_occurrences(&occurrences(&dog, 3)).await.unwrap();
        store.insert_occurrences(&occurrences(&trash, 2)).await.unwrap();

        let instants = [start(), start() + TimeDelta::days(2), start() + TimeDelta::days(9)];
        let found = store.occurrences_at(dog.id, &instants).await.unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|o| o.specification_id == dog.id));
        assert_eq!(store.occurrences_for(trash.id).await.unwrap().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn delete_from_keeps_earlier_occurrences() {
        let store = MemoryStore::new();
        let spec = SpecificationDraft::new("walk the dog").build(start());
        store.insert_occurrences(&occurrences(&spec, 5)).await.unwrap();

        let deleted = store
            .delete_occurrences_from(spec.id, start() + TimeDelta::days(2))
            .await
            .unwrap();

        assert_eq!(deleted, 3);
        let remaining = store.occurrences_for(spec.id).await.unwrap();
        assert_eq!(
            remaining.iter().map(|o| o.start_at).collect::<Vec<_>>(),
            vec![start(), start() + TimeDelta::days(1)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn specifications_round_trip() {
        let store = MemoryStore::new();
        let mut spec = SpecificationDraft::new("walk the dog").build(start());
        store.save_specification(&spec).await.unwrap();

        spec.description = Some("walk the cat".to_string());
        store.save_specification(&spec).await.unwrap();

        let all = store.specifications().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            store.specification(spec.id).await.unwrap().and_then(|s| s.description),
            Some("walk the cat".to_string())
        );
    }
}
