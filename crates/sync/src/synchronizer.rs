#![forbid(unsafe_code)]

use crate::error::{PageError, RecordError, RecordFailure};
use crate::source::DataSource;
use rp_core::entity::EntityType;
use rp_core::ids::{Cursor, SurrogateId};
use rp_core::keys::VisitKey;
use rp_core::mapping::{map_record, raw_cursor};
use rp_core::records::{ClientRecord, FormRecord, MappedRecord, PricelistRecord};
use rp_storage::{
    ClientWrite, FormWrite, NaturalKey, PricelistItemWrite, PricelistWrite, SqliteStore,
    WriteOutcome,
};
use serde_json::Value;

/// What one page did to one entity type.
#[derive(Debug)]
pub struct PageReport {
    pub entity: EntityType,
    pub fetched: usize,
    pub processed: usize,
    pub failures: Vec<RecordFailure>,
    pub checkpoint_before: Cursor,
    pub checkpoint_after: Cursor,
    pub advanced: bool,
}

/// Pulls pages for one entity type at a time and writes them through the store.
///
/// Owns its store connection. No transaction is open while a page is fetched:
/// every resolve and write commits on its own.
#[derive(Debug)]
pub struct EntitySynchronizer<S> {
    source: S,
    store: SqliteStore,
}

impl<S: DataSource> EntitySynchronizer<S> {
    pub fn new(source: S, store: SqliteStore) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Syncs the page that follows the stored checkpoint of `entity`.
    pub fn sync_next_page(&mut self, entity: EntityType) -> Result<PageReport, PageError> {
        let cursor = self
            .store
            .checkpoint_get(entity)
            .map_err(|source| PageError::Checkpoint { entity, source })?;
        self.sync_one_page(entity, cursor)
    }

    /// Fetches the records after `cursor`, writes each one independently and
    /// then moves the checkpoint to the highest cursor that was written.
    ///
    /// `Err` means the page as a whole failed (fetch, decode or checkpoint);
    /// records that fail on their own are listed in `PageReport::failures`.
    pub fn sync_one_page(
        &mut self,
        entity: EntityType,
        cursor: Cursor,
    ) -> Result<PageReport, PageError> {
        let page = self
            .source
            .fetch_page(entity, cursor)
            .map_err(|source| PageError::from_source(entity, source))?;

        let fetched = page.records.len();
        let mut processed = 0;
        let mut failures = Vec::new();
        let mut max_written: Option<Cursor> = None;

        for (index, raw) in page.records.iter().enumerate() {
            match self.process_record(entity, raw) {
                Ok((record_cursor, outcome)) => {
                    processed += 1;
                    max_written = max_written.max(Some(record_cursor));
                    log::debug!("{entity} record {index} at {record_cursor}: {outcome:?}");
                }
                Err(error) => {
                    let key = failure_key(entity, raw, index);
                    log::warn!("{entity} record {index} ({key}) skipped: {error}");
                    failures.push(RecordFailure { index, key, error });
                }
            }
        }

        let advanced = match max_written {
            Some(next) => self
                .store
                .checkpoint_set(entity, next)
                .map_err(|source| PageError::Checkpoint { entity, source })?,
            None => false,
        };
        // An advanced checkpoint holds exactly `next`.
        let checkpoint_after = match max_written {
            Some(next) if advanced => next,
            _ => self
                .store
                .checkpoint_get(entity)
                .map_err(|source| PageError::Checkpoint { entity, source })?,
        };

        if fetched > 0 {
            log::info!(
                "{entity}: fetched {fetched}, processed {processed}, failed {}, checkpoint {cursor} -> {checkpoint_after}",
                failures.len()
            );
        }

        Ok(PageReport {
            entity,
            fetched,
            processed,
            failures,
            checkpoint_before: cursor,
            checkpoint_after,
            advanced,
        })
    }

    fn process_record(
        &mut self,
        entity: EntityType,
        raw: &Value,
    ) -> Result<(Cursor, WriteOutcome), RecordError> {
        let record = map_record(entity, raw)?;
        let cursor = record.cursor();
        let outcome = match &record {
            MappedRecord::Client(client) => self.write_client(client)?,
            MappedRecord::Form(form) => self.write_form(form)?,
            MappedRecord::Pricelist(pricelist) => self.write_pricelist(pricelist)?,
        };
        Ok((cursor, outcome))
    }

    fn write_client(&mut self, record: &ClientRecord) -> Result<WriteOutcome, RecordError> {
        let store = &mut self.store;
        let request = ClientWrite {
            code: record.code.clone(),
            source_timestamp: record.cursor.get(),
            active: record.active,
            name_id: resolve_opt(store, record.name.as_ref())?,
            address_id: resolve_opt(store, record.address.as_ref())?,
            contact_id: resolve_opt(store, record.contact.as_ref())?,
            territory_id: resolve_opt(store, record.territory.as_ref())?,
            representative_id: resolve_opt(store, record.representative.as_ref())?,
            contact_name_id: resolve_opt(store, record.contact_name.as_ref())?,
            contact_title_id: resolve_opt(store, record.contact_title.as_ref())?,
            note_id: resolve_opt(store, record.note.as_ref())?,
            email: record.email.clone(),
            account_code: record.account_code.clone(),
            status: record.status.clone(),
            tag: record.tag.clone(),
            custom_fields: record
                .custom_fields
                .iter()
                .map(|field| (field.field.clone(), field.value.clone()))
                .collect(),
            pricelists: record.pricelists.clone(),
        };
        store.write_client(&request).map_err(RecordError::Write)
    }

    fn write_form(&mut self, record: &FormRecord) -> Result<WriteOutcome, RecordError> {
        let store = &mut self.store;
        let client_ref_id = resolve_opt(store, record.client.as_ref())?;
        let representative_id = resolve_opt(store, record.representative.as_ref())?;

        // A visit needs its start, its representative and its client.
        let visit_id = match (record.visit_start.as_ref(), representative_id, client_ref_id) {
            (Some(start), Some(representative), Some(client)) => {
                let visit = VisitKey {
                    start_time: resolve(store, start)?,
                    end_time: resolve_opt(store, record.visit_end.as_ref())?,
                    representative,
                    client,
                };
                Some(resolve(store, &visit)?)
            }
            _ => None,
        };

        let request = FormWrite {
            external_id: record.cursor.get(),
            name_id: resolve(store, &record.form_name)?,
            client_ref_id,
            representative_id,
            address_id: resolve_opt(store, record.address.as_ref())?,
            contact_id: resolve_opt(store, record.contact.as_ref())?,
            territory_id: resolve_opt(store, record.territory.as_ref())?,
            latitude_id: resolve_opt(store, record.latitude.as_ref())?,
            longitude_id: resolve_opt(store, record.longitude.as_ref())?,
            submitted_at_id: resolve_opt(store, record.submitted_at.as_ref())?,
            visit_id,
            visit_external_id: record.visit_external_id,
            signature_url: record.signature_url.clone(),
            email: record.email.clone(),
            items: record
                .items
                .iter()
                .map(|item| (item.field.clone(), item.value.clone()))
                .collect(),
        };
        store.write_form(&request).map_err(RecordError::Write)
    }

    fn write_pricelist(&mut self, record: &PricelistRecord) -> Result<WriteOutcome, RecordError> {
        let store = &mut self.store;
        let mut items = Vec::with_capacity(record.items.len());
        for item in &record.items {
            items.push(PricelistItemWrite {
                product_id: resolve(store, &item.product)?,
                price: item.price,
                active: item.active,
                client_ref_id: resolve_opt(store, item.client.as_ref())?,
                manufacture_id: item.manufacture_id.clone(),
                available_from_id: resolve_opt(store, item.available_from.as_ref())?,
                available_to_id: resolve_opt(store, item.available_to.as_ref())?,
                min_quantity: item.min_quantity,
                max_quantity: item.max_quantity,
            });
        }

        let request = PricelistWrite {
            name: record.name.clone(),
            external_id: record.cursor.get(),
            is_default: record.is_default,
            active: record.active,
            use_prices: record.use_prices,
            items,
        };
        store.write_pricelist(&request).map_err(RecordError::Write)
    }
}

fn resolve<K: NaturalKey>(store: &mut SqliteStore, key: &K) -> Result<SurrogateId, RecordError> {
    store
        .resolve(key)
        .map_err(|source| RecordError::Resolution {
            table: key.table(),
            source,
        })
}

fn resolve_opt<K: NaturalKey>(
    store: &mut SqliteStore,
    key: Option<&K>,
) -> Result<Option<SurrogateId>, RecordError> {
    key.map(|key| resolve(store, key)).transpose()
}

fn failure_key(entity: EntityType, raw: &Value, index: usize) -> String {
    if let Ok(record) = map_record(entity, raw) {
        return record.display_key();
    }
    match raw_cursor(entity, raw) {
        Some(cursor) => format!("{entity} {}={cursor}", entity.cursor_field()),
        None => format!("{entity} #{index}"),
    }
}
