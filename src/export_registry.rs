//! Persisted catalog of generated exports, most recent first.

use crate::constants::{EXPORTS_BUCKET, STORE_VERSION};
use crate::error::StoreError;
use crate::persistence::{load_bucket, save_bucket, Persistence};
use crate::types::{ExportId, ExportKind, ExportRecord};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExportsState {
    #[serde(default)]
    exports: Vec<ExportRecord>,
}

/// Ordered list of export records. Every mutation persists the resulting list.
#[derive(Debug, Clone, Default)]
pub struct ExportRegistry {
    exports: Vec<ExportRecord>,
}

impl ExportRegistry {
    /// Restores the registry from `persistence`, or starts empty.
    pub fn load(persistence: &dyn Persistence) -> Self {
        let state: ExportsState =
            load_bucket(persistence, EXPORTS_BUCKET, STORE_VERSION).unwrap_or_default();
        Self { exports: state.exports }
    }

    /// All records, most recent first.
    pub fn exports(&self) -> &[ExportRecord] {
        &self.exports
    }

    /// Looks up a record by id.
    pub fn get(&self, id: ExportId) -> Option<&ExportRecord> {
        self.exports.iter().find(|e| e.id == id)
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Prepends `record`.
    ///
    /// The in-memory list only changes once the backend accepted the new
    /// list, so a failed write leaves memory and storage in agreement.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateId`] if a record with the same id exists, or
    /// whatever the backend reports while persisting.
    pub fn add(
        &mut self,
        record: ExportRecord,
        persistence: &mut dyn Persistence,
    ) -> Result<(), StoreError> {
        if self.get(record.id).is_some() {
            return Err(StoreError::DuplicateId(record.id));
        }
        log::info!("Registering export {} ({})", record.filename, record.size_bytes);
        self.exports.insert(0, record);
        if let Err(e) = self.persist(persistence) {
            let record = self.exports.remove(0);
            log::warn!("Export {} not registered: {e}", record.filename);
            return Err(e);
        }
        Ok(())
    }

    /// Removes the record with `id`; absent ids are a no-op.
    pub fn remove(
        &mut self,
        id: ExportId,
        persistence: &mut dyn Persistence,
    ) -> Result<(), StoreError> {
        let Some(index) = self.exports.iter().position(|e| e.id == id) else {
            return self.persist(persistence);
        };
        let record = self.exports.remove(index);
        if let Err(e) = self.persist(persistence) {
            self.exports.insert(index, record);
            return Err(e);
        }
        Ok(())
    }

    /// Removes every record.
    pub fn clear(&mut self, persistence: &mut dyn Persistence) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.exports);
        if let Err(e) = self.persist(persistence) {
            self.exports = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self, persistence: &mut dyn Persistence) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct ExportsRef<'a> {
            exports: &'a [ExportRecord],
        }
        save_bucket(
            persistence,
            EXPORTS_BUCKET,
            STORE_VERSION,
            &ExportsRef { exports: &self.exports },
        )
    }
}

/// Filename-safe timestamp: RFC 3339 with millisecond precision where `:`
/// and `.` are replaced by `-` (e.g. `2024-03-05T10-15-30-123Z`).
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Wraps `bytes` into a new [`ExportRecord`] with a fresh id and a
/// timestamped filename.
pub fn package_export(kind: ExportKind, bytes: &[u8], now: DateTime<Utc>) -> ExportRecord {
    let filename = format!(
        "{}-{}.{}",
        kind.filename_prefix(),
        timestamp_slug(now),
        kind.extension()
    );
    ExportRecord {
        id: Uuid::new_v4(),
        kind,
        name: kind.display_name().to_string(),
        filename,
        mime: kind.mime().to_string(),
        size_bytes: bytes.len() as u64,
        created_at: now,
        payload: encode_data_url(kind.mime(), bytes),
    }
}

/// Encodes bytes as a base64 `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{b64}")
}

/// Decodes the payload of a record back into the original bytes.
pub fn decode_payload(record: &ExportRecord) -> Result<Vec<u8>, StoreError> {
    let (header, data) = record
        .payload
        .split_once(',')
        .ok_or_else(|| StoreError::InvalidPayload("missing ',' separator".into()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(StoreError::InvalidPayload(format!("unexpected header '{header}'")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| StoreError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use chrono::TimeZone;

    /// Backend that reads fine but refuses every write.
    struct FullStorage(MemoryPersistence);

    impl Persistence for FullStorage {
        fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.load(key)
        }
        fn store(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("QuotaExceeded".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("QuotaExceeded".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 15, 30).unwrap()
    }

    fn record(kind: ExportKind) -> ExportRecord {
        package_export(kind, b"payload", now())
    }

    #[test]
    fn add_prepends_and_remove_and_clear_persist() {
        let mut persistence = MemoryPersistence::new();
        let mut registry = ExportRegistry::load(&persistence);

        let a = record(ExportKind::Pdf);
        let b = record(ExportKind::CommentsCsv);
        registry.add(a.clone(), &mut persistence).unwrap();
        registry.add(b.clone(), &mut persistence).unwrap();

        let ids: Vec<_> = registry.exports().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        registry.remove(b.id, &mut persistence).unwrap();
        assert_eq!(registry.exports(), &[a.clone()]);
        assert_eq!(ExportRegistry::load(&persistence).exports(), &[a.clone()]);

        registry.clear(&mut persistence).unwrap();
        assert!(registry.is_empty());
        assert!(ExportRegistry::load(&persistence).is_empty());
    }

    #[test]
    fn remove_of_unknown_id_is_a_no_op() {
        let mut persistence = MemoryPersistence::new();
        let mut registry = ExportRegistry::default();
        registry.add(record(ExportKind::Pdf), &mut persistence).unwrap();

        registry.remove(Uuid::new_v4(), &mut persistence).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut persistence = MemoryPersistence::new();
        let mut registry = ExportRegistry::default();
        let a = record(ExportKind::Pdf);
        registry.add(a.clone(), &mut persistence).unwrap();

        let err = registry.add(a.clone(), &mut persistence).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == a.id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn packaged_record_is_self_contained() {
        let rec = record(ExportKind::CategoriesCsv);
        assert_eq!(rec.filename, "categories-export-2024-03-05T10-15-30-000Z.csv");
        assert_eq!(rec.mime, "text/csv");
        assert_eq!(rec.size_bytes, 7);
        assert!(rec.payload.starts_with("data:text/csv;base64,"));
        assert_eq!(decode_payload(&rec).unwrap(), b"payload");
    }

    #[test]
    fn malformed_payload_is_reported() {
        let mut rec = record(ExportKind::Pdf);
        rec.payload = "not a data url".into();
        assert!(matches!(decode_payload(&rec), Err(StoreError::InvalidPayload(_))));
    }

    #[test]
    fn failed_writes_leave_the_list_unchanged() {
        let mut memory = MemoryPersistence::new();
        let mut registry = ExportRegistry::default();
        let kept = record(ExportKind::Pdf);
        registry.add(kept.clone(), &mut memory).unwrap();

        let mut full = FullStorage(memory);
        let err = registry.add(record(ExportKind::CommentsCsv), &mut full).unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref msg) if msg == "QuotaExceeded"));
        assert_eq!(registry.exports(), &[kept.clone()]);

        assert!(registry.remove(kept.id, &mut full).is_err());
        assert_eq!(registry.exports(), &[kept.clone()]);

        assert!(registry.clear(&mut full).is_err());
        assert_eq!(registry.exports(), &[kept.clone()]);
        assert_eq!(ExportRegistry::load(&full).exports(), &[kept]);
    }
}
