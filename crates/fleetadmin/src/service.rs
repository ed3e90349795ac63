//! The record-store seam between the console and the outside world.
//!
//! The grid engine emits mutation requests; everything that actually
//! touches a backend goes through [`RecordStore`]. Two implementations:
//! [`HttpStore`] speaks plain JSON CRUD against the fleet API, and
//! [`MemoryStore`] keeps records in process for `--demo` mode and tests
//! (including injectable failures to exercise the rollback paths).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;
use url::Url;

use grid_engine::MutationError;

/// Generic CRUD over one entity collection.
///
/// Failures are reported as [`MutationError`]: `Network` for transport
/// problems, `Server` for requests the backend rejected.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, entity: &str) -> Result<Vec<JsonValue>, MutationError>;
    async fn create(&self, entity: &str, record: JsonValue) -> Result<JsonValue, MutationError>;
    async fn update(
        &self,
        entity: &str,
        id: &str,
        record: JsonValue,
    ) -> Result<JsonValue, MutationError>;
    async fn delete(&self, entity: &str, id: &str) -> Result<(), MutationError>;
}

// ---- HTTP ----------------------------------------------------------------

/// REST client: `GET/POST {base}/{entity}`, `PUT/DELETE {base}/{entity}/{id}`.
///
/// `ureq` is a blocking client, so every call runs under `spawn_blocking`.
pub struct HttpStore {
    base: Url,
    agent: ureq::Agent,
}

impl HttpStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)?;
        // Normalize so `join` appends instead of replacing the last segment.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self {
            base,
            agent: ureq::Agent::new(),
        })
    }

    fn collection_url(&self, entity: &str) -> Result<String, MutationError> {
        self.base
            .join(entity)
            .map(|u| u.to_string())
            .map_err(|e| MutationError::Network(e.to_string()))
    }

    fn record_url(&self, entity: &str, id: &str) -> Result<String, MutationError> {
        self.base
            .join(&format!("{entity}/{id}"))
            .map(|u| u.to_string())
            .map_err(|e| MutationError::Network(e.to_string()))
    }
}

fn map_ureq_error(error: ureq::Error) -> MutationError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let detail = body.trim();
            if detail.is_empty() {
                MutationError::Server(format!("HTTP {code}"))
            } else {
                MutationError::Server(format!("HTTP {code}: {detail}"))
            }
        }
        ureq::Error::Transport(transport) => MutationError::Network(transport.to_string()),
    }
}

fn read_json(response: ureq::Response) -> Result<JsonValue, MutationError> {
    response
        .into_json()
        .map_err(|e| MutationError::Network(e.to_string()))
}

async fn blocking<T: Send + 'static>(
    work: impl FnOnce() -> Result<T, MutationError> + Send + 'static,
) -> Result<T, MutationError> {
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MutationError::Network(e.to_string()))?
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn list(&self, entity: &str) -> Result<Vec<JsonValue>, MutationError> {
        let url = self.collection_url(entity)?;
        let agent = self.agent.clone();
        blocking(move || {
            debug!(%url, "GET");
            let value = read_json(agent.get(&url).call().map_err(map_ureq_error)?)?;
            match value {
                JsonValue::Array(records) => Ok(records),
                other => Err(MutationError::Server(format!(
                    "expected a record array, got {other}"
                ))),
            }
        })
        .await
    }

    async fn create(&self, entity: &str, record: JsonValue) -> Result<JsonValue, MutationError> {
        let url = self.collection_url(entity)?;
        let agent = self.agent.clone();
        blocking(move || {
            debug!(%url, "POST");
            read_json(agent.post(&url).send_json(record).map_err(map_ureq_error)?)
        })
        .await
    }

    async fn update(
        &self,
        entity: &str,
        id: &str,
        record: JsonValue,
    ) -> Result<JsonValue, MutationError> {
        let url = self.record_url(entity, id)?;
        let agent = self.agent.clone();
        blocking(move || {
            debug!(%url, "PUT");
            read_json(agent.put(&url).send_json(record).map_err(map_ureq_error)?)
        })
        .await
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), MutationError> {
        let url = self.record_url(entity, id)?;
        let agent = self.agent.clone();
        blocking(move || {
            debug!(%url, "DELETE");
            agent.delete(&url).call().map_err(map_ureq_error)?;
            Ok(())
        })
        .await
    }
}

// ---- in-memory -----------------------------------------------------------

/// In-process store for demo mode and tests.
///
/// `fail_next` arms a one-shot failure: the next call (any operation)
/// returns the given error instead, which is how the rollback paths are
/// exercised without a flaky backend.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<JsonValue>>>,
    next_id: AtomicU64,
    fail_next: Mutex<Option<MutationError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
            fail_next: Mutex::new(None),
        }
    }

    /// A store pre-seeded with every entity's demo records.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        for entity in crate::schema::EntityKind::ALL {
            store.seed(entity.path(), entity.demo_records());
        }
        store
    }

    pub fn seed(&self, entity: &str, records: Vec<JsonValue>) {
        self.records
            .lock()
            .expect("store lock")
            .insert(entity.to_string(), records);
    }

    /// Arm a one-shot failure for the next call.
    pub fn fail_next(&self, error: MutationError) {
        *self.fail_next.lock().expect("store lock") = Some(error);
    }

    pub fn record_count(&self, entity: &str) -> usize {
        self.records
            .lock()
            .expect("store lock")
            .get(entity)
            .map(|r| r.len())
            .unwrap_or(0)
    }

    fn take_failure(&self) -> Option<MutationError> {
        self.fail_next.lock().expect("store lock").take()
    }
}

fn id_matches(record: &JsonValue, id: &str) -> bool {
    match record.get("id") {
        Some(JsonValue::String(s)) => s == id,
        Some(JsonValue::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, entity: &str) -> Result<Vec<JsonValue>, MutationError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        Ok(self
            .records
            .lock()
            .expect("store lock")
            .get(entity)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, entity: &str, record: JsonValue) -> Result<JsonValue, MutationError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut object = match record {
            JsonValue::Object(object) => object,
            _ => Map::new(),
        };
        object.insert("id".to_string(), JsonValue::Number(id.into()));
        let stored = JsonValue::Object(object);

        self.records
            .lock()
            .expect("store lock")
            .entry(entity.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        entity: &str,
        id: &str,
        record: JsonValue,
    ) -> Result<JsonValue, MutationError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut records = self.records.lock().expect("store lock");
        let collection = records
            .get_mut(entity)
            .ok_or_else(|| MutationError::Server(format!("no such collection: {entity}")))?;
        let slot = collection
            .iter_mut()
            .find(|r| id_matches(r, id))
            .ok_or_else(|| MutationError::Server(format!("no record {id} in {entity}")))?;

        // Merge the incoming fields over the stored record, keeping the
        // stored id's original JSON type.
        let stored_id = slot.get("id").cloned();
        if let (Some(target), Some(JsonValue::Object(incoming))) = (slot.as_object_mut(), Some(record))
        {
            for (key, value) in incoming {
                target.insert(key, value);
            }
            if let Some(stored_id) = stored_id {
                target.insert("id".to_string(), stored_id);
            }
        }
        Ok(slot.clone())
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), MutationError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut records = self.records.lock().expect("store lock");
        let collection = records
            .get_mut(entity)
            .ok_or_else(|| MutationError::Server(format!("no such collection: {entity}")))?;
        let before = collection.len();
        collection.retain(|r| !id_matches(r, id));
        if collection.len() == before {
            return Err(MutationError::Server(format!("no record {id} in {entity}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_crud_round_trip() {
        let store = MemoryStore::new();
        store.seed("vehicles", vec![json!({"id": 1, "plate": "A"})]);

        let created = store
            .create("vehicles", json!({"plate": "B"}))
            .await
            .unwrap();
        assert!(created.get("id").is_some());

        let listed = store.list("vehicles").await.unwrap();
        assert_eq!(listed.len(), 2);

        let updated = store
            .update("vehicles", "1", json!({"plate": "A2"}))
            .await
            .unwrap();
        assert_eq!(updated["plate"], json!("A2"));
        // The stored id keeps its numeric JSON form.
        assert_eq!(updated["id"], json!(1));

        store.delete("vehicles", "1").await.unwrap();
        assert_eq!(store.record_count("vehicles"), 1);
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let store = MemoryStore::new();
        store.seed("drivers", vec![json!({"id": 1, "name": "x"})]);
        store.fail_next(MutationError::Network("unplugged".to_string()));

        assert!(store.list("drivers").await.is_err());
        assert!(store.list("drivers").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_record_is_a_server_error() {
        let store = MemoryStore::new();
        store.seed("drivers", vec![json!({"id": 1, "name": "x"})]);

        let error = store
            .update("drivers", "999", json!({"name": "y"}))
            .await
            .unwrap_err();
        assert!(matches!(error, MutationError::Server(_)));
    }

    #[tokio::test]
    async fn test_demo_data_covers_every_entity() {
        let store = MemoryStore::with_demo_data();
        for entity in crate::schema::EntityKind::ALL {
            assert!(store.record_count(entity.path()) > 0, "{} not seeded", entity.title());
        }
    }

    #[test]
    fn test_http_store_normalizes_base_url() {
        let store = HttpStore::new("http://fleet.local/api").unwrap();
        assert_eq!(
            store.collection_url("vehicles").unwrap(),
            "http://fleet.local/api/vehicles"
        );
        assert_eq!(
            store.record_url("vehicles", "12").unwrap(),
            "http://fleet.local/api/vehicles/12"
        );
    }
}
