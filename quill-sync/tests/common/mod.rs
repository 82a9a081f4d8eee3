//! In-memory persistence client for engine tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use quill_sync::{
    ClientError, DirectoryEntry, DocId, Document, DocumentPatch, DocumentStatus, FixedClock,
    PersistenceClient, SyncConfig, SyncEngine,
};

/// Every call the engine made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Get(DocId),
    Create,
    Patch(DocId, DocumentPatch),
    Publish(DocId),
    Delete(DocId),
}

#[derive(Default)]
pub struct FakeStore {
    docs: Mutex<HashMap<DocId, Document>>,
    calls: Mutex<Vec<Call>>,
    get_latency: Mutex<HashMap<DocId, Duration>>,
    save_latency: Mutex<Duration>,
    delete_latency: Mutex<Duration>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    fail_deletes: AtomicBool,
    patches_in_flight: AtomicUsize,
    max_patches_in_flight: AtomicUsize,
    next_id: AtomicU64,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, id: &str, title: &str, content: Option<String>, is_owner: bool) -> DocId {
        let id = DocId::new(id);
        self.docs.lock().insert(
            id.clone(),
            Document {
                id: id.clone(),
                title: title.to_string(),
                content,
                status: DocumentStatus::Draft,
                updated_at: None,
                is_owner,
            },
        );
        id
    }

    pub fn set_save_latency(&self, latency: Duration) {
        *self.save_latency.lock() = latency;
    }

    pub fn set_delete_latency(&self, latency: Duration) {
        *self.delete_latency.lock() = latency;
    }

    pub fn set_get_latency(&self, id: &DocId, latency: Duration) {
        self.get_latency.lock().insert(id.clone(), latency);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Highest number of patch requests that were outstanding at once.
    pub fn max_patches_in_flight(&self) -> usize {
        self.max_patches_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Content bodies of the autosave patches sent for `id`.
    pub fn content_saves(&self, id: &DocId) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Patch(target, patch) if target == id && patch.status.is_none() => {
                    patch.content.clone()
                }
                _ => None,
            })
            .collect()
    }

    pub fn stored(&self, id: &DocId) -> Option<Document> {
        self.docs.lock().get(id).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

async fn pause(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl PersistenceClient for FakeStore {
    async fn list(&self) -> Result<Vec<DirectoryEntry>, ClientError> {
        self.record(Call::List);
        let mut entries: Vec<_> = self.docs.lock().values().map(DirectoryEntry::from).collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn get(&self, id: &DocId) -> Result<Document, ClientError> {
        self.record(Call::Get(id.clone()));
        let latency = self.get_latency.lock().get(id).copied().unwrap_or_default();
        pause(latency).await;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ClientError::Transient("connection refused".into()));
        }
        self.docs
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("no post {id}")))
    }

    async fn create(&self) -> Result<DocId, ClientError> {
        self.record(Call::Create);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = DocId::new(format!("new-{n}"));
        self.docs.lock().insert(
            id.clone(),
            Document {
                id: id.clone(),
                title: quill_types::UNTITLED.to_string(),
                content: None,
                status: DocumentStatus::Draft,
                updated_at: None,
                is_owner: true,
            },
        );
        Ok(id)
    }

    async fn patch(&self, id: &DocId, fields: &DocumentPatch) -> Result<(), ClientError> {
        self.record(Call::Patch(id.clone(), fields.clone()));
        let outstanding = self.patches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_patches_in_flight
            .fetch_max(outstanding, Ordering::SeqCst);
        let latency = *self.save_latency.lock();
        pause(latency).await;
        self.patches_in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) && fields.content.is_some() {
            return Err(ClientError::Transient("connection reset".into()));
        }
        let mut docs = self.docs.lock();
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(format!("no post {id}")))?;
        if let Some(title) = &fields.title {
            doc.title = title.clone();
        }
        if let Some(content) = &fields.content {
            doc.content = Some(content.clone());
        }
        if let Some(status) = fields.status {
            doc.status = status;
        }
        Ok(())
    }

    async fn publish(&self, id: &DocId) -> Result<DocumentStatus, ClientError> {
        self.record(Call::Publish(id.clone()));
        let mut docs = self.docs.lock();
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(format!("no post {id}")))?;
        doc.status = DocumentStatus::Published;
        Ok(doc.status)
    }

    async fn delete(&self, id: &DocId) -> Result<(), ClientError> {
        self.record(Call::Delete(id.clone()));
        let latency = *self.delete_latency.lock();
        pause(latency).await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ClientError::Transient("connection reset".into()));
        }
        self.docs
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("no post {id}")))
    }
}

pub fn engine(store: &Arc<FakeStore>) -> SyncEngine {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap());
    SyncEngine::with_clock(store.clone(), SyncConfig::default(), Arc::new(clock))
}

/// Minimal editor state carrying `text`.
pub fn state(text: &str) -> String {
    format!(
        r#"{{"root":{{"children":[{{"children":[{{"text":"{text}","type":"text"}}],"type":"paragraph"}}],"type":"root"}}}}"#
    )
}
