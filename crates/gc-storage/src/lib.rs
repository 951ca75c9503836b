use anyhow::{Context, Result};
use async_trait::async_trait;
use rocksdb::{DB, IteratorMode, Options};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Named-entry store for locally held key material.
#[async_trait]
pub trait Keystore: Send + Sync {
    async fn load_key(&self, name: &str) -> Result<Option<String>>;
    async fn save_key(&self, name: &str, encoded_key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryKeystore {
    keys: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl Keystore for InMemoryKeystore {
    async fn load_key(&self, name: &str) -> Result<Option<String>> {
        let guard = self.keys.read().await;
        Ok(guard.get(name).cloned())
    }

    async fn save_key(&self, name: &str, encoded_key: &str) -> Result<()> {
        let mut guard = self.keys.write().await;
        guard.insert(name.to_owned(), encoded_key.to_owned());
        Ok(())
    }
}

/// One funding attempt made by the custodial wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingEventRecord {
    pub event_id: String,
    pub wallet_address: String,
    pub outcome: String,
    pub required_wei: Option<String>,
    pub balance_wei: Option<String>,
    pub transferred_wei: Option<String>,
    pub tx_hash: Option<String>,
    pub message: Option<String>,
    pub timestamp_epoch_ms: u128,
}

pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    pub fn open_default(path: &str) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path).with_context(|| format!("failed to open RocksDB at {path}"))?;
        Ok(Self { db: Arc::new(db) })
    }

    fn key_for_local_key(name: &str) -> String {
        format!("local-key:{name}")
    }

    fn key_for_funding_event(timestamp_epoch_ms: u128, event_id: &str) -> String {
        format!("funding:{timestamp_epoch_ms:020}:{event_id}")
    }

    pub fn append_funding_event(&self, mut record: FundingEventRecord) -> Result<String> {
        if record.event_id.trim().is_empty() {
            record.event_id = Uuid::new_v4().to_string();
        }
        let key = Self::key_for_funding_event(record.timestamp_epoch_ms, &record.event_id);
        let value = serde_json::to_vec(&record)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(record.event_id)
    }

    pub fn list_funding_events(
        &self,
        limit: usize,
        wallet_address: Option<&str>,
        outcome: Option<&str>,
    ) -> Result<Vec<FundingEventRecord>> {
        let mut events = Vec::new();

        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) = item?;
            if !key.as_ref().starts_with(b"funding:") {
                continue;
            }

            let record = serde_json::from_slice::<FundingEventRecord>(&value)?;

            if let Some(expected) = wallet_address {
                if !record.wallet_address.eq_ignore_ascii_case(expected) {
                    continue;
                }
            }

            if let Some(expected) = outcome {
                if record.outcome != expected {
                    continue;
                }
            }

            events.push(record);
        }

        events.sort_by(|a, b| b.timestamp_epoch_ms.cmp(&a.timestamp_epoch_ms));
        if events.len() > limit {
            events.truncate(limit);
        }

        Ok(events)
    }
}

#[async_trait]
impl Keystore for RocksDbStore {
    async fn load_key(&self, name: &str) -> Result<Option<String>> {
        let key = Self::key_for_local_key(name);
        let value = self.db.get(key.as_bytes())?;
        match value {
            Some(raw) => Ok(Some(
                String::from_utf8(raw).context("stored key is not valid UTF-8")?,
            )),
            None => Ok(None),
        }
    }

    async fn save_key(&self, name: &str, encoded_key: &str) -> Result<()> {
        let key = Self::key_for_local_key(name);
        self.db.put(key.as_bytes(), encoded_key.as_bytes())?;
        Ok(())
    }
}
