use super::{ObjectStore, StoredObject};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ObjectMap = HashMap<(String, String), StoredObject>;

/// In-memory [`ObjectStore`] with call counters and failure injection.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    objects: Arc<Mutex<ObjectMap>>,
    get_count: Arc<Mutex<usize>>,
    put_keys: Arc<Mutex<Vec<(String, String)>>>,
    failing_put_keys: Arc<Mutex<HashSet<String>>>,
    get_delay: Arc<Mutex<Option<Duration>>>,
    put_delays: Arc<Mutex<HashMap<String, Duration>>>,
    panicking_put_keys: Arc<Mutex<HashSet<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Self {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: Bytes::from(body),
                content_type: content_type.to_string(),
            },
        );
        self
    }

    /// Fail every `put` to `key`, in any bucket.
    pub fn with_failing_put(self, key: &str) -> Self {
        self.failing_put_keys
            .lock()
            .unwrap()
            .insert(key.to_string());
        self
    }

    /// Stall every `get` for `delay` before answering.
    pub fn with_get_delay(self, delay: Duration) -> Self {
        *self.get_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Stall every `put` to `key` for `delay` before answering.
    pub fn with_put_delay(self, key: &str, delay: Duration) -> Self {
        self.put_delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
        self
    }

    /// Panic inside every `put` to `key`.
    pub fn with_panicking_put(self, key: &str) -> Self {
        self.panicking_put_keys
            .lock()
            .unwrap()
            .insert(key.to_string());
        self
    }

    pub fn get_get_count(&self) -> usize {
        *self.get_count.lock().unwrap()
    }

    pub fn get_put_count(&self) -> usize {
        self.put_keys.lock().unwrap().len()
    }

    /// `(bucket, key)` of every `put` attempt, in call order.
    pub fn get_put_keys(&self) -> Vec<(String, String)> {
        self.put_keys.lock().unwrap().clone()
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        *self.get_count.lock().unwrap() += 1;

        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.get_object(bucket, key).ok_or_else(|| Error::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.put_keys
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));

        let delay = self.put_delays.lock().unwrap().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.panicking_put_keys.lock().unwrap().contains(key) {
            panic!("Mock upload panic for {}", key);
        }

        if self.failing_put_keys.lock().unwrap().contains(key) {
            return Err(Error::Storage(format!("Mock upload failure for {}", key)));
        }

        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
