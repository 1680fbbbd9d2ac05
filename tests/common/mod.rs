//! In-memory store fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use azstore::blob::{BlobInfo, BlobListItem, BlobStore};
use azstore::error::{AzstoreError, Result};
use azstore::file::{FileListItem, FileShareStore};
use azstore::queue::{QueueMessage, QueueStore};
use azstore::table::TableStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

fn not_found(message: &str) -> AzstoreError {
    AzstoreError::ServiceError {
        status: 404,
        code: None,
        message: message.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    containers: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    pub uploads: Mutex<usize>,
}

impl MemoryBlobStore {
    pub fn with_container(name: &str) -> Self {
        let store = Self::default();
        store
            .containers
            .lock()
            .unwrap()
            .insert(name.to_string(), BTreeMap::new());
        store
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn container_exists(&self, container: &str) -> Result<bool> {
        Ok(self.containers.lock().unwrap().contains_key(container))
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        self.containers
            .lock()
            .unwrap()
            .entry(container.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        self.containers
            .lock()
            .unwrap()
            .remove(container)
            .map(|_| ())
            .ok_or_else(|| not_found("container"))
    }

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        Ok(self
            .containers
            .lock()
            .unwrap()
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(blob)))
    }

    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        self.containers
            .lock()
            .unwrap()
            .get(container)
            .and_then(|blobs| blobs.get(blob))
            .cloned()
            .ok_or_else(|| not_found("blob"))
    }

    async fn upload(&self, container: &str, blob: &str, data: Vec<u8>) -> Result<()> {
        *self.uploads.lock().unwrap() += 1;
        self.containers
            .lock()
            .unwrap()
            .get_mut(container)
            .ok_or_else(|| not_found("container"))?
            .insert(blob.to_string(), data);
        Ok(())
    }

    async fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        self.containers
            .lock()
            .unwrap()
            .get_mut(container)
            .and_then(|blobs| blobs.remove(blob))
            .map(|_| ())
            .ok_or_else(|| not_found("blob"))
    }

    async fn list_top_level(&self, container: &str) -> Result<Vec<BlobListItem>> {
        let containers = self.containers.lock().unwrap();
        let blobs = containers.get(container).ok_or_else(|| not_found("container"))?;

        // same shape as a delimiter listing: prefixes first, then blobs
        let prefixes: BTreeSet<String> = blobs
            .keys()
            .filter_map(|name| name.find('/').map(|idx| name[..=idx].to_string()))
            .collect();
        let items = prefixes
            .into_iter()
            .map(|prefix| BlobListItem::Directory { prefix })
            .chain(blobs.iter().filter(|(name, _)| !name.contains('/')).map(|(name, data)| {
                BlobListItem::Blob(BlobInfo {
                    name: name.clone(),
                    size: data.len() as u64,
                    content_type: "application/octet-stream".to_string(),
                    last_modified: Utc::now(),
                    etag: format!("0x{:X}", data.len()),
                })
            }))
            .collect();
        Ok(items)
    }
}

#[derive(Default)]
pub struct MemoryFileShareStore {
    shares: Mutex<HashMap<String, MemoryShare>>,
    pub range_writes: Mutex<Vec<(u64, usize)>>,
}

#[derive(Default)]
struct MemoryShare {
    directories: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileShareStore {
    /// A share holding the given directories (`/` separated, no leading slash).
    pub fn with_share(name: &str, directories: &[&str]) -> Self {
        let store = Self::default();
        let mut share = MemoryShare::default();
        share.directories.insert(String::new());
        share
            .directories
            .extend(directories.iter().map(|d| d.to_string()));
        store.shares.lock().unwrap().insert(name.to_string(), share);
        store
    }

    pub fn file(&self, share: &str, path: &str) -> Option<Vec<u8>> {
        self.shares
            .lock()
            .unwrap()
            .get(share)
            .and_then(|s| s.files.get(path).cloned())
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

#[async_trait]
impl FileShareStore for MemoryFileShareStore {
    async fn share_exists(&self, share: &str) -> Result<bool> {
        Ok(self.shares.lock().unwrap().contains_key(share))
    }

    async fn directory_exists(&self, share: &str, directory: &str) -> Result<bool> {
        Ok(self
            .shares
            .lock()
            .unwrap()
            .get(share)
            .is_some_and(|s| s.directories.contains(directory)))
    }

    async fn file_exists(&self, share: &str, path: &str) -> Result<bool> {
        Ok(self.file(share, path).is_some())
    }

    async fn download(&self, share: &str, path: &str) -> Result<Vec<u8>> {
        self.file(share, path).ok_or_else(|| not_found("file"))
    }

    async fn create_file(&self, share: &str, path: &str, length: u64) -> Result<()> {
        let mut shares = self.shares.lock().unwrap();
        let share = shares.get_mut(share).ok_or_else(|| not_found("share"))?;
        share.files.insert(path.to_string(), vec![0; length as usize]);
        Ok(())
    }

    async fn write_range(&self, share: &str, path: &str, offset: u64, data: Vec<u8>) -> Result<()> {
        self.range_writes
            .lock()
            .unwrap()
            .push((offset, data.len()));
        let mut shares = self.shares.lock().unwrap();
        let file = shares
            .get_mut(share)
            .and_then(|s| s.files.get_mut(path))
            .ok_or_else(|| not_found("file"))?;
        let start = offset as usize;
        file[start..start + data.len()].copy_from_slice(&data);
        Ok(())
    }

    async fn delete_file(&self, share: &str, path: &str) -> Result<()> {
        self.shares
            .lock()
            .unwrap()
            .get_mut(share)
            .and_then(|s| s.files.remove(path))
            .map(|_| ())
            .ok_or_else(|| not_found("file"))
    }

    async fn list_directory(&self, share: &str, directory: &str) -> Result<Vec<FileListItem>> {
        let shares = self.shares.lock().unwrap();
        let share = shares.get(share).ok_or_else(|| not_found("share"))?;
        let child_name = |path: &str| path.rsplit('/').next().unwrap_or(path).to_string();

        let directories = share
            .directories
            .iter()
            .filter(|d| !d.is_empty() && parent_of(d) == directory)
            .map(|d| FileListItem::Directory { name: child_name(d) });
        let files = share
            .files
            .iter()
            .filter(|(path, _)| parent_of(path) == directory)
            .map(|(path, data)| FileListItem::File {
                name: child_name(path),
                size: data.len() as u64,
            });

        Ok(directories.chain(files).collect())
    }
}

struct StoredMessage {
    id: String,
    text: String,
    ttl: Duration,
    dequeue_count: u64,
    pop_receipt: Option<String>,
}

#[derive(Default)]
pub struct MemoryQueueStore {
    queues: Mutex<HashMap<String, VecDeque<StoredMessage>>>,
    next_id: Mutex<u64>,
}

impl MemoryQueueStore {
    pub fn with_queue(name: &str) -> Self {
        let store = Self::default();
        store
            .queues
            .lock()
            .unwrap()
            .insert(name.to_string(), VecDeque::new());
        store
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    pub fn ttls(&self, queue: &str) -> Vec<Duration> {
        self.queues
            .lock()
            .unwrap()
            .get(queue)
            .map(|q| q.iter().map(|m| m.ttl).collect())
            .unwrap_or_default()
    }

    fn to_message(stored: &StoredMessage) -> QueueMessage {
        QueueMessage {
            message_id: stored.id.clone(),
            insertion_time: Utc::now(),
            expiration_time: Utc::now() + chrono::Duration::from_std(stored.ttl).unwrap(),
            dequeue_count: stored.dequeue_count,
            pop_receipt: stored.pop_receipt.clone(),
            time_next_visible: None,
            text: stored.text.clone(),
        }
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn queue_exists(&self, queue: &str) -> Result<bool> {
        Ok(self.queues.lock().unwrap().contains_key(queue))
    }

    async fn create_queue(&self, queue: &str) -> Result<()> {
        self.queues
            .lock()
            .unwrap()
            .entry(queue.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> Result<()> {
        self.queues.lock().unwrap().remove(queue);
        Ok(())
    }

    async fn put_message(&self, queue: &str, text: String, ttl: Duration) -> Result<()> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.queues
            .lock()
            .unwrap()
            .get_mut(queue)
            .ok_or_else(|| not_found("queue"))?
            .push_back(StoredMessage {
                id: format!("msg-{}", *next_id),
                text,
                ttl,
                dequeue_count: 0,
                pop_receipt: None,
            });
        Ok(())
    }

    async fn peek_messages(&self, queue: &str, count: u8) -> Result<Vec<QueueMessage>> {
        let queues = self.queues.lock().unwrap();
        let messages = queues.get(queue).ok_or_else(|| not_found("queue"))?;
        Ok(messages
            .iter()
            .filter(|m| m.pop_receipt.is_none())
            .take(count as usize)
            .map(|m| {
                let mut message = Self::to_message(m);
                message.pop_receipt = None;
                message
            })
            .collect())
    }

    async fn get_messages(
        &self,
        queue: &str,
        count: u8,
        _visibility: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let mut queues = self.queues.lock().unwrap();
        let messages = queues.get_mut(queue).ok_or_else(|| not_found("queue"))?;
        Ok(messages
            .iter_mut()
            .filter(|m| m.pop_receipt.is_none())
            .take(count as usize)
            .map(|m| {
                m.dequeue_count += 1;
                m.pop_receipt = Some(format!("receipt-{}", m.id));
                Self::to_message(m)
            })
            .collect())
    }

    async fn delete_message(&self, queue: &str, message_id: &str, pop_receipt: &str) -> Result<()> {
        let mut queues = self.queues.lock().unwrap();
        let messages = queues.get_mut(queue).ok_or_else(|| not_found("queue"))?;
        let position = messages
            .iter()
            .position(|m| m.id == message_id && m.pop_receipt.as_deref() == Some(pop_receipt))
            .ok_or_else(|| not_found("message"))?;
        messages.remove(position);
        Ok(())
    }
}

type Rows = BTreeMap<(String, String), Value>;

#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<BTreeMap<String, Rows>>,
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.lock().unwrap().contains_key(table))
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        self.tables.lock().unwrap().remove(table);
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.lock().unwrap().keys().cloned().collect())
    }

    async fn insert_or_merge(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        entity: Value,
    ) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table).ok_or_else(|| not_found("table"))?;
        let row = rows
            .entry((partition_key.to_string(), row_key.to_string()))
            .or_insert_with(|| Value::Object(Default::default()));

        if let (Value::Object(existing), Value::Object(update)) = (row, entity) {
            existing.extend(update);
        }
        Ok(())
    }

    async fn get_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<Option<Value>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).ok_or_else(|| not_found("table"))?;
        Ok(rows
            .get(&(partition_key.to_string(), row_key.to_string()))
            .cloned())
    }

    async fn delete_entity(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table).ok_or_else(|| not_found("table"))?;
        rows.remove(&(partition_key.to_string(), row_key.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found("entity"))
    }
}
