use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use vitrine_core::{MediaError, MediaResult, ModerationVerdict};
use vitrine_moderation::ModerationGate;
use vitrine_storage::{ObjectLocation, Storage, StorageBackend, StorageError, StorageResult};

use super::AssetSource;

pub const STORE_BASE_URL: &str = "https://store.test";

/// A small PNG whose bytes are unique per `seed`.
pub fn png_bytes(seed: u8) -> Bytes {
    png_sized(16, 12, seed)
}

pub fn png_sized(width: u32, height: u32, seed: u8) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([seed, 255 - seed, seed / 2, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    Bytes::from(buffer)
}

/// Paired signals for pausing a classification mid-flight.
#[derive(Clone, Default)]
pub struct Hold {
    /// Notified once the gate starts classifying the held image
    pub entered: Arc<Notify>,
    /// Notify to let the classification finish
    pub release: Arc<Notify>,
}

/// Gate answering from a verdict table; unknown images are `NotSensitive`.
#[derive(Default)]
pub struct FakeGate {
    verdicts: Mutex<HashMap<Bytes, ModerationVerdict>>,
    holds: Mutex<HashMap<Bytes, Hold>>,
    calls: AtomicUsize,
}

impl FakeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_verdict(&self, image: &Bytes, verdict: ModerationVerdict) {
        self.verdicts.lock().unwrap().insert(image.clone(), verdict);
    }

    /// Pause classification of `image` until the returned hold is released.
    pub fn hold(&self, image: &Bytes) -> Hold {
        let hold = Hold::default();
        self.holds.lock().unwrap().insert(image.clone(), hold.clone());
        hold
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModerationGate for FakeGate {
    async fn classify(&self, image: &[u8]) -> ModerationVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let hold = self.holds.lock().unwrap().get(image).cloned();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        self.verdicts
            .lock()
            .unwrap()
            .get(image)
            .copied()
            .unwrap_or(ModerationVerdict::NotSensitive)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// In-memory picked assets and remote images.
#[derive(Default)]
pub struct FakeAssetSource {
    assets: Mutex<HashMap<String, Bytes>>,
    remote: Mutex<HashMap<String, Bytes>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_asset(&self, location: &str, data: Bytes) {
        self.assets
            .lock()
            .unwrap()
            .insert(location.to_string(), data);
    }

    pub fn add_remote(&self, url: &str, data: Bytes) {
        self.remote.lock().unwrap().insert(url.to_string(), data);
    }

    /// URLs passed to `fetch`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetSource for FakeAssetSource {
    async fn read_asset(&self, location: &str) -> MediaResult<Bytes> {
        self.assets
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| MediaError::asset_load(location, "no such asset"))
    }

    async fn fetch(&self, url: &str) -> MediaResult<Bytes> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.remote
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MediaError::asset_load(url, "404 Not Found"))
    }
}

/// Object store kept in memory, with failure injection.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<ObjectLocation, (Vec<u8>, String)>>,
    uploaded: Mutex<Vec<ObjectLocation>>,
    attempts: AtomicUsize,
    fail_upload_at: Mutex<Option<usize>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    failing_deletes: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<ObjectLocation>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upload attempt with zero-based number `attempt`.
    pub fn fail_upload_at(&self, attempt: usize) {
        *self.fail_upload_at.lock().unwrap() = Some(attempt);
    }

    pub fn clear_failures(&self) {
        *self.fail_upload_at.lock().unwrap() = None;
        self.failing_deletes.lock().unwrap().clear();
    }

    /// Cancel `token` right after the `count`-th successful upload.
    pub fn cancel_after_uploads(&self, count: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((count, token));
    }

    pub fn fail_delete_of(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    /// Upload calls made, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successful uploads, in order.
    pub fn uploaded(&self) -> Vec<ObjectLocation> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<ObjectLocation> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Stored bytes behind a public URL.
    pub fn object(&self, url: &str) -> Option<Vec<u8>> {
        let location = self.locate(url)?;
        self.objects
            .lock()
            .unwrap()
            .get(&location)
            .map(|(data, _)| data.clone())
    }

    pub fn content_type(&self, url: &str) -> Option<String> {
        let location = self.locate(url)?;
        self.objects
            .lock()
            .unwrap()
            .get(&location)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(
        &self,
        location: &ObjectLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_upload_at.lock().unwrap() == Some(attempt) {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(location.clone(), (data, content_type.to_string()));
        let uploaded = {
            let mut uploaded = self.uploaded.lock().unwrap();
            uploaded.push(location.clone());
            uploaded.len()
        };

        if let Some((count, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if *count == uploaded {
                token.cancel();
            }
        }

        Ok(self.public_url(location))
    }

    async fn download(&self, location: &ObjectLocation) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(location)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    async fn delete(&self, location: &ObjectLocation) -> StorageResult<()> {
        if self.failing_deletes.lock().unwrap().contains(&location.key) {
            return Err(StorageError::DeleteFailed("injected failure".to_string()));
        }
        self.objects.lock().unwrap().remove(location);
        self.deleted.lock().unwrap().push(location.clone());
        Ok(())
    }

    fn public_url(&self, location: &ObjectLocation) -> String {
        format!("{}/{}/{}", STORE_BASE_URL, location.bucket, location.key)
    }

    fn locate(&self, url: &str) -> Option<ObjectLocation> {
        let rest = url.strip_prefix(STORE_BASE_URL)?.strip_prefix('/')?;
        let (bucket, key) = rest.split_once('/')?;
        Some(ObjectLocation::new(bucket, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
