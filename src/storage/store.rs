//! Lock-protected JSON collections
//!
//! Every mutation of persisted state follows the same shape: take the
//! resource lock, read the collection, mutate it, write it back atomically,
//! release the lock. Readers that do not mutate can skip the lock because
//! writes go through a rename and are never observed half-written.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

use super::lock::{FileLock, LockPolicy};
use crate::error::{OcdcError, OcdcResult};

/// A JSON document on disk guarded by a [`FileLock`]
pub struct LockedStore<T> {
    path: PathBuf,
    lock: FileLock,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for LockedStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: self.lock.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for LockedStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedStore")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> LockedStore<T>
where
    T: Default + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(path: impl Into<PathBuf>, policy: LockPolicy) -> Self {
        let path = path.into();
        let lock = FileLock::for_resource(&path, policy);
        Self {
            path,
            lock,
            _marker: PhantomData,
        }
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` while holding the store's lock
    ///
    /// The lock is released on every exit path, including errors returned
    /// by `f` and panics unwinding through it.
    pub async fn with_lock<F, Fut, R>(&self, f: F) -> OcdcResult<R>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = OcdcResult<R>> + Send,
        R: Send,
    {
        let guard = self.lock.acquire().await?;
        let result = f().await;
        drop(guard);
        result
    }

    /// Read, mutate and atomically write the collection under the lock
    pub async fn update<F, R>(&self, f: F) -> OcdcResult<R>
    where
        F: FnOnce(&mut T) -> OcdcResult<R> + Send,
        R: Send,
    {
        let path = self.path.clone();
        self.with_lock(|| async move {
            let mut value: T = read_json(&path).await?;
            let result = f(&mut value)?;
            write_json(&path, &value).await?;
            Ok(result)
        })
        .await
    }

    /// Lock-free snapshot of the collection
    pub async fn load(&self) -> OcdcResult<T> {
        read_json(&self.path).await
    }
}

/// Parse the JSON document at `path`
///
/// A missing file is an empty collection. An unparseable file is logged and
/// also treated as empty, so the next write replaces it with valid state.
pub async fn read_json<T>(path: &Path) -> OcdcResult<T>
where
    T: Default + DeserializeOwned,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(OcdcError::io(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "State file is corrupted, treating it as empty"
            );
            Ok(T::default())
        }
    }
}

/// Atomically replace the JSON document at `path` with `value`
///
/// The document is written to a temporary file in the same directory and
/// renamed over the target.
pub async fn write_json<T>(path: &Path, value: &T) -> OcdcResult<()>
where
    T: Serialize,
{
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, json.as_bytes()))
        .await
        .map_err(|e| OcdcError::io(path, std::io::Error::other(e)))??;

    trace!(path = %path.display(), "Wrote state file");
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> OcdcResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| OcdcError::io(&dir, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| OcdcError::io(&dir, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| OcdcError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| OcdcError::io(path, e.error))?;
    Ok(())
}
