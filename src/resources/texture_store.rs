//! Reference-counted cache of decoded textures.
//!
//! Every texture lives under a string key together with the number of holders
//! that currently use it. Loading or adding an existing key hands out the cached
//! resource and bumps the count; the last release disposes the resource through
//! the backend. The store is meant for a single-threaded (browser main thread)
//! caller, so it uses interior mutability and never holds a borrow across an
//! `.await`.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use anyhow::Result;

use crate::resources::texture::{ObjectUrl, TextureBackend, TextureFile};

struct Entry<H> {
    resource: H,
    refcount: usize,
    object_url: Option<ObjectUrl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureStats {
    pub key: String,
    pub refcount: usize,
}

pub struct TextureStore<B: TextureBackend> {
    backend: B,
    entries: RefCell<HashMap<String, Entry<B::Handle>>>,
    key_sequence: Cell<u64>,
}

impl<B: TextureBackend> TextureStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entries: RefCell::new(HashMap::new()),
            key_sequence: Cell::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /**
     * Decodes `file` and caches it under `key`.
     *
     * Without an explicit key the file name is used, falling back to a
     * generated `texture-<millis>-<seq>` key for anonymous files. A cache hit
     * returns the cached resource without decoding. If another load stored the
     * same key while this one was decoding, the fresh resource is discarded and
     * the caller joins the existing entry instead.
     */
    pub async fn load_from_file(&self, file: &TextureFile, key: Option<&str>) -> Result<B::Handle> {
        let key = match key {
            Some(key) => key.to_string(),
            None => match file.name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => self.synthetic_key(),
            },
        };
        if let Some(resource) = self.retain_cached(&key) {
            log::debug!("texture '{key}' served from cache");
            return Ok(resource);
        }

        let url = self.backend.create_object_url(file);
        let resource = match self.backend.decode(file, &url).await {
            Ok(resource) => resource,
            Err(e) => {
                self.revoke_quietly(&url);
                log::error!("failed to load texture '{key}': {e:#}");
                return Err(e.context(format!("failed to load texture '{key}'")));
            }
        };

        if let Some(cached) = self.retain_cached(&key) {
            log::debug!("texture '{key}' was stored by a concurrent load, dropping duplicate");
            self.dispose_quietly(&key, &resource);
            self.revoke_quietly(&url);
            return Ok(cached);
        }

        self.entries.borrow_mut().insert(
            key.clone(),
            Entry {
                resource: resource.clone(),
                refcount: 1,
                object_url: Some(url),
            },
        );
        log::info!("texture '{key}' loaded");
        Ok(resource)
    }

    /// Stores an already decoded resource. An existing entry wins: its resource
    /// is returned with an incremented count and `resource` is dropped.
    pub fn add(&self, key: &str, resource: B::Handle) -> B::Handle {
        if let Some(cached) = self.retain_cached(key) {
            return cached;
        }
        self.entries.borrow_mut().insert(
            key.to_string(),
            Entry {
                resource: resource.clone(),
                refcount: 1,
                object_url: None,
            },
        );
        resource
    }

    /// Looks up `key` without touching its count.
    pub fn get(&self, key: &str) -> Option<B::Handle> {
        self.entries
            .borrow()
            .get(key)
            .map(|entry| entry.resource.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Adds a holder to `key`. Returns `false` for unknown keys.
    pub fn retain(&self, key: &str) -> bool {
        self.retain_cached(key).is_some()
    }

    /**
     * Drops one holder of `key`.
     *
     * The entry is removed once nobody holds it anymore; the resource is then
     * disposed and its object URL revoked. Failures during cleanup are logged
     * and do not keep the entry alive. Releasing an unknown key is a no-op that
     * returns `false`.
     */
    pub fn release(&self, key: &str) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            log::debug!("release of unknown texture '{key}' ignored");
            return false;
        };
        entry.refcount = entry.refcount.saturating_sub(1);
        if entry.refcount > 0 {
            return true;
        }
        let removed = entries.remove(key);
        drop(entries);
        if let Some(entry) = removed {
            self.destroy(key, entry);
            log::info!("texture '{key}' released");
        }
        true
    }

    /// Disposes every entry regardless of its count and empties the store.
    pub fn dispose_all(&self) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        let count = entries.len();
        for (key, entry) in entries {
            self.destroy(&key, entry);
        }
        log::info!("disposed {count} textures");
    }

    /// One entry per key, ordered by key.
    pub fn stats(&self) -> Vec<TextureStats> {
        let mut stats: Vec<TextureStats> = self
            .entries
            .borrow()
            .iter()
            .map(|(key, entry)| TextureStats {
                key: key.clone(),
                refcount: entry.refcount,
            })
            .collect();
        stats.sort_by(|a, b| a.key.cmp(&b.key));
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn retain_cached(&self, key: &str) -> Option<B::Handle> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(key)?;
        entry.refcount += 1;
        Some(entry.resource.clone())
    }

    fn synthetic_key(&self) -> String {
        let seq = self.key_sequence.get();
        self.key_sequence.set(seq + 1);
        format!("texture-{}-{seq}", instant::now() as u64)
    }

    fn destroy(&self, key: &str, entry: Entry<B::Handle>) {
        self.dispose_quietly(key, &entry.resource);
        if let Some(url) = entry.object_url {
            self.revoke_quietly(&url);
        }
    }

    fn dispose_quietly(&self, key: &str, resource: &B::Handle) {
        if let Err(e) = self.backend.dispose(resource) {
            log::warn!("failed to dispose texture '{key}': {e:#}");
        }
    }

    fn revoke_quietly(&self, url: &ObjectUrl) {
        if let Err(e) = self.backend.revoke_object_url(url) {
            log::warn!("failed to revoke object url '{}': {e:#}", url.0);
        }
    }
}

impl<B: TextureBackend + Default> Default for TextureStore<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}
