//! Persistence and resume
//!
//! Collections are stored as `{"<collection>": [ ... ]}` JSON documents. A
//! missing file is an empty cache. Records are keyed by their source link,
//! which is how a later run knows what is left to scrape.

use crate::model::ScrapedEntity;
use brewdex_common::{BrewdexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write `contents` next to `path` then move it into place
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, contents)?;
    fs::rename(&staging, path)?;
    Ok(())
}

/// One JSON collection of entities on disk
#[derive(Debug, Clone)]
pub struct EntityStore<E> {
    path: PathBuf,
    collection: String,
    _entity: PhantomData<E>,
}

impl<E: ScrapedEntity> EntityStore<E> {
    pub fn new(path: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            collection: collection.into(),
            _entity: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored entity; a missing file yields an empty list
    pub fn load(&self) -> Result<Vec<E>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No cached collection");
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&self.path)?;
        let mut envelope: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)?;
        let entries = envelope
            .remove(&self.collection)
            .ok_or_else(|| BrewdexError::MissingCollection {
                collection: self.collection.clone(),
                path: self.path.display().to_string(),
            })?;

        let entities: Vec<E> = serde_json::from_value(entries)?;
        info!(path = %self.path.display(), count = entities.len(), "Loaded cached {}", self.collection);
        Ok(entities)
    }

    pub fn save(&self, entities: &[E]) -> Result<()> {
        let mut envelope = serde_json::Map::new();
        envelope.insert(self.collection.clone(), serde_json::to_value(entities)?);
        let text = serde_json::to_string_pretty(&envelope)?;
        write_atomically(&self.path, &text)?;
        debug!(path = %self.path.display(), count = entities.len(), "Saved {}", self.collection);
        Ok(())
    }
}

/// Seed links not yet present in `cached`, deduplicated, in seed order
pub fn pending_links<E: ScrapedEntity>(seeds: &[String], cached: &[E]) -> Vec<String> {
    let mut seen: HashSet<&str> = cached.iter().map(|entity| entity.link()).collect();
    seeds
        .iter()
        .filter(|link| seen.insert(link.as_str()))
        .cloned()
        .collect()
}

/// Combine cached and fresh entities.
///
/// A fresh entity replaces the cached one with the same link but keeps its
/// id. Cached order is preserved; new links are appended.
pub fn merge<E: ScrapedEntity>(cached: Vec<E>, fresh: Vec<E>) -> Vec<E> {
    let mut merged = cached;
    let positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(index, entity)| (entity.link().to_string(), index))
        .collect();

    for mut entity in fresh {
        match positions.get(entity.link()) {
            Some(&index) => {
                entity.restore_id(merged[index].id());
                merged[index] = entity;
            }
            None => merged.push(entity),
        }
    }
    merged
}

/// Cached sitemap links, stored as `{"links": [...]}`
#[derive(Debug, Clone)]
pub struct LinkCache {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LinkFile {
    #[serde(default)]
    links: Vec<String>,
}

impl LinkCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cached links, empty when nothing was cached yet
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file: LinkFile = serde_json::from_str(&fs::read_to_string(&self.path)?)?;
        Ok(file.links)
    }

    pub fn save(&self, links: &[String]) -> Result<()> {
        let file = LinkFile { links: links.to_vec() };
        write_atomically(&self.path, &serde_json::to_string_pretty(&file)?)
    }
}
