use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::ModuleError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FRAGMENT_DIR: &str = "fragments";

/// One deploy's route map. Fragment names carry the content hash the
/// build stamped on them, so a redeploy renames them and orphans any
/// manifest still held in memory.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleManifest {
    pub version: String,
    pub deployed_at: DateTime<Utc>,
    pub routes: HashMap<String, RouteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub title: String,
    pub description: String,
    pub fragment: String,
}

/// A route's renderable unit once its fragment has been fetched.
#[derive(Debug, Clone)]
pub struct PageBundle {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub html: String,
}

/// Summary row for the home page index.
#[derive(Debug, Clone)]
pub struct RouteSummary {
    pub slug: String,
    pub title: String,
    pub description: String,
}

/// File-backed store of the deployed page bundles, with an in-memory
/// cache of fetched fragments. A loaded bundle is never re-read until a
/// reload flushes the store.
pub struct BundleStore {
    root: PathBuf,
    manifest: RwLock<Arc<BundleManifest>>,
    cache: RwLock<HashMap<String, Arc<PageBundle>>>,
    stale: AtomicBool,
}

impl BundleStore {
    /// Open the store, reading the current deploy's manifest.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ModuleError> {
        let root = root.as_ref().to_path_buf();
        let manifest = Self::read_manifest(&root)?;
        Ok(Self {
            root,
            manifest: RwLock::new(Arc::new(manifest)),
            cache: RwLock::new(HashMap::new()),
            stale: AtomicBool::new(false),
        })
    }

    fn read_manifest(root: &Path) -> Result<BundleManifest, ModuleError> {
        let path = root.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ModuleError::Manifest(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ModuleError::Manifest(format!("{}: {e}", path.display())))
    }

    pub fn manifest(&self) -> Arc<BundleManifest> {
        self.manifest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.manifest().routes.contains_key(slug)
    }

    /// Route summaries for the index, sorted by title.
    pub fn route_summaries(&self) -> Vec<RouteSummary> {
        let manifest = self.manifest();
        let mut summaries: Vec<RouteSummary> = manifest
            .routes
            .iter()
            .map(|(slug, entry)| RouteSummary {
                slug: slug.clone(),
                title: entry.title.clone(),
                description: entry.description.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title));
        summaries
    }

    /// Flag the in-memory manifest as superseded; the next fetch re-reads
    /// it and drops the fragment cache.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    /// Drop the cache and re-read the manifest from disk.
    pub fn refresh(&self) -> Result<(), ModuleError> {
        let fresh = Self::read_manifest(&self.root)?;
        *self
            .manifest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(fresh);
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.stale.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Importer for the resilient loader: resolve `slug` against the
    /// manifest and read its fragment. A fragment that has vanished
    /// underneath a live manifest is reported as a missing artifact.
    pub async fn fetch(&self, slug: &str) -> Result<Arc<PageBundle>, ModuleError> {
        if self.stale.swap(false, Ordering::SeqCst) {
            self.refresh()?;
        }

        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(slug)
            .cloned()
        {
            return Ok(hit);
        }

        let entry = self
            .manifest()
            .routes
            .get(slug)
            .cloned()
            .ok_or_else(|| ModuleError::Import(format!("unknown route: {slug}")))?;

        let path = self.root.join(FRAGMENT_DIR).join(&entry.fragment);
        let html = match tokio::fs::read_to_string(&path).await {
            Ok(html) => html,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModuleError::MissingArtifact(entry.fragment.clone()));
            }
            Err(e) => {
                return Err(ModuleError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let bundle = Arc::new(PageBundle {
            slug: slug.to_string(),
            title: entry.title,
            description: entry.description,
            html,
        });
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(slug.to_string(), bundle.clone());
        Ok(bundle)
    }
}
