//! Capability Repository
//!
//! In-memory index of bound capabilities over a `CapabilityStore`.
//! Lookups take the read lock; inserts and reloads take the write lock,
//! and a reload builds its new index before taking it.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{
    errors::DomainError, similarity, similarity_upper_bound, Capability, CapabilityId,
    DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::ports::{CapabilityRuntime, CapabilityStore};

type Index = BTreeMap<String, BTreeMap<String, Arc<Capability>>>;

/// Summary of a load pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<String>,
}

/// Result of an insert
#[derive(Debug, Clone)]
pub struct Inserted {
    pub capability: Arc<Capability>,
    /// `false` when the identity was already taken and nothing was written
    pub created: bool,
}

pub struct CapabilityRepository {
    store: Arc<dyn CapabilityStore>,
    runtime: Arc<dyn CapabilityRuntime>,
    index: RwLock<Index>,
    similarity_threshold: f32,
}

impl CapabilityRepository {
    pub fn new(store: Arc<dyn CapabilityStore>, runtime: Arc<dyn CapabilityRuntime>) -> Self {
        Self {
            store,
            runtime,
            index: RwLock::new(Index::new()),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn runtime(&self) -> &Arc<dyn CapabilityRuntime> {
        &self.runtime
    }

    /// Rebuild the index from the store.
    ///
    /// A unit that cannot be read or bound is logged and skipped; only a
    /// failure to enumerate categories aborts the pass.
    pub async fn load(&self) -> Result<LoadReport, DomainError> {
        let mut index = Index::new();
        let mut report = LoadReport::default();

        for category in self.store.categories().await? {
            let names = match self.store.units(&category).await {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!("Skipping category '{}': {}", category, e);
                    report.skipped.push(category.clone());
                    continue;
                }
            };

            let entries = index.entry(category.clone()).or_default();
            for name in names {
                match self.bind_unit(&category, &name).await {
                    Ok(capability) => {
                        entries.insert(name, Arc::new(capability));
                        report.loaded += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Error loading command {} in category {}: {}",
                            name,
                            category,
                            e
                        );
                        report.skipped.push(format!("{}/{}", category, name));
                    }
                }
            }
        }

        *self.index.write().await = index;
        tracing::debug!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Capability index rebuilt"
        );
        Ok(report)
    }

    async fn bind_unit(&self, category: &str, name: &str) -> Result<Capability, DomainError> {
        let id = CapabilityId::new(category, name)?;
        if id.category() != category || id.name() != name {
            return Err(DomainError::load(
                format!("{}/{}", category, name),
                "identity is not in sanitized form",
            ));
        }
        let source = self.store.read(&id).await?;
        let handle = self.runtime.bind(&id, &source).await?;
        Ok(Capability::new(id, source, handle))
    }

    pub async fn lookup(&self, id: &CapabilityId) -> Option<Arc<Capability>> {
        self.index
            .read()
            .await
            .get(id.category())
            .and_then(|entries| entries.get(id.name()))
            .cloned()
    }

    /// Find a capability with this exact name in any category
    pub async fn find_by_name(&self, name: &str) -> Option<Arc<Capability>> {
        self.index
            .read()
            .await
            .values()
            .find_map(|entries| entries.get(name))
            .cloned()
    }

    /// Whether the store holds a unit at `id`, loaded or not
    pub async fn exists(&self, id: &CapabilityId) -> Result<bool, DomainError> {
        self.store.exists(id).await
    }

    /// Persist `source` at `id` and make it invocable.
    ///
    /// When the identity already exists on disk nothing is written and the
    /// existing capability is returned, whatever its content. Only the unit
    /// at `id` is read and bound; the rest of the index is left as is.
    pub async fn insert(&self, id: &CapabilityId, source: &str) -> Result<Inserted, DomainError> {
        let created = self.store.create(id, source).await?;
        if !created {
            tracing::info!(
                "Command '{}' already exists in category '{}'. Using existing command.",
                id.name(),
                id.category()
            );
            if let Some(capability) = self.lookup(id).await {
                return Ok(Inserted {
                    capability,
                    created: false,
                });
            }
        }

        let bound = Arc::new(self.bind_unit(id.category(), id.name()).await?);
        let capability = self
            .index
            .write()
            .await
            .entry(id.category().to_string())
            .or_default()
            .entry(id.name().to_string())
            .or_insert(bound)
            .clone();
        Ok(Inserted {
            capability,
            created,
        })
    }

    /// Reuse candidate for a new request in `id.category()`.
    ///
    /// Compares the candidate name against every registered name and the raw
    /// request against every registered source; the best pair scoring at or
    /// above the threshold wins.
    pub async fn find_similar(
        &self,
        id: &CapabilityId,
        raw_input: &str,
    ) -> Option<Arc<Capability>> {
        let index = self.index.read().await;
        let entries = index.get(id.category())?;

        let mut best: Option<(f32, &Arc<Capability>)> = None;
        for (name, capability) in entries {
            let by_name = similarity(id.name(), name);
            let by_source = if similarity_upper_bound(raw_input, capability.source())
                < self.similarity_threshold
            {
                0.0
            } else {
                similarity(raw_input, capability.source())
            };
            let score = by_name.max(by_source);
            if score < self.similarity_threshold {
                continue;
            }
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, capability));
            }
        }

        best.map(|(score, capability)| {
            tracing::debug!(
                "Reusing {} for {} (similarity {:.2})",
                capability.id(),
                id,
                score
            );
            capability.clone()
        })
    }

    /// Every loaded identity, ordered by category then name
    pub async fn list(&self) -> Vec<CapabilityId> {
        self.index
            .read()
            .await
            .values()
            .flat_map(|entries| entries.values().map(|c| c.id().clone()))
            .collect()
    }
}
