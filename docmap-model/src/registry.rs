//! Entity type name → metadata.
//!
//! Built once during discovery and then shared read-only (typically behind
//! an `Arc`). The only mutation after registration is [`resolve_targets`],
//! which runs before the registry is handed to a factory.
//!
//! [`resolve_targets`]: MetadataRegistry::resolve_targets

use crate::{EntityMetadata, EntityType, ModelError, ModelResult, TargetType};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: BTreeMap<String, EntityMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `metadata`, merging into an existing entry of the same name.
    pub fn register(&mut self, metadata: EntityMetadata) {
        match self.entries.get_mut(&metadata.name) {
            Some(existing) => {
                debug!(entity = %metadata.name, source = %metadata.source, "Merging entity metadata");
                existing.merge(metadata);
            }
            None => {
                debug!(entity = %metadata.name, source = %metadata.source, "Registering entity metadata");
                self.entries.insert(metadata.name.clone(), metadata);
            }
        }
    }

    /// Registers the descriptor table and constructor of `T`.
    pub fn register_type<T: EntityType>(&mut self) {
        self.register(EntityMetadata::of::<T>());
    }

    /// Metadata for `name`, or [`ModelError::UnknownEntityType`].
    pub fn resolve(&self, name: &str) -> ModelResult<&EntityMetadata> {
        self.entries
            .get(name)
            .ok_or_else(|| ModelError::UnknownEntityType(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityMetadata> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Read-only view of every registered type.
    #[must_use]
    pub fn snapshot(&self) -> &BTreeMap<String, EntityMetadata> {
        &self.entries
    }

    /// Resolves every deferred or named relationship target to a registered
    /// type name. Order of registration does not matter, since this runs
    /// after all types are known. Returns the number of targets resolved.
    pub fn resolve_targets(&mut self) -> ModelResult<usize> {
        let known: Vec<String> = self.entries.keys().cloned().collect();
        let mut resolved = 0;

        for meta in self.entries.values_mut() {
            for (prop_name, prop) in meta.properties.iter_mut() {
                let target = match prop.target() {
                    TargetType::None | TargetType::Resolved(_) => continue,
                    TargetType::Deferred(f) => f().to_string(),
                    TargetType::Named(name) => name.clone(),
                };
                if !known.contains(&target) {
                    return Err(ModelError::DiscoveryFailure(format!(
                        "'{}.{}' targets unregistered entity type '{}'",
                        meta.name, prop_name, target
                    )));
                }
                prop.set_resolved(target);
                resolved += 1;
            }
        }

        debug!(resolved, "Resolved relationship targets");
        Ok(resolved)
    }

    /// Checks that every type is constructible and self-consistent.
    pub fn validate(&self) -> ModelResult<()> {
        for meta in self.entries.values() {
            if !meta.has_constructor() {
                return Err(ModelError::DiscoveryFailure(format!(
                    "entity type '{}' ({}) has no registered constructor",
                    meta.name, meta.source
                )));
            }
            for param in &meta.constructor_params {
                if !meta.properties.contains_key(param) {
                    return Err(ModelError::DiscoveryFailure(format!(
                        "constructor parameter '{}.{}' is not a declared property",
                        meta.name, param
                    )));
                }
            }
            for (prop_name, prop) in &meta.properties {
                if !prop.is_relationship() {
                    continue;
                }
                match prop.target_type() {
                    Some(target) if self.entries.contains_key(target) => {}
                    _ => {
                        return Err(ModelError::DiscoveryFailure(format!(
                            "relationship '{}.{}' has no resolved target",
                            meta.name, prop_name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
