//! Entity discovery.
//!
//! Builds the [`MetadataRegistry`] in one synchronous pass: explicitly listed
//! types first, then descriptor tables found in `entities_dirs`, then target
//! fixup and validation.
//!
//! Descriptor tables describe the persisted shape of a type that is
//! registered in code. They are checked against the compiled metadata and
//! never change it: a file naming an unknown property, a different property
//! kind or target, or a different constructor parameter list fails
//! discovery. A descriptor table is a TOML file:
//!
//! ```toml
//! name = "Book"                    # defaults to the file stem
//! constructor_params = ["title", "author"]
//!
//! [properties.author]
//! reference = true
//! target = "Author"
//! ```

use crate::{OrmError, OrmResult, Options};
use docmap_model::{EntityMetadata, MetadataRegistry, ModelError, PropertyDescriptor, SourceLocation};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Produces the static metadata of one entity type, usually
/// `<T as EntityType>::metadata` wrapped by [`EntityMetadata::of`].
pub type MetadataFn = fn() -> EntityMetadata;

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    name: Option<String>,
    #[serde(default, alias = "constructorParams")]
    constructor_params: Vec<String>,
    #[serde(default)]
    properties: BTreeMap<String, PropertyEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyEntry {
    #[serde(default)]
    reference: bool,
    #[serde(default)]
    collection: bool,
    #[serde(default, alias = "type", alias = "entity")]
    target: Option<String>,
}

/// Runs discovery and returns the finished registry.
pub fn discover(options: &Options, types: &[MetadataFn]) -> OrmResult<MetadataRegistry> {
    let started = Instant::now();
    options.log("ORM entity discovery started");
    info!(types = types.len(), dirs = options.entities_dirs.len(), "Entity discovery started");

    let mut registry = MetadataRegistry::new();

    for metadata in types {
        let metadata = metadata();
        options.log(&format!("- processing entity {}", metadata.name));
        registry.register(metadata);
    }

    if !options.entities_dirs.is_empty() {
        let base_dir = options.resolved_base_dir()?;
        for dir in &options.entities_dirs {
            for path in descriptor_files(&base_dir.join(dir))? {
                let metadata = load_descriptor(&path)?;
                options.log(&format!("- processing entity {}", metadata.name));
                check_descriptor(&registry, &metadata, &path)?;
            }
        }
    }

    if registry.is_empty() {
        return Err(OrmError::Config(
            "no entities found, please register entity types or set `entities_dirs`".to_string(),
        ));
    }

    registry.resolve_targets().map_err(|e| fixup_failure(e, "fixup"))?;
    registry.validate().map_err(|e| fixup_failure(e, "validation"))?;

    let elapsed = started.elapsed().as_millis();
    options.log(&format!("- entity discovery finished after {elapsed} ms"));
    info!(entities = registry.len(), elapsed_ms = elapsed as u64, "Entity discovery finished");
    Ok(registry)
}

/// Non-hidden `*.toml` files directly inside `dir`, sorted by path.
fn descriptor_files(dir: &Path) -> OrmResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| OrmError::discovery(dir.display().to_string(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| OrmError::discovery(dir.display().to_string(), e))?
            .path();

        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if path.is_dir() || hidden || !is_toml {
            debug!(path = %path.display(), "Skipping non-descriptor file");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn load_descriptor(path: &Path) -> OrmResult<EntityMetadata> {
    let location = path.display().to_string();
    let contents =
        std::fs::read_to_string(path).map_err(|e| OrmError::discovery(location.as_str(), e))?;
    let file: DescriptorFile =
        toml::from_str(&contents).map_err(|e| OrmError::discovery(location.as_str(), e))?;

    let name = match file.name {
        Some(name) => name,
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| OrmError::discovery(location.as_str(), "descriptor file has no name"))?,
    };
    if name.trim().is_empty() {
        return Err(OrmError::discovery(location, "entity name must not be empty"));
    }

    let mut metadata =
        EntityMetadata::new(name).with_source(SourceLocation::File(path.to_path_buf()));
    metadata.constructor_params = file.constructor_params;
    for (prop_name, entry) in file.properties {
        let descriptor = PropertyDescriptor::named(entry.reference, entry.collection, entry.target);
        metadata = metadata.with_property(prop_name, descriptor);
    }
    Ok(metadata)
}

/// Checks a file descriptor against the type registered in code.
///
/// A file may only restate what the compiled type declares: every property
/// it names must exist with the same kind and target, and a non-empty
/// parameter list must match the registered one exactly.
fn check_descriptor(
    registry: &MetadataRegistry,
    descriptor: &EntityMetadata,
    path: &Path,
) -> OrmResult<()> {
    let location = path.display().to_string();
    let registered = match registry.get(&descriptor.name) {
        Some(meta) if meta.has_constructor() => meta,
        _ => {
            return Err(OrmError::discovery(
                location,
                format!("entity type '{}' has no registered constructor", descriptor.name),
            ));
        }
    };

    for (name, prop) in &descriptor.properties {
        let Some(declared) = registered.property(name) else {
            return Err(OrmError::discovery(
                location,
                format!("property '{}.{}' is not declared by the entity type", descriptor.name, name),
            ));
        };
        if declared.reference != prop.reference || declared.collection != prop.collection {
            return Err(OrmError::discovery(
                location,
                format!(
                    "property '{}.{}' is a {} but the descriptor declares a {}",
                    descriptor.name,
                    name,
                    kind(declared),
                    kind(prop)
                ),
            ));
        }
        if let Some(target) = prop.target_name() {
            if declared.target_name().as_deref() != Some(target.as_str()) {
                return Err(OrmError::discovery(
                    location,
                    format!(
                        "property '{}.{}' targets '{}' but the descriptor names '{}'",
                        descriptor.name,
                        name,
                        declared.target_name().unwrap_or_default(),
                        target
                    ),
                ));
            }
        }
    }

    if !descriptor.constructor_params.is_empty()
        && descriptor.constructor_params != registered.constructor_params
    {
        return Err(OrmError::discovery(
            location,
            format!(
                "constructor parameters {:?} of '{}' differ from the registered {:?}",
                descriptor.constructor_params, descriptor.name, registered.constructor_params
            ),
        ));
    }

    debug!(entity = %descriptor.name, path = %path.display(), "Descriptor file matches registered type");
    Ok(())
}

fn kind(prop: &PropertyDescriptor) -> &'static str {
    if prop.collection {
        "collection"
    } else if prop.reference {
        "reference"
    } else {
        "scalar"
    }
}

fn fixup_failure(err: ModelError, stage: &str) -> OrmError {
    match err {
        ModelError::DiscoveryFailure(reason) => OrmError::discovery(stage, reason),
        other => other.into(),
    }
}
