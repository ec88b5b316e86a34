mod common;

use common::{Folder, Note};
use docmap_model::{
    ConstructorArgs, EntityMetadata, EntityType, MetadataRegistry, ModelError,
    PropertyDescriptor, SourceLocation, TargetType,
};
use docmap_types::Value;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn registry_in_order(folder_first: bool) -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    if folder_first {
        registry.register_type::<Folder>();
        registry.register_type::<Note>();
    } else {
        registry.register_type::<Note>();
        registry.register_type::<Folder>();
    }
    registry
}

// ── Registration & lookup ────────────────────────────────────────

#[test]
fn register_type_records_descriptor_table() {
    let registry = registry_in_order(true);
    assert_eq!(registry.len(), 2);

    let note = registry.resolve("Note").unwrap();
    assert_eq!(note.name, "Note");
    assert_eq!(note.constructor_params, vec!["body".to_string()]);
    assert!(note.has_constructor());
    assert!(note.property("folder").unwrap().reference);
    assert!(!note.property("folder").unwrap().collection);
    assert!(note.property("body").is_some());
}

#[test]
fn register_type_records_rust_type_as_source() {
    let registry = registry_in_order(true);
    match &registry.resolve("Folder").unwrap().source {
        SourceLocation::Type(path) => assert!(path.ends_with("Folder")),
        other => panic!("unexpected source {other:?}"),
    }
}

#[test]
fn resolve_unknown_type_fails() {
    let registry = MetadataRegistry::new();
    let err = registry.resolve("Ghost").unwrap_err();
    assert!(matches!(err, ModelError::UnknownEntityType(ref n) if n == "Ghost"));
    assert_eq!(err.to_string(), "unknown entity type: Ghost");
}

#[test]
fn names_are_sorted_and_snapshot_is_complete() {
    let registry = registry_in_order(false);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Folder", "Note"]);
    assert_eq!(registry.snapshot().len(), 2);
    assert!(registry.contains("Note"));
    assert!(!registry.contains("Nope"));
}

// ── Merging ──────────────────────────────────────────────────────

#[test]
fn register_merges_properties_and_params() {
    let mut registry = registry_in_order(true);
    registry.register(
        EntityMetadata::new("Note")
            .with_property("color", PropertyDescriptor::scalar())
            .with_source(SourceLocation::File(PathBuf::from("entities/Note.toml"))),
    );

    let note = registry.resolve("Note").unwrap();
    assert!(note.property("color").is_some());
    assert!(note.property("body").is_some());
    assert_eq!(note.constructor_params, vec!["body".to_string()]);
    assert!(note.has_constructor());
    assert!(matches!(note.source, SourceLocation::Type(_)));
}

#[test]
fn merge_fills_missing_constructor() {
    let mut registry = MetadataRegistry::new();
    registry.register(EntityMetadata::new("Note").with_property("extra", PropertyDescriptor::scalar()));
    assert!(!registry.resolve("Note").unwrap().has_constructor());

    registry.register_type::<Note>();
    let note = registry.resolve("Note").unwrap();
    assert!(note.has_constructor());
    assert!(note.property("extra").is_some());
}

#[test]
fn merge_replaces_params_when_non_empty() {
    let mut registry = registry_in_order(true);
    registry.register(EntityMetadata::new("Note").with_constructor_params(&["pinned", "body"]));
    assert_eq!(
        registry.resolve("Note").unwrap().constructor_params,
        vec!["pinned".to_string(), "body".to_string()]
    );
}

// ── Forward-reference fixup ──────────────────────────────────────

#[test]
fn targets_unresolved_before_fixup() {
    let registry = registry_in_order(true);
    let folder = registry.resolve("Folder").unwrap();
    assert_eq!(folder.property("notes").unwrap().target_type(), None);
}

#[test]
fn mutual_references_resolve_in_either_order() {
    for folder_first in [true, false] {
        let mut registry = registry_in_order(folder_first);
        let resolved = registry.resolve_targets().unwrap();
        assert_eq!(resolved, 2);

        let folder = registry.resolve("Folder").unwrap();
        let note = registry.resolve("Note").unwrap();
        assert_eq!(folder.property("notes").unwrap().target_type(), Some("Note"));
        assert_eq!(note.property("folder").unwrap().target_type(), Some("Folder"));
    }
}

#[test]
fn fixup_is_idempotent() {
    let mut registry = registry_in_order(true);
    registry.resolve_targets().unwrap();
    assert_eq!(registry.resolve_targets().unwrap(), 0);
}

#[test]
fn named_targets_resolve() {
    let mut registry = registry_in_order(true);
    registry.register(
        EntityMetadata::new("Note")
            .with_property("parent", PropertyDescriptor::named(true, false, Some("Note".into()))),
    );
    registry.resolve_targets().unwrap();
    let parent = registry.resolve("Note").unwrap().property("parent").unwrap().clone();
    assert!(matches!(parent.target(), TargetType::Resolved(n) if n == "Note"));
}

#[test]
fn fixup_fails_on_unregistered_target() {
    let mut registry = MetadataRegistry::new();
    registry.register_type::<Note>();
    let err = registry.resolve_targets().unwrap_err();
    assert!(matches!(err, ModelError::DiscoveryFailure(_)));
    assert!(err.to_string().contains("'Note.folder' targets unregistered entity type 'Folder'"));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_passes_after_fixup() {
    let mut registry = registry_in_order(true);
    registry.resolve_targets().unwrap();
    registry.validate().unwrap();
}

#[test]
fn validate_requires_resolved_targets() {
    let registry = registry_in_order(true);
    let err = registry.validate().unwrap_err();
    assert!(err.to_string().contains("has no resolved target"));
}

#[test]
fn validate_requires_constructor() {
    let mut registry = MetadataRegistry::new();
    registry.register(EntityMetadata::new("Loose"));
    let err = registry.validate().unwrap_err();
    assert!(err.to_string().contains("no registered constructor"));
}

#[test]
fn validate_requires_declared_constructor_params() {
    let mut registry = registry_in_order(true);
    registry.register(EntityMetadata::new("Note").with_constructor_params(&["missing"]));
    registry.resolve_targets().unwrap();
    let err = registry.validate().unwrap_err();
    assert!(err.to_string().contains("'Note.missing' is not a declared property"));
}

// ── Construction through metadata ────────────────────────────────

#[test]
fn metadata_constructs_entity_handle() {
    let registry = registry_in_order(true);
    let meta = registry.resolve("Note").unwrap();
    let args = ConstructorArgs::new("Note", vec![("body".into(), Some(Value::from("hey").into()))]);
    let handle = meta.construct(args).unwrap();
    assert_eq!(handle.entity_name(), Note::NAME);
    assert_eq!(handle.with(|n: &Note| n.body.clone()).flatten().as_deref(), Some("hey"));
}

#[test]
fn metadata_without_constructor_fails_to_construct() {
    let meta = EntityMetadata::new("Loose");
    let err = meta.construct(ConstructorArgs::empty("Loose")).unwrap_err();
    assert!(matches!(err, ModelError::MissingConstructor(ref n) if n == "Loose"));
}
