#![allow(dead_code)]

use docmap_model::{
    Collection, ConstructorArgs, Entity, EntityBase, EntityHandle, EntityMetadata, EntityType,
    ModelError, ModelResult, PropertyDescriptor, PropertyValue,
};
use docmap_types::Value;

/// A folder holding many notes.
#[derive(Debug, Default)]
pub struct Folder {
    pub base: EntityBase,
    pub title: Option<String>,
    pub notes: Option<Collection>,
}

impl Entity for Folder {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "title" => self.title.clone().map(|t| PropertyValue::Value(Value::String(t))),
            "notes" => self.notes.clone().map(PropertyValue::Collection),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> ModelResult<()> {
        match name {
            "title" => self.title = value.into_scalar(Self::NAME, name)?,
            "notes" => self.notes = Some(value.into_collection(Self::NAME, name)?),
            _ => return Err(ModelError::unknown_property(Self::NAME, name)),
        }
        Ok(())
    }
}

impl EntityType for Folder {
    const NAME: &'static str = "Folder";

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::NAME)
            .with_property("title", PropertyDescriptor::scalar())
            .with_property("notes", PropertyDescriptor::collection(|| Note::NAME))
    }

    fn construct(_args: ConstructorArgs) -> ModelResult<Self> {
        Ok(Self::default())
    }
}

/// A note filed in one folder.
#[derive(Debug, Default)]
pub struct Note {
    pub base: EntityBase,
    pub body: Option<String>,
    pub pinned: Option<bool>,
    pub folder: Option<EntityHandle>,
}

impl Entity for Note {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "body" => self.body.clone().map(|b| PropertyValue::Value(Value::String(b))),
            "pinned" => self.pinned.map(|p| PropertyValue::Value(Value::Bool(p))),
            "folder" => self.folder.clone().map(PropertyValue::Reference),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> ModelResult<()> {
        match name {
            "body" => self.body = value.into_scalar(Self::NAME, name)?,
            "pinned" => self.pinned = value.into_scalar(Self::NAME, name)?,
            "folder" => self.folder = value.into_reference(Self::NAME, name)?,
            _ => return Err(ModelError::unknown_property(Self::NAME, name)),
        }
        Ok(())
    }
}

impl EntityType for Note {
    const NAME: &'static str = "Note";

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::NAME)
            .with_property("body", PropertyDescriptor::scalar())
            .with_property("pinned", PropertyDescriptor::scalar())
            .with_property("folder", PropertyDescriptor::reference(|| Folder::NAME))
            .with_constructor_params(&["body"])
    }

    fn construct(mut args: ConstructorArgs) -> ModelResult<Self> {
        Ok(Self {
            body: args.scalar(0)?,
            ..Self::default()
        })
    }
}

pub fn folder() -> EntityHandle {
    EntityHandle::new(Folder::default())
}

pub fn note(body: &str) -> EntityHandle {
    EntityHandle::new(Note {
        body: Some(body.to_string()),
        ..Note::default()
    })
}
