#![allow(dead_code)]

use docmap_model::{
    Collection, ConstructorArgs, Entity, EntityBase, EntityHandle, EntityMetadata, EntityType,
    ModelError, ModelResult, PropertyDescriptor, PropertyValue,
};
use docmap_orm::{DocMap, Options};
use docmap_types::{document_from_json, Document, Value};

pub const AUTHOR_ID: &str = "5f0c1a2b3c4d5e6f70819201";
pub const BOOK_ID: &str = "5f0c1a2b3c4d5e6f70819301";
pub const OTHER_BOOK_ID: &str = "5f0c1a2b3c4d5e6f70819302";

/// An author writing many books.
#[derive(Debug, Default)]
pub struct Author {
    pub base: EntityBase,
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub books: Option<Collection>,
    pub favourite_book: Option<EntityHandle>,
}

impl Entity for Author {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "name" => self.name.clone().map(|v| Value::String(v).into()),
            "email" => self.email.clone().map(|v| Value::String(v).into()),
            "age" => self.age.map(|v| Value::Int(v).into()),
            "books" => self.books.clone().map(PropertyValue::Collection),
            "favouriteBook" => self.favourite_book.clone().map(PropertyValue::Reference),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> ModelResult<()> {
        match name {
            "name" => self.name = value.into_scalar(Self::NAME, name)?,
            "email" => self.email = value.into_scalar(Self::NAME, name)?,
            "age" => self.age = value.into_scalar(Self::NAME, name)?,
            "books" => self.books = Some(value.into_collection(Self::NAME, name)?),
            "favouriteBook" => self.favourite_book = value.into_reference(Self::NAME, name)?,
            _ => return Err(ModelError::unknown_property(Self::NAME, name)),
        }
        Ok(())
    }
}

impl EntityType for Author {
    const NAME: &'static str = "Author";

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::NAME)
            .with_property("name", PropertyDescriptor::scalar())
            .with_property("email", PropertyDescriptor::scalar())
            .with_property("age", PropertyDescriptor::scalar())
            .with_property("books", PropertyDescriptor::collection(|| Book::NAME))
            .with_property("favouriteBook", PropertyDescriptor::reference(|| Book::NAME))
            .with_constructor_params(&["name", "email"])
    }

    /// Trims the name, so tests can tell constructor-set values from
    /// values copied during property application.
    fn construct(mut args: ConstructorArgs) -> ModelResult<Self> {
        let name: Option<String> = args.scalar(0)?;
        Ok(Self {
            name: name.map(|n| n.trim().to_string()),
            email: args.scalar(1)?,
            ..Self::default()
        })
    }
}

/// A book with one author.
#[derive(Debug, Default)]
pub struct Book {
    pub base: EntityBase,
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<EntityHandle>,
}

impl Entity for Book {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "title" => self.title.clone().map(|v| Value::String(v).into()),
            "tags" => self.tags.clone().map(|tags| {
                Value::Array(tags.into_iter().map(Value::String).collect()).into()
            }),
            "author" => self.author.clone().map(PropertyValue::Reference),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> ModelResult<()> {
        match name {
            "title" => self.title = value.into_scalar(Self::NAME, name)?,
            "tags" => self.tags = value.into_scalar(Self::NAME, name)?,
            "author" => self.author = value.into_reference(Self::NAME, name)?,
            _ => return Err(ModelError::unknown_property(Self::NAME, name)),
        }
        Ok(())
    }
}

impl EntityType for Book {
    const NAME: &'static str = "Book";

    fn metadata() -> EntityMetadata {
        EntityMetadata::new(Self::NAME)
            .with_property("title", PropertyDescriptor::scalar())
            .with_property("tags", PropertyDescriptor::scalar())
            .with_property("author", PropertyDescriptor::reference(|| Author::NAME))
            .with_constructor_params(&["title", "author"])
    }

    fn construct(mut args: ConstructorArgs) -> ModelResult<Self> {
        Ok(Self {
            title: args.scalar(0)?,
            author: args.reference(1)?,
            ..Self::default()
        })
    }
}

/// An ORM over `Author` and `Book`.
pub fn orm() -> DocMap {
    DocMap::builder(Options::new("library"))
        .entity::<Author>()
        .entity::<Book>()
        .init()
        .expect("init")
}

pub fn doc(json: serde_json::Value) -> Document {
    document_from_json(json)
}

pub fn author_name(handle: &EntityHandle) -> Option<String> {
    handle.with(|a: &Author| a.name.clone()).flatten()
}

pub fn book_author(handle: &EntityHandle) -> Option<EntityHandle> {
    handle.with(|b: &Book| b.author.clone()).flatten()
}

pub fn author_books(handle: &EntityHandle) -> Collection {
    handle
        .with(|a: &Author| a.books.clone())
        .flatten()
        .expect("books proxy")
}
