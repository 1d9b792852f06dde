//! Abstraction over the network model application that receives settings.
//!
//! Objects are opaque [`ObjectId`] handles. Every object has a class name, a
//! `loc_name` attribute and a parent reachable through `fold_id`. Attributes
//! that were never set read as [`AttrValue::Null`].

use relay_model::{AttrValue, ObjectId};

use crate::error::ModelError;

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Attribute holding an object's name.
pub const NAME_ATTR: &str = "loc_name";
/// Attribute referencing an object's parent folder.
pub const PARENT_ATTR: &str = "fold_id";
/// Attribute referencing an object's type.
pub const TYPE_ATTR: &str = "typ_id";

/// Selects children by exact name and/or class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub name: Option<String>,
    pub class: Option<String>,
}

impl ContentFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            class: None,
        }
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self {
            name: None,
            class: Some(class.into()),
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn matches(&self, name: &str, class: &str) -> bool {
        self.name.as_deref().is_none_or(|n| n == name)
            && self.class.as_deref().is_none_or(|c| c == class)
    }
}

/// Object graph of the target application.
pub trait TargetDeviceModel {
    fn get_attribute(&self, object: ObjectId, name: &str) -> ModelResult<AttrValue>;

    fn set_attribute(&mut self, object: ObjectId, name: &str, value: AttrValue) -> ModelResult<()>;

    /// Children of `object` passing `filter`, depth first when `recursive`.
    fn get_contents(
        &self,
        object: ObjectId,
        filter: &ContentFilter,
        recursive: bool,
    ) -> ModelResult<Vec<ObjectId>>;

    fn create_object(&mut self, parent: ObjectId, class: &str, name: &str) -> ModelResult<ObjectId>;

    fn delete(&mut self, object: ObjectId) -> ModelResult<()>;

    /// Persist all pending writes.
    fn commit(&mut self) -> ModelResult<()>;

    fn class_name(&self, object: ObjectId) -> ModelResult<String>;

    /// Root folder of the project's type library.
    fn local_library(&self) -> ModelResult<ObjectId>;

    fn name(&self, object: ObjectId) -> ModelResult<String> {
        Ok(self
            .get_attribute(object, NAME_ATTR)?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn rename(&mut self, object: ObjectId, name: &str) -> ModelResult<()> {
        self.set_attribute(object, NAME_ATTR, AttrValue::text(name))
    }

    fn parent(&self, object: ObjectId) -> ModelResult<Option<ObjectId>> {
        self.reference(object, PARENT_ATTR)
    }

    /// Object referenced by an attribute, if any.
    fn reference(&self, object: ObjectId, attribute: &str) -> ModelResult<Option<ObjectId>> {
        Ok(self.get_attribute(object, attribute)?.as_ref())
    }

    /// Name of the object referenced by an attribute.
    fn reference_name(&self, object: ObjectId, attribute: &str) -> ModelResult<Option<String>> {
        match self.reference(object, attribute)? {
            Some(target) => self.name(target).map(Some),
            None => Ok(None),
        }
    }

    /// First direct child with the given name and class.
    fn find_child(&self, parent: ObjectId, name: &str, class: &str) -> ModelResult<Option<ObjectId>> {
        let filter = ContentFilter::named(name).with_class(class);
        Ok(self.get_contents(parent, &filter, false)?.into_iter().next())
    }
}
