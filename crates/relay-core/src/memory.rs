//! In-memory object graph implementing [`TargetDeviceModel`].
//!
//! Used by tests and dry runs. Objects live in a flat arena keyed by id;
//! `loc_name` and `fold_id` are derived from the arena rather than stored as
//! ordinary attributes.

use std::collections::BTreeMap;

use relay_model::{AttrValue, ObjectId};

use crate::error::ModelError;
use crate::model::{ContentFilter, ModelResult, NAME_ATTR, PARENT_ATTR, TargetDeviceModel};

#[derive(Debug, Clone, PartialEq)]
struct Node {
    class: String,
    name: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    attributes: BTreeMap<String, AttrValue>,
}

/// Counters describing what a run did to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub created: usize,
    pub deleted: usize,
    pub writes: usize,
    pub commits: usize,
}

#[derive(Debug, Clone)]
pub struct InMemoryModel {
    nodes: BTreeMap<ObjectId, Node>,
    next_id: u64,
    root: ObjectId,
    library: ObjectId,
    stats: ModelStats,
}

impl Default for InMemoryModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModel {
    /// Empty project with a root folder and a type library folder.
    pub fn new() -> Self {
        let mut model = Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            root: ObjectId(0),
            library: ObjectId(0),
            stats: ModelStats::default(),
        };
        model.root = model.insert(None, "IntPrj", "Project");
        model.library = model.insert(Some(model.root), "IntLibrary", "Library");
        model
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn library(&self) -> ObjectId {
        self.library
    }

    /// Seed an object without counting it as created by a run.
    pub fn add(&mut self, parent: ObjectId, class: &str, name: &str) -> ObjectId {
        self.insert(Some(parent), class, name)
    }

    /// Seed an attribute without counting it as a write.
    pub fn set(&mut self, object: ObjectId, name: &str, value: impl Into<AttrValue>) {
        if let Some(node) = self.nodes.get_mut(&object) {
            node.attributes.insert(name.to_string(), value.into());
        }
    }

    /// Seeding helper that returns the object for chaining.
    pub fn with(&mut self, object: ObjectId, name: &str, value: impl Into<AttrValue>) -> ObjectId {
        self.set(object, name, value);
        object
    }

    /// Attribute value, or `Null` for unknown objects and unset attributes.
    pub fn attr(&self, object: ObjectId, name: &str) -> AttrValue {
        self.get_attribute(object, name).unwrap_or(AttrValue::Null)
    }

    pub fn exists(&self, object: ObjectId) -> bool {
        self.nodes.contains_key(&object)
    }

    pub fn stats(&self) -> ModelStats {
        self.stats
    }

    pub fn object_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every object's name, class and attributes, keyed by id.
    pub fn snapshot(&self) -> BTreeMap<ObjectId, (String, String, BTreeMap<String, AttrValue>)> {
        self.nodes
            .iter()
            .map(|(id, node)| {
                (
                    *id,
                    (node.class.clone(), node.name.clone(), node.attributes.clone()),
                )
            })
            .collect()
    }

    fn insert(&mut self, parent: Option<ObjectId>, class: &str, name: &str) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                class: class.to_string(),
                name: name.to_string(),
                parent,
                children: Vec::new(),
                attributes: BTreeMap::new(),
            },
        );
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        id
    }

    fn node(&self, object: ObjectId) -> ModelResult<&Node> {
        self.nodes.get(&object).ok_or(ModelError::UnknownObject(object))
    }

    fn collect(&self, object: ObjectId, filter: &ContentFilter, recursive: bool, out: &mut Vec<ObjectId>) {
        let Some(node) = self.nodes.get(&object) else {
            return;
        };
        for child in &node.children {
            let Some(child_node) = self.nodes.get(child) else {
                continue;
            };
            if filter.matches(&child_node.name, &child_node.class) {
                out.push(*child);
            }
            if recursive {
                self.collect(*child, filter, true, out);
            }
        }
    }
}

impl TargetDeviceModel for InMemoryModel {
    fn get_attribute(&self, object: ObjectId, name: &str) -> ModelResult<AttrValue> {
        let node = self.node(object)?;
        Ok(match name {
            NAME_ATTR => AttrValue::text(node.name.as_str()),
            PARENT_ATTR => node.parent.into(),
            _ => node.attributes.get(name).cloned().unwrap_or(AttrValue::Null),
        })
    }

    fn set_attribute(&mut self, object: ObjectId, name: &str, value: AttrValue) -> ModelResult<()> {
        let node = self
            .nodes
            .get_mut(&object)
            .ok_or(ModelError::UnknownObject(object))?;
        match name {
            NAME_ATTR => {
                let AttrValue::Text(text) = value else {
                    return Err(ModelError::type_mismatch(object, name, "text"));
                };
                node.name = text;
            }
            PARENT_ATTR => return Err(ModelError::type_mismatch(object, name, "writable")),
            _ => {
                node.attributes.insert(name.to_string(), value);
            }
        }
        self.stats.writes += 1;
        Ok(())
    }

    fn get_contents(
        &self,
        object: ObjectId,
        filter: &ContentFilter,
        recursive: bool,
    ) -> ModelResult<Vec<ObjectId>> {
        self.node(object)?;
        let mut out = Vec::new();
        self.collect(object, filter, recursive, &mut out);
        Ok(out)
    }

    fn create_object(&mut self, parent: ObjectId, class: &str, name: &str) -> ModelResult<ObjectId> {
        if !self.exists(parent) {
            return Err(ModelError::Create {
                class: class.to_string(),
                name: name.to_string(),
                reason: format!("parent {parent} does not exist"),
            });
        }
        self.stats.created += 1;
        Ok(self.insert(Some(parent), class, name))
    }

    fn delete(&mut self, object: ObjectId) -> ModelResult<()> {
        let node = self
            .nodes
            .remove(&object)
            .ok_or(ModelError::UnknownObject(object))?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != object);
        }
        for child in node.children {
            // Children go with their parent; they may already be gone.
            let _ = self.delete(child);
        }
        self.stats.deleted += 1;
        Ok(())
    }

    fn commit(&mut self) -> ModelResult<()> {
        self.stats.commits += 1;
        Ok(())
    }

    fn class_name(&self, object: ObjectId) -> ModelResult<String> {
        Ok(self.node(object)?.class.clone())
    }

    fn local_library(&self) -> ModelResult<ObjectId> {
        Ok(self.library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_filter_by_name_and_class() {
        let mut model = InMemoryModel::new();
        let cubicle = model.add(model.root(), "StaCubic", "Cub_1");
        let relay = model.add(cubicle, "ElmRelay", "NIP1A_R1");
        model.add(relay, "RelToc", "I>");
        model.add(cubicle, "StaCt", "NIP1A_CT");

        let relays = model
            .get_contents(cubicle, &ContentFilter::class("ElmRelay"), false)
            .expect("cubicle exists");
        assert_eq!(relays, [relay]);

        let nested = model
            .get_contents(model.root(), &ContentFilter::named("I>"), true)
            .expect("root exists");
        assert_eq!(nested.len(), 1);
        assert_eq!(model.parent(nested[0]).expect("parent"), Some(relay));
    }

    #[test]
    fn delete_removes_subtree() {
        let mut model = InMemoryModel::new();
        let cubicle = model.add(model.root(), "StaCubic", "Cub_1");
        let relay = model.add(cubicle, "ElmRelay", "R1");
        let element = model.add(relay, "RelToc", "I>");

        model.delete(relay).expect("relay exists");
        assert!(!model.exists(element));
        assert!(
            model
                .get_contents(cubicle, &ContentFilter::any(), false)
                .expect("cubicle exists")
                .is_empty()
        );
        assert_eq!(model.stats().deleted, 2);
    }
}
