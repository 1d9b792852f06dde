//! Relay and fuse type lookups over the project library.

use std::collections::BTreeMap;

use relay_model::ObjectId;
use tracing::debug;

use crate::error::Result;
use crate::model::{ContentFilter, TargetDeviceModel};

pub const RELAY_TYPE_CLASS: &str = "TypRelay";
pub const FUSE_TYPE_CLASS: &str = "TypFuse";

/// Library types indexed once per run.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    relays: BTreeMap<String, ObjectId>,
    /// Fuse types grouped by the upper-cased last character of their name.
    fuses: BTreeMap<char, Vec<(String, ObjectId)>>,
}

impl TypeIndex {
    /// Index every relay and fuse type under the local library.
    ///
    /// When two relay types share a name the first one found wins.
    pub fn build(model: &dyn TargetDeviceModel) -> Result<Self> {
        let library = model.local_library()?;
        let mut index = Self::default();

        for object in model.get_contents(library, &ContentFilter::class(RELAY_TYPE_CLASS), true)? {
            index.relays.entry(model.name(object)?).or_insert(object);
        }
        for object in model.get_contents(library, &ContentFilter::class(FUSE_TYPE_CLASS), true)? {
            let name = model.name(object)?;
            if let Some(curve) = curve_letter(&name) {
                index.fuses.entry(curve).or_default().push((name, object));
            }
        }

        debug!(
            relay_types = index.relays.len(),
            fuse_types = index.fuse_count(),
            "indexed library types"
        );
        Ok(index)
    }

    pub fn relay(&self, name: &str) -> Option<ObjectId> {
        self.relays.get(name).copied()
    }

    pub fn relay_count(&self) -> usize {
        self.relays.len()
    }

    pub fn fuse_count(&self) -> usize {
        self.fuses.values().map(Vec::len).sum()
    }

    /// First fuse type with this curve letter whose name contains `rating`.
    pub fn fuse_by_curve_and_rating(&self, curve: &str, rating: &str) -> Option<ObjectId> {
        let curve = curve_letter(curve)?;
        self.fuses
            .get(&curve)?
            .iter()
            .find(|(name, _)| name.contains(rating))
            .map(|(_, object)| *object)
    }

    /// Fuse type for a size such as `100K`: curve letter last, rating before it.
    pub fn fuse_by_size(&self, size: &str) -> Option<ObjectId> {
        if size.chars().count() < 2 {
            return None;
        }
        let curve = curve_letter(size)?;
        let rating = &size[..size.len() - size.chars().last()?.len_utf8()];
        self.fuses
            .get(&curve)?
            .iter()
            .find(|(name, _)| name.contains(rating))
            .map(|(_, object)| *object)
    }
}

fn curve_letter(name: &str) -> Option<char> {
    name.chars().last().map(|c| c.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryModel;

    #[test]
    fn fuse_lookups_use_curve_letter() {
        let mut model = InMemoryModel::new();
        let library = model.library();
        let fuses = model.add(library, "IntFolder", "Fuses");
        let k100 = model.add(fuses, FUSE_TYPE_CLASS, "HRC 100A K");
        let t50 = model.add(fuses, FUSE_TYPE_CLASS, "EDO 50A T");
        model.add(fuses, FUSE_TYPE_CLASS, "EDO 100A T");

        let index = TypeIndex::build(&model).expect("index builds");
        assert_eq!(index.fuse_count(), 3);
        assert_eq!(index.fuse_by_curve_and_rating("k", " 100A"), Some(k100));
        assert_eq!(index.fuse_by_size("50T"), Some(t50));
        assert_eq!(index.fuse_by_size("T"), None);
        assert_eq!(index.fuse_by_curve_and_rating("K", " 50A"), None);
    }
}
