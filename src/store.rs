use std::collections::BTreeMap;

use crate::domain::NormalizedEntity;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<String, NormalizedEntity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, entity: NormalizedEntity) {
        self.entities.insert(entity.id().to_string(), entity);
    }

    pub fn remove(&mut self, id: &str) {
        self.entities.remove(id);
    }

    pub fn reset(&mut self) {
        self.entities.clear();
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedEntity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &NormalizedEntity> {
        self.entities.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityId;

    fn entity(id: &str, name: &str) -> NormalizedEntity {
        let id: EntityId = id.parse().unwrap();
        NormalizedEntity::new(&id, name.to_string(), &[name.to_string()], None)
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut store = EntityStore::new();
        store.upsert(entity("7", "squirtle"));
        store.upsert(entity("7", "wartortle"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("7").map(|e| e.name()), Some("wartortle"));
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut store = EntityStore::new();
        store.upsert(entity("1", "bulbasaur"));
        store.remove("25");

        assert_eq!(store.len(), 1);
        assert!(store.get("1").is_some());
    }

    #[test]
    fn reset_empties() {
        let mut store = EntityStore::new();
        store.upsert(entity("1", "bulbasaur"));
        store.upsert(entity("4", "charmander"));
        store.reset();
        store.remove("1");

        assert!(store.is_empty());
        assert_eq!(store.entities().count(), 0);
    }
}
