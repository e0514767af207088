//! Node store: owns every entity of a document.
//!
//! The store keeps one insertion-ordered collection per [`ItemKind`] plus an
//! id → kind index, giving constant-time lookup by id and a stable iteration
//! order for serialization.
//!
//! Ids are never reused for the lifetime of a store. Every id the store has
//! issued or been given is remembered, so an id stored in an undo record
//! always names the same entity.
//!
//! The store does not maintain links between entities. Removing a person
//! leaves its relationships and marriage in place; cascading is the job of
//! the graph mutator.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use log::trace;
use serde::Serialize;

use lineage_core::identifier::Id;

use crate::{
    error::DocumentError,
    history::Placement,
    model::{Entity, ItemKind, ItemRef, Marriage, Person, Relationship},
};

/// An entity taken out of the store together with its position in its
/// collection, so it can be put back exactly where it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detached {
    index: usize,
    entity: Entity,
}

impl Detached {
    pub fn id(&self) -> Id {
        self.entity.id()
    }

    pub fn kind(&self) -> ItemKind {
        self.entity.kind()
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }
}

/// Issues ids that have never been seen by the store.
///
/// Reserved ids are skipped when generating but can still be registered once.
#[derive(Debug, Default)]
struct IdGenerator {
    counters: HashMap<ItemKind, u64>,
    seen: HashSet<Id>,
    reserved: HashSet<Id>,
}

impl IdGenerator {
    fn next(&mut self, kind: ItemKind) -> Id {
        let counter = self.counters.entry(kind).or_insert(0);
        loop {
            *counter += 1;
            let id = Id::from_sequence(kind.id_prefix(), *counter);
            if !self.reserved.contains(&id) && self.seen.insert(id) {
                return id;
            }
        }
    }

    /// Records an externally chosen id; returns `false` if it was already seen.
    fn register(&mut self, id: Id) -> bool {
        self.reserved.remove(&id);
        self.seen.insert(id)
    }

    fn reserve(&mut self, id: Id) {
        if !self.seen.contains(&id) {
            self.reserved.insert(id);
        }
    }
}

/// Arena of persons, relationships and marriages.
#[derive(Debug, Default)]
pub struct NodeStore {
    persons: IndexMap<Id, Person>,
    relationships: IndexMap<Id, Relationship>,
    marriages: IndexMap<Id, Marriage>,
    kinds: HashMap<Id, ItemKind>,
    ids: IdGenerator,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entity` under a freshly generated id and returns the id.
    ///
    /// Whatever id the entity carried is replaced.
    pub fn create(&mut self, mut entity: Entity) -> Id {
        let id = self.ids.next(entity.kind());
        entity.set_id(id);
        self.insert_unchecked(entity);
        trace!(id:% = id; "Entity created");
        id
    }

    /// Inserts `entity` under the id it already carries.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if the id was issued before,
    /// even if that entity has since been removed.
    pub fn create_with_id(&mut self, entity: Entity) -> Result<Id, DocumentError> {
        let id = entity.id();
        if !self.ids.register(id) {
            return Err(DocumentError::invalid(format!("id `{id}` is already in use")));
        }
        self.insert_unchecked(entity);
        Ok(id)
    }

    /// Keeps generated ids away from `id` until it is inserted with
    /// [`create_with_id`](Self::create_with_id).
    ///
    /// Lets a loader claim every explicit id of a file before it inserts
    /// entities that need a generated one.
    pub fn reserve_id(&mut self, id: Id) {
        self.ids.reserve(id);
    }

    /// Looks up any entity by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnknownId`] if no entity has this id.
    pub fn get(&self, id: Id) -> Result<ItemRef<'_>, DocumentError> {
        let item = match self.kinds.get(&id) {
            Some(ItemKind::Person) => self.persons.get(&id).map(ItemRef::Person),
            Some(ItemKind::Relationship) => self.relationships.get(&id).map(ItemRef::Relationship),
            Some(ItemKind::Marriage) => self.marriages.get(&id).map(ItemRef::Marriage),
            None => None,
        };
        item.ok_or(DocumentError::UnknownId(id))
    }

    pub fn exists(&self, id: Id) -> bool {
        self.kinds.contains_key(&id)
    }

    pub fn kind_of(&self, id: Id) -> Option<ItemKind> {
        self.kinds.get(&id).copied()
    }

    /// Detaches an entity from the store. Nothing else is touched.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnknownId`] if no entity has this id.
    pub fn remove(&mut self, id: Id) -> Result<Detached, DocumentError> {
        let kind = self
            .kinds
            .remove(&id)
            .ok_or(DocumentError::UnknownId(id))?;
        let detached = match kind {
            ItemKind::Person => self
                .persons
                .shift_remove_full(&id)
                .map(|(index, _, person)| Detached {
                    index,
                    entity: Entity::Person(person),
                }),
            ItemKind::Relationship => {
                self.relationships
                    .shift_remove_full(&id)
                    .map(|(index, _, relationship)| Detached {
                        index,
                        entity: Entity::Relationship(relationship),
                    })
            }
            ItemKind::Marriage => {
                self.marriages
                    .shift_remove_full(&id)
                    .map(|(index, _, marriage)| Detached {
                        index,
                        entity: Entity::Marriage(marriage),
                    })
            }
        };
        trace!(id:% = id; "Entity removed");
        detached.ok_or(DocumentError::not_found(kind, id))
    }

    /// Puts a detached entity back at its former position with its former id.
    pub fn restore(&mut self, detached: Detached) {
        let Detached { index, entity } = detached;
        let id = entity.id();
        self.ids.register(id);
        self.kinds.insert(id, entity.kind());
        match entity {
            Entity::Person(person) => {
                let index = index.min(self.persons.len());
                self.persons.shift_insert(index, id, person);
            }
            Entity::Relationship(relationship) => {
                let index = index.min(self.relationships.len());
                self.relationships.shift_insert(index, id, relationship);
            }
            Entity::Marriage(marriage) => {
                let index = index.min(self.marriages.len());
                self.marriages.shift_insert(index, id, marriage);
            }
        }
        trace!(id:% = id; "Entity restored");
    }

    /// Snapshot of a live entity, positioned where it currently is.
    pub(crate) fn snapshot(&self, id: Id) -> Result<Detached, DocumentError> {
        let kind = *self.kinds.get(&id).ok_or(DocumentError::UnknownId(id))?;
        let snapshot = match kind {
            ItemKind::Person => self
                .persons
                .get_full(&id)
                .map(|(index, _, person)| Detached {
                    index,
                    entity: Entity::Person(person.clone()),
                }),
            ItemKind::Relationship => {
                self.relationships
                    .get_full(&id)
                    .map(|(index, _, relationship)| Detached {
                        index,
                        entity: Entity::Relationship(relationship.clone()),
                    })
            }
            ItemKind::Marriage => self
                .marriages
                .get_full(&id)
                .map(|(index, _, marriage)| Detached {
                    index,
                    entity: Entity::Marriage(marriage.clone()),
                }),
        };
        snapshot.ok_or(DocumentError::not_found(kind, id))
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if no person has this id.
    pub fn person(&self, id: Id) -> Result<&Person, DocumentError> {
        self.persons
            .get(&id)
            .ok_or(DocumentError::not_found(ItemKind::Person, id))
    }

    pub(crate) fn person_mut(&mut self, id: Id) -> Result<&mut Person, DocumentError> {
        self.persons
            .get_mut(&id)
            .ok_or(DocumentError::not_found(ItemKind::Person, id))
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if no relationship has this id.
    pub fn relationship(&self, id: Id) -> Result<&Relationship, DocumentError> {
        self.relationships
            .get(&id)
            .ok_or(DocumentError::not_found(ItemKind::Relationship, id))
    }

    pub(crate) fn relationship_mut(&mut self, id: Id) -> Result<&mut Relationship, DocumentError> {
        self.relationships
            .get_mut(&id)
            .ok_or(DocumentError::not_found(ItemKind::Relationship, id))
    }

    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if no marriage has this id.
    pub fn marriage(&self, id: Id) -> Result<&Marriage, DocumentError> {
        self.marriages
            .get(&id)
            .ok_or(DocumentError::not_found(ItemKind::Marriage, id))
    }

    pub(crate) fn marriage_mut(&mut self, id: Id) -> Result<&mut Marriage, DocumentError> {
        self.marriages
            .get_mut(&id)
            .ok_or(DocumentError::not_found(ItemKind::Marriage, id))
    }

    /// Current centers of `ids`.
    pub(crate) fn placements(&self, ids: &[Id]) -> Result<Vec<Placement>, DocumentError> {
        ids.iter()
            .map(|&person| {
                Ok(Placement {
                    person,
                    position: self.person(person)?.position(),
                })
            })
            .collect()
    }

    /// `ids` followed by any spouses not already listed, without repeats.
    pub(crate) fn with_spouses(&self, ids: &[Id]) -> Result<Vec<Id>, DocumentError> {
        let mut group = IndexSet::new();
        for &id in ids {
            group.insert(id);
            if let Some(spouse) = self.person(id)?.spouse() {
                group.insert(spouse);
            }
        }
        Ok(group.into_iter().collect())
    }

    /// Persons in document order.
    pub fn persons(&self) -> impl Iterator<Item = &Person> + '_ {
        self.persons.values()
    }

    /// Relationships in document order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.values()
    }

    /// Marriages in document order.
    pub fn marriages(&self) -> impl Iterator<Item = &Marriage> + '_ {
        self.marriages.values()
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn marriage_count(&self) -> usize {
        self.marriages.len()
    }

    fn insert_unchecked(&mut self, entity: Entity) {
        let id = entity.id();
        self.kinds.insert(id, entity.kind());
        match entity {
            Entity::Person(person) => {
                self.persons.insert(id, person);
            }
            Entity::Relationship(relationship) => {
                self.relationships.insert(id, relationship);
            }
            Entity::Marriage(marriage) => {
                self.marriages.insert(id, marriage);
            }
        }
    }
}
