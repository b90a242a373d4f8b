// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::datastore::relations::{
    relation_name, RelationEdge, RelationElement, RelationId, RelationSide, RelationTable,
};
use crate::datastore::snapshot::{EventSnapshot, SnapshotEntry, SnapshotRelation};
use crate::datastore::{EventMetaData, StoreArray, StoreObjPtr, EVENT_METADATA};
use crate::errors::StoreError;
use crate::observability::messages::{store::*, StructuredLog};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Name that can never be declared.
pub const RESERVED_NAME: &str = "ALL";

/// Anything that can live in the store and travel between execution contexts.
pub trait StoreObject: Serialize + DeserializeOwned + Default + Send + 'static {}

impl<T> StoreObject for T where T: Serialize + DeserializeOwned + Default + Send + 'static {}

/// Lifetime scope of a store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Cleared at every event boundary
    Event,
    /// Survives until the context terminates
    Persistent,
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Durability::Event => write!(f, "event"),
            Durability::Persistent => write!(f, "persistent"),
        }
    }
}

/// Stable identifier of a declared entry within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which operations the store currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// Declarations are open
    Initialize,
    /// Between events: beginRun, endRun, terminate
    Run,
    /// Inside an event: event entries may be created
    Event,
}

#[derive(Debug, Clone, Copy)]
struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

type Content = Box<dyn Any + Send>;

/// Type-erased operations captured at declaration time.
#[derive(Clone, Copy)]
struct EntryOps {
    construct: fn() -> Content,
    len: fn(&(dyn Any + Send)) -> usize,
    encode: fn(&(dyn Any + Send)) -> Result<serde_json::Value, String>,
    decode: fn(serde_json::Value) -> Result<Content, String>,
}

impl EntryOps {
    fn object<T: StoreObject>() -> Self {
        Self {
            construct: construct::<T>,
            len: object_len,
            encode: encode::<T>,
            decode: decode::<T>,
        }
    }

    fn array<T: StoreObject>() -> Self {
        Self {
            construct: construct::<Vec<T>>,
            len: array_len::<T>,
            encode: encode::<Vec<T>>,
            decode: decode::<Vec<T>>,
        }
    }
}

fn construct<V: Default + Send + 'static>() -> Content {
    Box::new(V::default())
}

fn object_len(_content: &(dyn Any + Send)) -> usize {
    1
}

fn array_len<T: 'static>(content: &(dyn Any + Send)) -> usize {
    content.downcast_ref::<Vec<T>>().map_or(0, Vec::len)
}

fn encode<V: Serialize + 'static>(content: &(dyn Any + Send)) -> Result<serde_json::Value, String> {
    match content.downcast_ref::<V>() {
        Some(value) => serde_json::to_value(value).map_err(|e| e.to_string()),
        None => Err("stored value does not match its declaration".to_string()),
    }
}

fn decode<V: DeserializeOwned + Send + 'static>(value: serde_json::Value) -> Result<Content, String> {
    serde_json::from_value::<V>(value)
        .map(|v| Box::new(v) as Content)
        .map_err(|e| e.to_string())
}

fn describe(tag: TypeTag, array: bool) -> String {
    if array {
        format!("array of {}", tag.name)
    } else {
        tag.name.to_string()
    }
}

struct Entry {
    name: String,
    durability: Durability,
    tag: TypeTag,
    array: bool,
    transient: bool,
    declared_by: Option<String>,
    ops: EntryOps,
    content: Option<Content>,
}

impl Entry {
    fn len(&self) -> usize {
        self.content.as_deref().map_or(0, |c| (self.ops.len)(c))
    }
}

fn check(entry: &Entry, tag: TypeTag, array: bool) -> Result<(), StoreError> {
    if entry.tag != tag {
        return Err(StoreError::TypeMismatch {
            name: entry.name.clone(),
            expected: describe(entry.tag, entry.array),
            requested: describe(tag, array),
        });
    }
    if entry.array != array {
        let name = entry.name.clone();
        return Err(if entry.array {
            StoreError::NotAnObject { name }
        } else {
            StoreError::NotAnArray { name }
        });
    }
    Ok(())
}

/// Introspection record for one declared entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub name: String,
    pub durability: Durability,
    pub type_name: &'static str,
    pub array: bool,
    pub transient: bool,
    pub declared_by: Option<String>,
}

/// Per-context registry of named, typed, durability-scoped entries.
///
/// Entries are declared during initialize, materialized with [`create`](Self::create)
/// and mutated with [`put`](Self::put) or [`append`](Self::append). Arrays only grow,
/// which keeps every relation endpoint pointing at a live element until the
/// endpoint array is cleared, and clearing always drops the relations first.
pub struct DataStore {
    entries: Vec<Entry>,
    event_index: HashMap<String, EntryId>,
    persistent_index: HashMap<String, EntryId>,
    relations: RelationTable,
    passthrough: Vec<SnapshotEntry>,
    passthrough_relations: Vec<SnapshotRelation>,
    phase: StorePhase,
    current_module: Option<String>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            event_index: HashMap::new(),
            persistent_index: HashMap::new(),
            relations: RelationTable::default(),
            passthrough: Vec::new(),
            passthrough_relations: Vec::new(),
            phase: StorePhase::Initialize,
            current_module: None,
        }
    }

    /// Unqualified type name, the conventional name of a single-object entry.
    pub fn default_name<T: 'static>() -> String {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }

    /// Conventional name of an array entry: the type name in plural.
    pub fn default_array_name<T: 'static>() -> String {
        format!("{}s", Self::default_name::<T>())
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: StorePhase) {
        self.phase = phase;
    }

    /// Declarations made while a module name is set are attributed to that module.
    pub fn set_current_module(&mut self, module: Option<String>) {
        self.current_module = module;
    }

    fn index(&self, durability: Durability) -> &HashMap<String, EntryId> {
        match durability {
            Durability::Event => &self.event_index,
            Durability::Persistent => &self.persistent_index,
        }
    }

    fn index_mut(&mut self, durability: Durability) -> &mut HashMap<String, EntryId> {
        match durability {
            Durability::Event => &mut self.event_index,
            Durability::Persistent => &mut self.persistent_index,
        }
    }

    fn entry(&self, id: EntryId) -> Result<&Entry, StoreError> {
        self.entries.get(id.0).ok_or(StoreError::UnknownEntry(id.0))
    }

    fn entry_mut(&mut self, id: EntryId) -> Result<&mut Entry, StoreError> {
        self.entries.get_mut(id.0).ok_or(StoreError::UnknownEntry(id.0))
    }

    fn checked(&self, id: EntryId, tag: TypeTag, array: bool) -> Result<&Entry, StoreError> {
        let entry = self.entry(id)?;
        check(entry, tag, array)?;
        Ok(entry)
    }

    fn checked_mut(&mut self, id: EntryId, tag: TypeTag, array: bool) -> Result<&mut Entry, StoreError> {
        let entry = self.entry_mut(id)?;
        check(entry, tag, array)?;
        Ok(entry)
    }

    /// Registers a slot. Redeclaring with the same type and shape returns the
    /// existing id; anything else is a conflict.
    pub fn declare<T: StoreObject>(
        &mut self,
        name: &str,
        durability: Durability,
        array: bool,
    ) -> Result<EntryId, StoreError> {
        if name.is_empty() || name == RESERVED_NAME {
            return Err(StoreError::ReservedName {
                name: name.to_string(),
            });
        }
        let tag = TypeTag::of::<T>();
        if let Some(&id) = self.index(durability).get(name) {
            let entry = &self.entries[id.0];
            if entry.tag != tag || entry.array != array {
                let error = StoreError::Conflict {
                    name: name.to_string(),
                    durability,
                    existing: describe(entry.tag, entry.array),
                    requested: describe(tag, array),
                };
                DeclarationRejected {
                    name,
                    module: self.current_module.as_deref(),
                    error: &error,
                }
                .log();
                return Err(error);
            }
            return Ok(id);
        }
        if self.phase != StorePhase::Initialize {
            return Err(StoreError::DeclarationClosed {
                name: name.to_string(),
            });
        }

        let id = EntryId(self.entries.len());
        self.entries.push(Entry {
            name: name.to_string(),
            durability,
            tag,
            array,
            transient: false,
            declared_by: self.current_module.clone(),
            ops: if array {
                EntryOps::array::<T>()
            } else {
                EntryOps::object::<T>()
            },
            content: None,
        });
        self.index_mut(durability).insert(name.to_string(), id);

        EntryDeclared {
            name,
            durability,
            type_name: tag.name,
            array,
            module: self.current_module.as_deref(),
        }
        .log();
        Ok(id)
    }

    pub fn declare_object<T: StoreObject>(
        &mut self,
        name: &str,
        durability: Durability,
    ) -> Result<StoreObjPtr<T>, StoreError> {
        self.declare::<T>(name, durability, false).map(StoreObjPtr::new)
    }

    pub fn declare_array<T: StoreObject>(
        &mut self,
        name: &str,
        durability: Durability,
    ) -> Result<StoreArray<T>, StoreError> {
        self.declare::<T>(name, durability, true).map(StoreArray::new)
    }

    /// Transient entries stay inside the context that created them.
    pub fn set_transient(&mut self, id: EntryId) -> Result<(), StoreError> {
        self.entry_mut(id)?.transient = true;
        Ok(())
    }

    pub fn is_declared(&self, name: &str, durability: Durability) -> bool {
        self.index(durability).contains_key(name)
    }

    /// Id of a declared entry, whether or not it was created.
    pub fn entry_id(&self, name: &str, durability: Durability) -> Result<EntryId, StoreError> {
        self.index(durability)
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::Undeclared {
                name: name.to_string(),
                durability,
            })
    }

    /// `Ok(Some(id))` for a created entry, `Ok(None)` for a declared but absent one,
    /// `Err(Undeclared)` when nobody declared it.
    pub fn find(&self, name: &str, durability: Durability) -> Result<Option<EntryId>, StoreError> {
        let id = self.entry_id(name, durability)?;
        Ok(self.entries[id.0].content.as_ref().map(|_| id))
    }

    pub fn is_created(&self, id: EntryId) -> bool {
        self.entries.get(id.0).is_some_and(|e| e.content.is_some())
    }

    pub fn create(&mut self, id: EntryId) -> Result<(), StoreError> {
        let phase = self.phase;
        let entry = self.entry_mut(id)?;
        if entry.durability == Durability::Event && phase != StorePhase::Event {
            return Err(StoreError::OutsideEvent {
                name: entry.name.clone(),
            });
        }
        if entry.content.is_some() {
            return Err(StoreError::AlreadyExists {
                name: entry.name.clone(),
            });
        }
        entry.content = Some((entry.ops.construct)());
        Ok(())
    }

    pub fn create_by_name(&mut self, name: &str, durability: Durability) -> Result<EntryId, StoreError> {
        let id = self.entry_id(name, durability)?;
        self.create(id)?;
        Ok(id)
    }

    /// Replaces the value of a created single-object entry.
    pub fn put<T: StoreObject>(&mut self, id: EntryId, value: T) -> Result<(), StoreError> {
        let entry = self.checked_mut(id, TypeTag::of::<T>(), false)?;
        match entry.content.as_mut().and_then(|c| c.downcast_mut::<T>()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotCreated {
                name: entry.name.clone(),
            }),
        }
    }

    /// Appends to a created array and returns the index of the new element.
    pub fn append<T: StoreObject>(&mut self, id: EntryId, value: T) -> Result<usize, StoreError> {
        let entry = self.checked_mut(id, TypeTag::of::<T>(), true)?;
        match entry.content.as_mut().and_then(|c| c.downcast_mut::<Vec<T>>()) {
            Some(items) => {
                items.push(value);
                Ok(items.len() - 1)
            }
            None => Err(StoreError::NotCreated {
                name: entry.name.clone(),
            }),
        }
    }

    pub fn get<T: StoreObject>(&self, id: EntryId) -> Result<Option<&T>, StoreError> {
        let entry = self.checked(id, TypeTag::of::<T>(), false)?;
        Ok(entry.content.as_ref().and_then(|c| c.downcast_ref::<T>()))
    }

    pub fn get_mut<T: StoreObject>(&mut self, id: EntryId) -> Result<Option<&mut T>, StoreError> {
        let entry = self.checked_mut(id, TypeTag::of::<T>(), false)?;
        Ok(entry.content.as_mut().and_then(|c| c.downcast_mut::<T>()))
    }

    pub fn array<T: StoreObject>(&self, id: EntryId) -> Result<Option<&[T]>, StoreError> {
        let entry = self.checked(id, TypeTag::of::<T>(), true)?;
        Ok(entry
            .content
            .as_ref()
            .and_then(|c| c.downcast_ref::<Vec<T>>())
            .map(|items| items.as_slice()))
    }

    /// Mutable access to one element; arrays cannot shrink through the store.
    pub fn element_mut<T: StoreObject>(
        &mut self,
        id: EntryId,
        index: usize,
    ) -> Result<Option<&mut T>, StoreError> {
        let entry = self.checked_mut(id, TypeTag::of::<T>(), true)?;
        Ok(entry
            .content
            .as_mut()
            .and_then(|c| c.downcast_mut::<Vec<T>>())
            .and_then(|items| items.get_mut(index)))
    }

    /// Number of elements of an array entry; zero when absent.
    pub fn array_len(&self, id: EntryId) -> Result<usize, StoreError> {
        let entry = self.entry(id)?;
        if !entry.array {
            return Err(StoreError::NotAnArray {
                name: entry.name.clone(),
            });
        }
        Ok(entry.len())
    }

    pub fn event_metadata(&self) -> Option<&EventMetaData> {
        let id = self.persistent_index.get(EVENT_METADATA)?;
        self.get::<EventMetaData>(*id).ok().flatten()
    }

    /// Creates or overwrites the event metadata entry, which must be declared.
    pub fn set_event_metadata(&mut self, meta: EventMetaData) -> Result<(), StoreError> {
        let id = self.entry_id(EVENT_METADATA, Durability::Persistent)?;
        if !self.is_created(id) {
            self.create(id)?;
        }
        self.put(id, meta)
    }

    pub fn declarations(&self) -> Vec<EntryInfo> {
        self.entries
            .iter()
            .map(|e| EntryInfo {
                name: e.name.clone(),
                durability: e.durability,
                type_name: e.tag.name,
                array: e.array,
                transient: e.transient,
                declared_by: e.declared_by.clone(),
            })
            .collect()
    }

    /// Module that first declared the entry, if it was declared by a module.
    pub fn declared_by(&self, name: &str, durability: Durability) -> Option<&str> {
        let id = self.index(durability).get(name)?;
        self.entries[id.0].declared_by.as_deref()
    }

    /// Declares the `<from>To<to>` relation between two array entries.
    pub fn declare_relation(&mut self, from: EntryId, to: EntryId) -> Result<RelationId, StoreError> {
        let name = relation_name(&self.entry(from)?.name, &self.entry(to)?.name);
        self.declare_named_relation(from, to, &name)
    }

    pub fn declare_named_relation(
        &mut self,
        from: EntryId,
        to: EntryId,
        name: &str,
    ) -> Result<RelationId, StoreError> {
        let (from_durability, from_transient) = {
            let entry = self.entry(from)?;
            if !entry.array {
                return Err(StoreError::NotAnArray {
                    name: entry.name.clone(),
                });
            }
            (entry.durability, entry.transient)
        };
        let (to_durability, to_transient) = {
            let entry = self.entry(to)?;
            if !entry.array {
                return Err(StoreError::NotAnArray {
                    name: entry.name.clone(),
                });
            }
            (entry.durability, entry.transient)
        };
        if let Some(id) = self.relations.find(from, to) {
            return Ok(id);
        }
        if self.phase != StorePhase::Initialize {
            return Err(StoreError::DeclarationClosed {
                name: name.to_string(),
            });
        }

        let durability = if from_durability == Durability::Event || to_durability == Durability::Event {
            Durability::Event
        } else {
            Durability::Persistent
        };
        let id = self
            .relations
            .declare(
                name.to_string(),
                from,
                to,
                durability,
                from_transient || to_transient,
            )
            .ok_or_else(|| StoreError::RelationConflict {
                name: name.to_string(),
            })?;

        RelationDeclared {
            name,
            durability,
            module: self.current_module.as_deref(),
        }
        .log();
        Ok(id)
    }

    fn check_element(&self, id: EntryId, index: usize) -> Result<(), StoreError> {
        let entry = self.entry(id)?;
        if !entry.array || index >= entry.len() {
            return Err(StoreError::DanglingEndpoint {
                name: entry.name.clone(),
                index,
            });
        }
        Ok(())
    }

    /// Adds a directed, weighted edge between two live array elements.
    pub fn relate(
        &mut self,
        from: EntryId,
        from_index: usize,
        to: EntryId,
        to_index: usize,
        weight: f64,
    ) -> Result<(), StoreError> {
        let Some(id) = self.relations.find(from, to) else {
            return Err(StoreError::UndeclaredRelation {
                name: relation_name(&self.entry(from)?.name, &self.entry(to)?.name),
            });
        };
        self.check_element(from, from_index)?;
        self.check_element(to, to_index)?;

        let phase = self.phase;
        if let Some(array) = self.relations.get_mut(id) {
            if array.durability == Durability::Event && phase != StorePhase::Event {
                return Err(StoreError::OutsideEvent {
                    name: array.name.clone(),
                });
            }
            array.elements.push(RelationElement {
                from_index,
                to_index,
                weight,
            });
        }
        Ok(())
    }

    pub fn relations_from(&self, from: EntryId, from_index: usize) -> Vec<RelationEdge> {
        self.relations.edges(from, from_index, RelationSide::From)
    }

    pub fn relations_to(&self, to: EntryId, to_index: usize) -> Vec<RelationEdge> {
        self.relations.edges(to, to_index, RelationSide::To)
    }

    pub fn relations_with(&self, entry: EntryId, index: usize, side: RelationSide) -> Vec<RelationEdge> {
        self.relations.edges(entry, index, side)
    }

    /// Every edge of the relation between two arrays, in insertion order.
    pub fn relation_edges(&self, from: EntryId, to: EntryId) -> Vec<RelationEdge> {
        let Some(array) = self.relations.find(from, to).and_then(|id| self.relations.get(id)) else {
            return Vec::new();
        };
        array
            .elements
            .iter()
            .map(|e| RelationEdge {
                from,
                from_index: e.from_index,
                to,
                to_index: e.to_index,
                weight: e.weight,
            })
            .collect()
    }

    pub fn relation_by_name(&self, name: &str) -> Option<(EntryId, EntryId)> {
        let id = self.relations.find_by_name(name)?;
        self.relations.get(id).map(|a| (a.from, a.to))
    }

    /// Merges duplicate edges of a relation; returns the number of edges removed.
    pub fn consolidate(&mut self, from: EntryId, to: EntryId) -> Result<usize, StoreError> {
        let Some(id) = self.relations.find(from, to) else {
            return Err(StoreError::UndeclaredRelation {
                name: relation_name(&self.entry(from)?.name, &self.entry(to)?.name),
            });
        };
        Ok(self.relations.consolidate(id))
    }

    /// Drops every event relation, then every event entry.
    pub fn clear_event(&mut self) {
        self.relations.clear(Durability::Event);
        self.passthrough_relations.clear();
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.durability == Durability::Event)
        {
            entry.content = None;
        }
        self.passthrough.clear();
    }

    /// Drops everything; called once the context terminated.
    pub fn clear_persistent(&mut self) {
        self.clear_event();
        self.relations.clear_all();
        for entry in &mut self.entries {
            entry.content = None;
        }
    }

    /// Serializable copy of the current event: metadata plus every non-transient
    /// event entry and relation, in declaration order.
    pub fn snapshot_event(&self) -> Result<EventSnapshot, StoreError> {
        let mut snapshot = EventSnapshot {
            metadata: self.event_metadata().cloned(),
            ..EventSnapshot::default()
        };

        for entry in &self.entries {
            if entry.durability != Durability::Event || entry.transient {
                continue;
            }
            let Some(content) = entry.content.as_deref() else {
                continue;
            };
            let value = (entry.ops.encode)(content).map_err(|reason| StoreError::Serialization {
                name: entry.name.clone(),
                reason,
            })?;
            snapshot.entries.push(SnapshotEntry {
                name: entry.name.clone(),
                array: entry.array,
                value,
            });
        }
        snapshot.entries.extend(self.passthrough.iter().cloned());

        for relation in self.relations.iter() {
            if relation.durability != Durability::Event
                || relation.transient
                || relation.elements.is_empty()
            {
                continue;
            }
            let from = self.entry(relation.from)?;
            let to = self.entry(relation.to)?;
            if from.transient || to.transient {
                continue;
            }
            snapshot.relations.push(SnapshotRelation {
                name: relation.name.clone(),
                from: from.name.clone(),
                from_durability: from.durability,
                to: to.name.clone(),
                to_durability: to.durability,
                elements: relation
                    .elements
                    .iter()
                    .map(|e| (e.from_index, e.to_index, e.weight))
                    .collect(),
            });
        }
        snapshot
            .relations
            .extend(self.passthrough_relations.iter().cloned());

        Ok(snapshot)
    }

    /// Materializes a snapshot into this store. Entries this context never declared
    /// are kept aside and included again by the next [`snapshot_event`](Self::snapshot_event).
    pub fn restore_event(&mut self, snapshot: EventSnapshot) -> Result<(), StoreError> {
        if let Some(meta) = snapshot.metadata {
            self.set_event_metadata(meta)?;
        }

        for item in snapshot.entries {
            let Some(&id) = self.event_index.get(&item.name) else {
                self.passthrough.push(item);
                continue;
            };
            let entry = &mut self.entries[id.0];
            if entry.array != item.array {
                return Err(StoreError::Conflict {
                    name: item.name,
                    durability: Durability::Event,
                    existing: describe(entry.tag, entry.array),
                    requested: if item.array {
                        "a serialized array".to_string()
                    } else {
                        "a serialized object".to_string()
                    },
                });
            }
            let content = (entry.ops.decode)(item.value).map_err(|reason| StoreError::Serialization {
                name: entry.name.clone(),
                reason,
            })?;
            entry.content = Some(content);
        }

        for relation in snapshot.relations {
            let from = self.index(relation.from_durability).get(&relation.from).copied();
            let to = self.index(relation.to_durability).get(&relation.to).copied();
            let resolved = match (from, to) {
                (Some(from), Some(to)) => self.relations.find(from, to).map(|id| (id, from, to)),
                _ => None,
            };
            let Some((id, from, to)) = resolved else {
                self.passthrough_relations.push(relation);
                continue;
            };
            for &(from_index, to_index, _) in &relation.elements {
                self.check_element(from, from_index)?;
                self.check_element(to, to_index)?;
            }
            if let Some(array) = self.relations.get_mut(id) {
                array.elements = relation
                    .elements
                    .iter()
                    .map(|&(from_index, to_index, weight)| RelationElement {
                        from_index,
                        to_index,
                        weight,
                    })
                    .collect();
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("phase", &self.phase)
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|e| format!("{} ({})", e.name, e.durability))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
