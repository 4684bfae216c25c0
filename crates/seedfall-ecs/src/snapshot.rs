//! World snapshot and restore support.
//!
//! Provides [`WorldSnapshot`] -- a fully serializable representation of the
//! ECS world state that can be captured, serialized, and used to restore the
//! world to an exact previous state (including entity IDs, allocator
//! generations, and all component data). This is the mechanism behind
//! save/load and the replay/reconciliation forking used elsewhere in the
//! engine: both just capture a snapshot, do work, and optionally restore it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::entity::EntityId;
use crate::world::{EntityLocation, RawComponentBuf, World};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Serializable snapshot of the [`EntityAllocator`](crate::entity::EntityAllocator) state.
///
/// Captures generations, alive flags, and free-list so that entity ID
/// allocation is fully reproducible after restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorSnapshot {
    /// Per-index generation counters.
    pub generations: Vec<u32>,
    /// Per-index alive flags.
    pub alive: Vec<bool>,
    /// Free-list indices (in FIFO order).
    pub free_indices: Vec<u32>,
}

/// Serializable snapshot of a single entity's component data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// The entity's ID (index + generation).
    pub entity_id: EntityId,
    /// Map from component name to serialized JSON value.
    /// Uses `BTreeMap` so the same world state always serializes identically,
    /// regardless of archetype iteration order.
    pub components: BTreeMap<String, serde_json::Value>,
}

/// A complete, serializable snapshot of the ECS world state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Allocator state (generations, alive flags, free list).
    pub allocator: AllocatorSnapshot,
    /// Names of all registered component types (for informational purposes).
    pub component_names: Vec<String>,
    /// All alive entities with their serialized component data, sorted by
    /// entity ID for deterministic output.
    pub entities: Vec<EntitySnapshot>,
}

// ---------------------------------------------------------------------------
// World snapshot/restore impl
// ---------------------------------------------------------------------------

impl World {
    /// Capture a complete snapshot of the world state.
    ///
    /// Serializes every alive entity's components to JSON via the registered
    /// serializer functions. The result can be serialized (JSON, bincode,
    /// whatever the caller needs) and later fed to
    /// [`restore_from_snapshot`](Self::restore_from_snapshot).
    pub fn capture_snapshot(&self) -> WorldSnapshot {
        let (generations, alive, free_indices) = self.allocator.snapshot_state();
        let allocator = AllocatorSnapshot {
            generations,
            alive,
            free_indices,
        };

        let component_names: Vec<String> = self
            .registry
            .registered_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let id_to_name: HashMap<ComponentTypeId, &str> = component_names
            .iter()
            .filter_map(|name| {
                self.registry
                    .lookup_by_name(name)
                    .map(|id| (id, name.as_str()))
            })
            .collect();

        let mut entities: Vec<EntitySnapshot> = Vec::new();
        for archetype in &self.archetypes {
            for (row, &entity_id) in archetype.entities().iter().enumerate() {
                let mut comp_map: BTreeMap<String, serde_json::Value> = BTreeMap::new();
                for &type_id in archetype.component_types() {
                    let Some(&name) = id_to_name.get(&type_id) else {
                        tracing::warn!(
                            component_type_id = ?type_id,
                            entity_id = ?entity_id,
                            "component type has no registered name -- skipping in snapshot"
                        );
                        continue;
                    };
                    let Some(serialize_fn) = self.serializer_registry.get(type_id) else {
                        tracing::warn!(
                            component_type_id = ?type_id,
                            component_name = %name,
                            "component type has no serializer registered -- skipping in snapshot"
                        );
                        continue;
                    };
                    // Safety: serialize_fn was registered for this exact
                    // type_id in register_component, and the column for
                    // type_id stores values of that same concrete type.
                    #[allow(unsafe_code)]
                    let value = unsafe {
                        let ptr = archetype
                            .get_component_raw(row, type_id)
                            .expect("type_id is in this archetype's component_types");
                        serialize_fn(ptr)
                    };
                    comp_map.insert(name.to_string(), value);
                }
                entities.push(EntitySnapshot {
                    entity_id,
                    components: comp_map,
                });
            }
        }

        entities.sort_by_key(|e| e.entity_id.to_raw());

        WorldSnapshot {
            allocator,
            component_names,
            entities,
        }
    }

    /// Restore the world state from a previously captured snapshot.
    ///
    /// Clears all existing entities and archetypes, restores the entity
    /// allocator to its snapshotted state, and re-creates all entities with
    /// their exact original IDs and deserialized component data.
    ///
    /// # Prerequisites
    ///
    /// The same component types must already be registered in the world.
    /// Component registration itself is not part of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if the snapshot references a
    /// component type that is not registered, or
    /// [`EcsError::ComponentDeserializationError`] if the snapshot is
    /// internally inconsistent (allocator/entity mismatch) or a component
    /// value fails to deserialize. Validation happens before any world state
    /// is mutated, so a rejected snapshot leaves the world unchanged.
    pub fn restore_from_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), EcsError> {
        // Pre-validate every component name before touching world state.
        for entity_snapshot in &snapshot.entities {
            for comp_name in entity_snapshot.components.keys() {
                if self.registry.lookup_by_name(comp_name).is_none() {
                    return Err(EcsError::UnknownComponent {
                        name: comp_name.clone(),
                        registered: self.registry.registered_names().join(", "),
                    });
                }
            }
        }

        if snapshot.allocator.generations.len() != snapshot.allocator.alive.len() {
            return Err(EcsError::ComponentDeserializationError {
                component: "__allocator".to_owned(),
                details: format!(
                    "allocator snapshot inconsistent: {} generations vs {} alive flags",
                    snapshot.allocator.generations.len(),
                    snapshot.allocator.alive.len()
                ),
            });
        }
        let alloc_len = snapshot.allocator.generations.len();
        for &free_idx in &snapshot.allocator.free_indices {
            if (free_idx as usize) >= alloc_len {
                return Err(EcsError::ComponentDeserializationError {
                    component: "__allocator".to_owned(),
                    details: format!(
                        "allocator free index {free_idx} out of bounds ({alloc_len} slots)"
                    ),
                });
            }
        }
        {
            let mut seen = std::collections::HashSet::new();
            for &free_idx in &snapshot.allocator.free_indices {
                if snapshot.allocator.alive[free_idx as usize] {
                    return Err(EcsError::ComponentDeserializationError {
                        component: "__allocator".to_owned(),
                        details: format!("free list contains index {free_idx} marked alive"),
                    });
                }
                if !seen.insert(free_idx) {
                    return Err(EcsError::ComponentDeserializationError {
                        component: "__allocator".to_owned(),
                        details: format!("free list contains duplicate index {free_idx}"),
                    });
                }
            }
        }
        {
            let entity_indices: std::collections::HashSet<u32> = snapshot
                .entities
                .iter()
                .map(|e| e.entity_id.index())
                .collect();
            for (idx, &is_alive) in snapshot.allocator.alive.iter().enumerate() {
                let has_entity = entity_indices.contains(&(idx as u32));
                if is_alive && !has_entity {
                    return Err(EcsError::ComponentDeserializationError {
                        component: "__allocator".to_owned(),
                        details: format!(
                            "allocator slot {idx} is marked alive but has no entity in snapshot"
                        ),
                    });
                }
                if !is_alive && has_entity {
                    return Err(EcsError::ComponentDeserializationError {
                        component: "__allocator".to_owned(),
                        details: format!(
                            "allocator slot {idx} is marked dead but has entity data in snapshot"
                        ),
                    });
                }
            }
        }

        // Drop all existing archetypes (their Drop impl runs every column's
        // destructor) and rebuild from scratch.
        self.archetypes = Vec::new();
        self.archetype_index.clear();
        self.entity_locations.clear();

        self.allocator = crate::entity::EntityAllocator::restore_from_snapshot(
            snapshot.allocator.generations.clone(),
            snapshot.allocator.alive.clone(),
            snapshot.allocator.free_indices.clone(),
        );

        for entity_snapshot in &snapshot.entities {
            let entity_id = entity_snapshot.entity_id;

            let mut raw_parts: Vec<(ComponentTypeId, RawComponentBuf)> = Vec::new();
            for (comp_name, value) in &entity_snapshot.components {
                let type_id = self.registry.lookup_by_name(comp_name).ok_or_else(|| {
                    EcsError::UnknownComponent {
                        name: comp_name.clone(),
                        registered: self.registry.registered_names().join(", "),
                    }
                })?;

                let raw_buf = self
                    .deserializer_registry
                    .deserialize(type_id, value)
                    .ok_or_else(|| EcsError::ComponentDeserializationError {
                        component: comp_name.clone(),
                        details: "no deserializer registered".to_owned(),
                    })?
                    .map_err(|e| EcsError::ComponentDeserializationError {
                        component: comp_name.clone(),
                        details: e,
                    })?;

                raw_parts.push((type_id, raw_buf));
            }

            raw_parts.sort_by_key(|(id, _)| *id);
            let type_ids: Vec<ComponentTypeId> = raw_parts.iter().map(|(id, _)| *id).collect();
            let archetype_id = self.get_or_create_archetype(&type_ids);

            let components: Vec<(ComponentTypeId, *const u8)> = raw_parts
                .iter()
                .map(|(id, buf)| (*id, buf.as_ptr()))
                .collect();

            // Safety: every pointer in `components` points at a RawComponentBuf
            // holding the concrete type registered for its ComponentTypeId,
            // matching what add_entity's archetype expects.
            #[allow(unsafe_code)]
            let row = unsafe {
                self.archetypes[archetype_id.0 as usize].add_entity(entity_id, &components)
            };

            // add_entity bitwise-copied the bytes into the archetype column.
            // Dropping raw_parts here only frees the temporary heap buffers --
            // the column now owns the data and will drop it via its vtable.
            drop(raw_parts);

            self.entity_locations
                .insert(entity_id, EntityLocation { archetype_id, row });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
