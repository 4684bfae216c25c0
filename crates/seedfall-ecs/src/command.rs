//! Command buffer for deferred ECS mutations.
//!
//! The [`CommandBuffer`] collects deferred mutations to the ECS world during a
//! tick. Commands are applied in deterministic FIFO order after all systems
//! have run, which is what keeps two runs seeded identically in lockstep:
//! system execution order is fixed, and within a system the commands it
//! issues are applied in the order issued, never reordered by entity or
//! component.
//!
//! Component values in commands are stored as [`serde_json::Value`] so a
//! command can be constructed without the issuing system needing a concrete
//! type parameter at the call site. [`CommandBuffer::apply`] uses the
//! [`World`]'s deserializer registry to convert JSON values back to typed
//! components.
//!
//! # Example
//!
//! ```
//! use seedfall_ecs::prelude::*;
//! use seedfall_ecs::command::{CommandBuffer, CommandReason};
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Health(u32);
//!
//! let mut world = World::new();
//! world.register_component::<Health>("health");
//! let entity = world.spawn_with(Health(100));
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.set_component(
//!     entity,
//!     "health",
//!     serde_json::json!(50),
//!     SystemId(0),
//!     CommandReason::GameRule("damage_applied".to_owned()),
//! );
//!
//! let applied = cmds.apply(&mut world);
//! assert_eq!(applied.len(), 1);
//! assert_eq!(world.get_component::<Health>(entity), Some(&Health(50)));
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::EntityId;
use crate::world::World;

// ---------------------------------------------------------------------------
// SystemId
// ---------------------------------------------------------------------------

/// Identifies which system issued a command, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemId(pub u32);

impl SystemId {
    /// Not tied to a declared pipeline system (tests, initial world setup).
    pub const ENGINE_INTERNAL: SystemId = SystemId(0);
}

// ---------------------------------------------------------------------------
// CommandReason
// ---------------------------------------------------------------------------

/// Why a command was issued. Carried for structured logging: when a command
/// fails to apply (stale entity, unknown component), the log line says what
/// was trying to happen, not just which system tried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandReason {
    /// Caused by player or AI input.
    PlayerInput(String),
    /// Caused by a collision between two entities.
    CollisionResponse(EntityId, EntityId),
    /// Caused by a game rule (e.g. "enemy_destroyed_on_zero_health").
    GameRule(String),
    /// Caused by a state transition.
    StateTransition {
        /// The state being transitioned from.
        from: String,
        /// The state being transitioned to.
        to: String,
    },
    /// Caused by a timer firing (status effect expiry, cooldown, etc.)
    Timer(String),
    /// Internal system logic -- last resort, prefer a more specific reason.
    SystemInternal(String),
}

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// The data payload for a command -- what mutation to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandKind {
    /// Set a component value on an entity (insert or overwrite).
    SetComponent {
        /// Registered name of the component type.
        component_name: String,
        /// Serialized component value.
        value: serde_json::Value,
    },
    /// Remove a component from an entity.
    RemoveComponent {
        /// Registered name of the component type.
        component_name: String,
    },
    /// Despawn an entity entirely.
    Despawn,
    /// Spawn a new entity with the given components attached.
    Spawn {
        /// Serialized component values (name -> JSON) to attach on spawn.
        components: Vec<(String, serde_json::Value)>,
    },
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A single deferred mutation.
///
/// For `Spawn` commands the `target` field is `None` because the entity does
/// not exist yet; after application, `spawned_entity` is set to the newly
/// created entity ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Which entity this command targets. `None` for spawn commands.
    pub target: Option<EntityId>,
    /// What mutation to perform.
    pub kind: CommandKind,
    /// Which system issued this command.
    pub issued_by: SystemId,
    /// Why this command was issued.
    pub reason: CommandReason,
    /// Sequential index within the buffer (set on insertion).
    pub command_index: u32,
    /// For spawn commands: the entity ID created after application.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spawned_entity: Option<EntityId>,
    /// Whether the command mutated the world. `false` before `apply()` is
    /// called, and `false` after if it was skipped (e.g. stale entity).
    #[serde(default)]
    pub applied_successfully: bool,
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Summary of the last [`CommandBuffer::apply`] call.
///
/// `conflict_count` tracks how many (entity, component) pairs were targeted
/// by multiple commands in a single tick (last-write-wins -- conflicts are
/// warnings, not errors). `success_count`/`failed_count` track how many
/// commands applied successfully vs. failed (e.g. stale entity reference).
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Number of (entity, component) pairs targeted by multiple commands.
    pub conflict_count: usize,
    /// Number of commands that failed to apply.
    pub failed_count: usize,
    /// Number of commands that applied successfully.
    pub success_count: usize,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// Collects commands during a tick and applies them deterministically.
///
/// Commands are applied in strict insertion order (FIFO). Given the same
/// systems running in the same declared order, the same commands will be
/// emitted and applied in the same sequence every run of the same seed.
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
    last_apply_report: ApplyReport,
}

impl CommandBuffer {
    /// Create a new, empty command buffer.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            next_index: 0,
            last_apply_report: ApplyReport::default(),
        }
    }

    /// Queue a `SetComponent` command.
    ///
    /// The `value` is a JSON representation of the component. It is
    /// deserialized into the correct type when [`apply`](Self::apply) runs.
    pub fn set_component(
        &mut self,
        target: EntityId,
        component_name: &str,
        value: serde_json::Value,
        issued_by: SystemId,
        reason: CommandReason,
    ) {
        self.push(
            Some(target),
            CommandKind::SetComponent {
                component_name: component_name.to_owned(),
                value,
            },
            issued_by,
            reason,
        );
    }

    /// Queue a `RemoveComponent` command.
    pub fn remove_component(
        &mut self,
        target: EntityId,
        component_name: &str,
        issued_by: SystemId,
        reason: CommandReason,
    ) {
        self.push(
            Some(target),
            CommandKind::RemoveComponent {
                component_name: component_name.to_owned(),
            },
            issued_by,
            reason,
        );
    }

    /// Queue a `Despawn` command.
    pub fn despawn(&mut self, target: EntityId, issued_by: SystemId, reason: CommandReason) {
        self.push(Some(target), CommandKind::Despawn, issued_by, reason);
    }

    /// Queue a `Spawn` command.
    ///
    /// Components are provided as `(name, JSON value)` pairs and will be
    /// deserialized using the world's registered deserializers. The spawned
    /// entity's ID is available on the returned `Command` after
    /// [`apply`](Self::apply) via the `spawned_entity` field.
    pub fn spawn(
        &mut self,
        components: Vec<(String, serde_json::Value)>,
        issued_by: SystemId,
        reason: CommandReason,
    ) {
        self.push(None, CommandKind::Spawn { components }, issued_by, reason);
    }

    /// Get all queued commands in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Report from the last [`apply`](Self::apply) call.
    ///
    /// Returns a default (all-zero) report if `apply()` has never been called.
    pub fn last_apply_report(&self) -> &ApplyReport {
        &self.last_apply_report
    }

    /// Apply all commands to the world in deterministic insertion order.
    ///
    /// Returns the list of all commands (successful and failed) so the event
    /// log can record what happened this tick. The buffer is cleared after
    /// application. Check each command's
    /// [`applied_successfully`](Command::applied_successfully) field to
    /// distinguish real mutations from skipped attempts.
    pub fn apply(&mut self, world: &mut World) -> Vec<Command> {
        let mut commands = std::mem::take(&mut self.commands);
        self.next_index = 0;

        // --- Conflict detection ---
        use std::collections::HashMap;
        let mut seen: HashMap<(EntityId, String), Vec<u32>> = HashMap::new();
        for cmd in &commands {
            if let Some(target) = cmd.target {
                let component_name = match &cmd.kind {
                    CommandKind::SetComponent { component_name, .. } => {
                        Some(component_name.clone())
                    }
                    CommandKind::RemoveComponent { component_name } => Some(component_name.clone()),
                    _ => None,
                };
                if let Some(name) = component_name {
                    seen.entry((target, name))
                        .or_default()
                        .push(cmd.command_index);
                }
            }
        }
        let mut conflict_count = 0;
        for ((entity, component), indices) in &seen {
            if indices.len() > 1 {
                conflict_count += 1;
                tracing::warn!(
                    entity = ?entity,
                    component = %component,
                    command_indices = ?indices,
                    "conflict: {} commands target the same entity+component this tick (last-write-wins)",
                    indices.len()
                );
            }
        }

        // --- Apply loop ---
        let mut success_count: usize = 0;
        let mut failed_count: usize = 0;

        for cmd in &mut commands {
            let kind = cmd.kind.clone();
            let result = match &kind {
                CommandKind::SetComponent {
                    component_name,
                    value,
                } => {
                    let target = cmd
                        .target
                        .expect("SetComponent command must have a target entity");
                    world.set_component_by_name(target, component_name, value)
                }
                CommandKind::RemoveComponent { component_name } => {
                    let target = cmd
                        .target
                        .expect("RemoveComponent command must have a target entity");
                    world.remove_component_by_name(target, component_name)
                }
                CommandKind::Despawn => {
                    let target = cmd
                        .target
                        .expect("Despawn command must have a target entity");
                    world.despawn(target)
                }
                CommandKind::Spawn { components } => Self::apply_spawn(world, cmd, components),
            };

            match result {
                Ok(()) => {
                    cmd.applied_successfully = true;
                    success_count += 1;
                }
                Err(e) => {
                    failed_count += 1;
                    warn!(
                        command_index = cmd.command_index,
                        target = ?cmd.target,
                        system_id = cmd.issued_by.0,
                        error = %e,
                        "command application failed"
                    );
                }
            }
        }

        self.last_apply_report = ApplyReport {
            conflict_count,
            success_count,
            failed_count,
        };

        commands
    }

    /// Apply a `Spawn` command. Sets `cmd.spawned_entity` on success.
    fn apply_spawn(
        world: &mut World,
        cmd: &mut Command,
        components: &[(String, serde_json::Value)],
    ) -> Result<(), crate::EcsError> {
        use crate::world::ComponentBundle;

        let entity = world.spawn_bundle(ComponentBundle::new());

        // Record the spawned entity immediately so downstream bookkeeping
        // (replay logs, event channel) is consistent even if a component
        // set below fails.
        cmd.spawned_entity = Some(entity);
        cmd.applied_successfully = true;

        for (name, value) in components {
            if let Err(e) = world.set_component_by_name(entity, name, value) {
                warn!(
                    command_index = cmd.command_index,
                    entity = ?entity,
                    component = %name,
                    error = %e,
                    "spawn component set failed (entity was still created)"
                );
            }
        }

        Ok(())
    }

    /// Push a pre-built command into the buffer, reassigning its index to
    /// maintain ordering within this buffer.
    pub fn push_raw(&mut self, mut cmd: Command) {
        cmd.command_index = self.next_index;
        self.next_index += 1;
        self.commands.push(cmd);
    }

    /// Clear the buffer without applying any commands.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.next_index = 0;
    }

    // -- internal helpers ---------------------------------------------------

    fn push(
        &mut self,
        target: Option<EntityId>,
        kind: CommandKind,
        issued_by: SystemId,
        reason: CommandReason,
    ) {
        let index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            kind,
            issued_by,
            reason,
            command_index: index,
            spawned_entity: None,
            applied_successfully: false,
        });
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
