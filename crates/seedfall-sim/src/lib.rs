//! seedfall-sim -- simulation core: component vocabulary, the fixed-timestep
//! tick pipeline, gameplay systems, snapshotting and save/load.
//!
//! This crate builds on [`seedfall_ecs`] to provide the simulation driver for
//! the action-RPG engine: a fixed-timestep tick loop ([`pipeline::TickLoop`])
//! that runs gameplay systems in a fixed, deterministic order, applies the
//! resulting commands via [`CommandBuffer`](seedfall_ecs::command::CommandBuffer),
//! and advances simulation time as `tick_count * fixed_dt` (never accumulated,
//! to avoid float drift across platforms).
//!
//! # Quick Start
//!
//! ```
//! use seedfall_sim::prelude::*;
//!
//! let mut world = World::new();
//! world.register_component::<u32>("score");
//!
//! let config = TickConfig { fixed_dt: 1.0 / 60.0, ..Default::default() };
//! let mut tick_loop = TickLoop::new(world, config);
//!
//! tick_loop.add_system("example", |_world, _cmds| {
//!     // game logic here
//! });
//!
//! tick_loop.run_ticks(100);
//! assert_eq!(tick_loop.tick_count(), 100);
//! ```

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod components;
pub mod events;
pub mod pipeline;
pub mod replay;
pub mod save;
#[allow(unsafe_code)]
pub mod snapshot;
pub mod systems;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use seedfall_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use seedfall_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::bootstrap::{register_components, register_systems};
    pub use crate::components::*;
    pub use crate::events::{EventLog, SimEvent};
    pub use crate::pipeline::{InputFrame, SystemFn, TickConfig, TickLoop};
    pub use crate::save::{SaveEnvelope, SaveError};
}
