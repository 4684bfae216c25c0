//! Gameplay systems. Each is a plain [`crate::pipeline::SystemFn`]: it reads
//! the world, queues commands describing what should change, and never
//! mutates anything directly. The pipeline applies commands in FIFO order
//! after every system in a tick has run.

pub mod ai;
pub mod animation;
pub mod collision;
pub mod combat;
pub mod movement;
pub mod puzzle;
pub mod status;
