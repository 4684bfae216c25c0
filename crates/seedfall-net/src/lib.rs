//! Wire protocol, lag compensation, client prediction and interest-based
//! replication connecting an authoritative simulation to its clients.

pub mod lagcomp;
pub mod prediction;
pub mod replication;
pub mod wire;

pub mod prelude {
    pub use crate::lagcomp::{EntityPos, LagCompError, SnapshotRing};
    pub use crate::prediction::{reconcile, InputRing, PredictedState};
    pub use crate::replication::{build_delta_snapshot, ClientBaseline, EntityState, InterestTable};
    pub use crate::wire::{decode, encode, EntityDelta, Intent, Snapshot, WireError};
}
