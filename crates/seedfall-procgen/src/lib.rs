//! seedfall-procgen -- deterministic content generators.
//!
//! Every generator here is a pure `(seed, params) -> (content, validation)`
//! function built on [`seedfall_seed::SubSeed`]. None of them hold or touch
//! shared mutable state, and none of them panic: malformed params surface
//! as [`GenError::InvalidParams`], unsatisfiable constraints as
//! [`GenError::GenerationInfeasible`].

pub mod content;
pub mod error;
pub mod genre;
pub mod puzzle;
pub mod terrain;

pub use error::{GenError, GenResult};

pub mod prelude {
    pub use crate::content::{
        generate_entity_template, generate_item, generate_skill, generate_spell, ContentId,
        DamageKind, EntityTemplate, EntityTemplateParams, ItemDef, ItemParams, Rarity, SkillDef,
        SkillEffect, SkillParams, SpellDef, SpellParams,
    };
    pub use crate::error::{GenError, GenResult};
    pub use crate::genre::{blend, GenreDef};
    pub use crate::puzzle::{generate as generate_puzzle, solve, PuzzleDef, PuzzleKind, PuzzleParams, PuzzleState};
    pub use crate::terrain::{generate as generate_terrain, TerrainMap, TerrainParams, TileKind, ValidationResult};
}
