//! Terrain generation: BSP room layout plus multi-layer feature placement.
//!
//! [`generate`] carves a `width x height` grid by recursively splitting it
//! (binary space partitioning) into leaf regions, shrinking each leaf into a
//! room, and connecting sibling rooms with corridors as the recursion
//! unwinds -- the classic BSP-dungeon connectivity guarantee: every room is
//! reachable from every other room through the split tree before any
//! feature is placed.
//!
//! Features (chamfered corners, platforms+ramps, corner pits, lava+bridges)
//! are then layered on top. Because pits and lava can, in principle, wall
//! off part of a room, generation re-validates full-room reachability after
//! placing features and retries with a reduced feature rate if any room
//! became unreachable, up to a bounded attempt count before failing with
//! [`GenError::GenerationInfeasible`].

use std::collections::VecDeque;

use rand::Rng;
use rand_pcg::Pcg64Mcg;
use seedfall_seed::SubSeed;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};

const MAX_FEATURE_RETRIES: u32 = 5;

/// A single tile in the generated terrain grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Floor,
    Wall,
    WallNE,
    WallNW,
    WallSE,
    WallSW,
    Pit,
    Water,
    Platform,
    Ramp,
    Bridge,
    Lava,
    Door,
}

impl TileKind {
    /// Whether a layer-0 (ground) entity can stand on this tile.
    pub fn ground_walkable(self) -> bool {
        matches!(
            self,
            TileKind::Floor | TileKind::Bridge | TileKind::Ramp | TileKind::Door
        )
    }

    /// Whether a layer-2 (platform) entity can stand on this tile. Layer 2
    /// passes over pits and water but still needs the platform/ramp chain
    /// or ordinary floor to stand on.
    pub fn platform_walkable(self) -> bool {
        matches!(
            self,
            TileKind::Floor
                | TileKind::Bridge
                | TileKind::Ramp
                | TileKind::Door
                | TileKind::Platform
                | TileKind::Pit
                | TileKind::Water
        )
    }

    /// Whether an entity on the given collision layer (0 = ground, 1 =
    /// mid-air/projectile, 2 = platform) can occupy this tile.
    pub fn walkable_for_layer(self, layer: u8) -> bool {
        match layer {
            0 => self.ground_walkable(),
            2 => self.platform_walkable(),
            // Layer 1 (airborne) is blocked only by solid walls.
            _ => !matches!(
                self,
                TileKind::Wall
                    | TileKind::WallNE
                    | TileKind::WallNW
                    | TileKind::WallSE
                    | TileKind::WallSW
            ),
        }
    }

    pub fn is_diagonal_wall(self) -> bool {
        matches!(
            self,
            TileKind::WallNE | TileKind::WallNW | TileKind::WallSE | TileKind::WallSW
        )
    }
}

/// Parameters controlling terrain generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainParams {
    pub width: u32,
    pub height: u32,
    pub min_room_size: u32,
    pub max_split_depth: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            min_room_size: 6,
            max_split_depth: 6,
        }
    }
}

/// A `width x height` grid of [`TileKind`]s plus the room rectangles used to
/// build it (useful for entity/item placement downstream).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMap {
    pub width: u32,
    pub height: u32,
    tiles: Vec<TileKind>,
    pub rooms: Vec<Rect>,
}

impl TerrainMap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileKind::Wall; (width * height) as usize],
            rooms: Vec::new(),
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<TileKind> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.tiles[(y as u32 * self.width + x as u32) as usize])
    }

    fn set(&mut self, x: i32, y: i32, kind: TileKind) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.tiles[(y as u32 * self.width + x as u32) as usize] = kind;
    }
}

/// An axis-aligned rectangle in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// Outcome of validating a generated terrain map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub all_rooms_reachable: bool,
    pub rooms_checked: usize,
    pub attempts: u32,
}

/// Generate a terrain map from a sub-seed and parameters.
///
/// Pure: the same `(seed, params)` always produces the same map. Never
/// panics; malformed params are rejected with [`GenError::InvalidParams`]
/// and unresolvable feature placement with
/// [`GenError::GenerationInfeasible`].
pub fn generate(seed: SubSeed, params: &TerrainParams) -> GenResult<(TerrainMap, ValidationResult)> {
    validate_params(params)?;

    let mut rng = seed.rng();
    let base_rooms;
    let base_corridors;
    {
        let mut rooms = Vec::new();
        let mut corridors = Vec::new();
        let full = Rect {
            x: 0,
            y: 0,
            w: params.width as i32,
            h: params.height as i32,
        };
        bsp_split(full, 0, params.max_split_depth, params.min_room_size as i32, &mut rng, &mut rooms, &mut corridors);
        base_rooms = rooms;
        base_corridors = corridors;
    }

    if base_rooms.is_empty() {
        return Err(GenError::GenerationInfeasible {
            attempts: 0,
            reason: "BSP split produced zero rooms; region too small for min_room_size".to_owned(),
        });
    }

    let mut feature_rate = 1.0f64;
    for attempt in 1..=MAX_FEATURE_RETRIES {
        let mut map = TerrainMap::new(params.width, params.height);
        carve_rooms_and_corridors(&mut map, &base_rooms, &base_corridors);
        map.rooms = base_rooms.clone();
        place_features(&mut map, &base_rooms, feature_rate, &mut rng);

        let reachable = validate_reachability(&map, &base_rooms);
        if reachable {
            return Ok((
                map,
                ValidationResult {
                    all_rooms_reachable: true,
                    rooms_checked: base_rooms.len(),
                    attempts: attempt,
                },
            ));
        }
        feature_rate *= 0.5;
    }

    Err(GenError::GenerationInfeasible {
        attempts: MAX_FEATURE_RETRIES,
        reason: "could not place features while keeping all rooms reachable".to_owned(),
    })
}

fn validate_params(params: &TerrainParams) -> GenResult<()> {
    if params.width == 0 || params.height == 0 {
        return Err(GenError::InvalidParams("width and height must be positive".to_owned()));
    }
    if params.min_room_size < 3 {
        return Err(GenError::InvalidParams("min_room_size must be >= 3".to_owned()));
    }
    if params.min_room_size as u32 * 2 > params.width.min(params.height) {
        return Err(GenError::InvalidParams(
            "min_room_size is too large for the requested width/height".to_owned(),
        ));
    }
    if params.max_split_depth == 0 || params.max_split_depth > 16 {
        return Err(GenError::InvalidParams("max_split_depth must be in 1..=16".to_owned()));
    }
    Ok(())
}

/// Recursively split `rect`, carving a room from each leaf and connecting
/// sibling subtrees with a corridor. Returns the representative room used to
/// connect this subtree to its parent.
fn bsp_split(
    rect: Rect,
    depth: u32,
    max_depth: u32,
    min_size: i32,
    rng: &mut Pcg64Mcg,
    rooms: &mut Vec<Rect>,
    corridors: &mut Vec<(Rect, Rect)>,
) -> Option<Rect> {
    let can_split_h = rect.h >= min_size * 2 + 2;
    let can_split_v = rect.w >= min_size * 2 + 2;

    let should_split = depth < max_depth && (can_split_h || can_split_v);

    if !should_split {
        if rect.w < min_size || rect.h < min_size {
            return None;
        }
        // Shrink the leaf into a room with a 1-tile wall margin.
        let room = Rect {
            x: rect.x + 1,
            y: rect.y + 1,
            w: rect.w - 2,
            h: rect.h - 2,
        };
        if room.w < 2 || room.h < 2 {
            return None;
        }
        rooms.push(room);
        return Some(room);
    }

    let split_horizontal = if can_split_h && can_split_v {
        rng.gen_bool(0.5)
    } else {
        can_split_h
    };

    let (first, second) = if split_horizontal {
        let split_at = rng.gen_range(min_size..=(rect.h - min_size));
        (
            Rect { x: rect.x, y: rect.y, w: rect.w, h: split_at },
            Rect { x: rect.x, y: rect.y + split_at, w: rect.w, h: rect.h - split_at },
        )
    } else {
        let split_at = rng.gen_range(min_size..=(rect.w - min_size));
        (
            Rect { x: rect.x, y: rect.y, w: split_at, h: rect.h },
            Rect { x: rect.x + split_at, y: rect.y, w: rect.w - split_at, h: rect.h },
        )
    };

    let left = bsp_split(first, depth + 1, max_depth, min_size, rng, rooms, corridors);
    let right = bsp_split(second, depth + 1, max_depth, min_size, rng, rooms, corridors);

    match (left, right) {
        (Some(l), Some(r)) => {
            corridors.push((l, r));
            Some(l)
        }
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

fn carve_rooms_and_corridors(map: &mut TerrainMap, rooms: &[Rect], corridors: &[(Rect, Rect)]) {
    for room in rooms {
        for y in room.y..room.y + room.h {
            for x in room.x..room.x + room.w {
                map.set(x, y, TileKind::Floor);
            }
        }
    }
    for (a, b) in corridors {
        carve_corridor(map, *a, *b);
    }
}

/// Carve an L-shaped corridor between the centers of two rooms.
fn carve_corridor(map: &mut TerrainMap, a: Rect, b: Rect) {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    for x in ax.min(bx)..=ax.max(bx) {
        if map.get(x, ay) != Some(TileKind::Floor) {
            map.set(x, ay, TileKind::Floor);
        }
    }
    for y in ay.min(by)..=ay.max(by) {
        if map.get(bx, y) != Some(TileKind::Floor) {
            map.set(bx, y, TileKind::Floor);
        }
    }
}

/// Post-process rooms with diagonal corners, platforms, pits, and lava.
/// `rate` scales each feature's base probability (used to back off on retry).
fn place_features(map: &mut TerrainMap, rooms: &[Rect], rate: f64, rng: &mut Pcg64Mcg) {
    for room in rooms {
        if room.w < 3 || room.h < 3 {
            continue;
        }

        if rng.gen_bool(0.30 * rate) {
            chamfer_corners(map, *room);
        }

        if rng.gen_bool(0.125 * rate) {
            place_platform(map, *room, rng);
        }

        if rng.gen_bool(0.10 * rate) {
            place_corner_pit(map, *room, rng);
        }

        if rng.gen_bool(0.10 * rate) && room.w >= 5 {
            place_lava_with_bridge(map, *room, rng);
        }
    }
}

fn chamfer_corners(map: &mut TerrainMap, room: Rect) {
    let (x0, y0) = (room.x - 1, room.y - 1);
    let (x1, y1) = (room.x + room.w, room.y + room.h - 1);
    map.set(x0, y0, TileKind::WallNW);
    map.set(x1, y0, TileKind::WallNE);
    map.set(x0, y1, TileKind::WallSW);
    map.set(x1, y1, TileKind::WallSE);
}

/// Carve a raised platform (layer 2) in the middle of the room, 30-60% of
/// its area, with ramps on at least one edge connecting floor to platform.
fn place_platform(map: &mut TerrainMap, room: Rect, rng: &mut Pcg64Mcg) {
    let area_frac = rng.gen_range(0.30..=0.60);
    let target_area = (room.w as f64 * room.h as f64 * area_frac).sqrt();
    let pw = (target_area as i32).clamp(1, room.w - 2).max(1);
    let ph = (target_area as i32).clamp(1, room.h - 2).max(1);
    let px = room.x + (room.w - pw) / 2;
    let py = room.y + (room.h - ph) / 2;

    for y in py..py + ph {
        for x in px..px + pw {
            map.set(x, y, TileKind::Platform);
        }
    }
    // Ramp on the west edge, connecting room floor to the platform.
    if px > room.x {
        map.set(px - 1, py + ph / 2, TileKind::Ramp);
    }
}

fn place_corner_pit(map: &mut TerrainMap, room: Rect, rng: &mut Pcg64Mcg) {
    let corners = [
        (room.x, room.y),
        (room.x + room.w - 1, room.y),
        (room.x, room.y + room.h - 1),
        (room.x + room.w - 1, room.y + room.h - 1),
    ];
    let (cx, cy) = corners[rng.gen_range(0..corners.len())];
    map.set(cx, cy, TileKind::Pit);
}

fn place_lava_with_bridge(map: &mut TerrainMap, room: Rect, rng: &mut Pcg64Mcg) {
    let y = room.y + rng.gen_range(1..room.h.max(2) - 1).max(0);
    for x in room.x..room.x + room.w {
        map.set(x, y, TileKind::Lava);
    }
    let bridge_x = room.x + room.w / 2;
    map.set(bridge_x, y, TileKind::Bridge);
}

/// Flood-fill from the first room's center over ground-walkable tiles and
/// confirm every other room's center is reachable. Also checks the
/// platform-walkable layer so platform-only rooms (rare, but possible if a
/// room is entirely replaced -- not currently produced by `place_features`
/// but kept for robustness) don't false-negative.
fn validate_reachability(map: &TerrainMap, rooms: &[Rect]) -> bool {
    if rooms.is_empty() {
        return true;
    }
    let (start_x, start_y) = rooms[0].center();
    let mut visited = vec![false; (map.width * map.height) as usize];
    let mut queue = VecDeque::new();
    queue.push_back((start_x, start_y));
    if let Some(idx) = tile_index(map, start_x, start_y) {
        visited[idx] = true;
    }

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x + dx, y + dy);
            let Some(idx) = tile_index(map, nx, ny) else { continue };
            if visited[idx] {
                continue;
            }
            let Some(kind) = map.get(nx, ny) else { continue };
            if kind.ground_walkable() || kind.platform_walkable() {
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    rooms.iter().all(|room| {
        let (cx, cy) = room.center();
        tile_index(map, cx, cy).map(|idx| visited[idx]).unwrap_or(false)
    })
}

fn tile_index(map: &TerrainMap, x: i32, y: i32) -> Option<usize> {
    if x < 0 || y < 0 || x >= map.width as i32 || y >= map.height as i32 {
        return None;
    }
    Some((y as u32 * map.width + x as u32) as usize)
}
