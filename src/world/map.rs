//! Map and tile types.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::world::AgentId;

/// A coordinate on the map.
///
/// Ordering is row-major (`y` first, then `x`) so that sorted coordinate sets
/// iterate the way the grid is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Step `distance` tiles in `direction`, or `None` when leaving a map of side `size`.
    #[must_use]
    pub fn step(self, direction: Direction, distance: u16, size: u16) -> Option<Coord> {
        let (dx, dy) = direction.delta();
        let x = i32::from(self.x) + dx * i32::from(distance);
        let y = i32::from(self.y) + dy * i32::from(distance);
        let size = i32::from(size);
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }
        // In range [0, size) and size <= u16::MAX.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let coord = Coord::new(x as u16, y as u16);
        Some(coord)
    }

    /// Squared Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance_sq(self, other: Coord) -> u32 {
        let dx = u32::from(self.x.abs_diff(other.x));
        let dy = u32::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }

    /// Chebyshev (king-move) distance to another coordinate.
    #[must_use]
    pub fn chebyshev(self, other: Coord) -> u16 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Whether `other` is this tile or one of its eight neighbours.
    #[must_use]
    pub fn touches(self, other: Coord) -> bool {
        self.chebyshev(other) <= 1
    }
}

/// One of the four cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards y = 0.
    North,
    /// Towards increasing y.
    South,
    /// Towards increasing x.
    East,
    /// Towards x = 0.
    West,
}

impl Direction {
    /// All four directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit step for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Parse a direction name or its single-letter / compass abbreviation.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "north" | "n" | "up" => Some(Direction::North),
            "south" | "s" | "down" => Some(Direction::South),
            "east" | "e" | "right" => Some(Direction::East),
            "west" | "w" | "left" => Some(Direction::West),
            _ => None,
        }
    }
}

/// Terrain class of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Terrain {
    /// Open ground.
    Plains = 0,
    /// Wooded ground, passable.
    Forest = 1,
    /// Impassable high ground.
    Mountain = 2,
    /// Impassable water.
    Water = 3,
}

impl Terrain {
    /// Check if agents can stand on this terrain.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Terrain::Mountain | Terrain::Water)
    }
}

/// Biome flavour of a tile, used by generation and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Biome {
    /// Deep water.
    Ocean = 0,
    /// Shoreline sand.
    Beach = 1,
    /// Temperate grass.
    Grassland = 2,
    /// Temperate woods.
    Forest = 3,
    /// Hot, wet woods.
    Jungle = 4,
    /// Wet lowland.
    Swamp = 5,
    /// Hot, dry sand.
    Desert = 6,
    /// Hot, dry grass.
    Savanna = 7,
    /// Cold, dry plains.
    Tundra = 8,
    /// Frozen ground.
    Ice = 9,
    /// Crystal fields.
    Crystal = 10,
    /// Rocky peaks.
    Mountain = 11,
    /// Lava and ash.
    Volcanic = 12,
    /// Eroded wasteland.
    Badlands = 13,
}

impl Biome {
    /// Number of biome variants.
    pub const COUNT: usize = 14;

    /// All biomes in discriminant order.
    pub const ALL: [Biome; Biome::COUNT] = [
        Biome::Ocean,
        Biome::Beach,
        Biome::Grassland,
        Biome::Forest,
        Biome::Jungle,
        Biome::Swamp,
        Biome::Desert,
        Biome::Savanna,
        Biome::Tundra,
        Biome::Ice,
        Biome::Crystal,
        Biome::Mountain,
        Biome::Volcanic,
        Biome::Badlands,
    ];

    /// Terrain class implied by a land biome.
    #[must_use]
    pub const fn land_terrain(self) -> Terrain {
        match self {
            Biome::Ocean => Terrain::Water,
            Biome::Mountain | Biome::Volcanic => Terrain::Mountain,
            Biome::Forest | Biome::Jungle | Biome::Swamp => Terrain::Forest,
            _ => Terrain::Plains,
        }
    }

    /// Single glyph for ASCII previews.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Biome::Ocean => '~',
            Biome::Beach => ',',
            Biome::Grassland => '.',
            Biome::Forest => 'f',
            Biome::Jungle => 'J',
            Biome::Swamp => '%',
            Biome::Desert => ':',
            Biome::Savanna => '"',
            Biome::Tundra => '-',
            Biome::Ice => '_',
            Biome::Crystal => '*',
            Biome::Mountain => '^',
            Biome::Volcanic => 'V',
            Biome::Badlands => ';',
        }
    }
}

/// Immutable terrain data stored per grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain class.
    pub terrain: Terrain,
    /// Biome tag.
    pub biome: Biome,
}

impl Cell {
    /// Create a cell.
    #[must_use]
    pub const fn new(terrain: Terrain, biome: Biome) -> Self {
        Self { terrain, biome }
    }
}

/// A single tile as seen by callers: terrain plus current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Tile position.
    pub coord: Coord,
    /// Terrain class.
    pub terrain: Terrain,
    /// Biome tag.
    pub biome: Biome,
    /// Owner of this tile (None = unclaimed).
    pub owner: Option<AgentId>,
}

impl Tile {
    /// Check if agents can stand on this tile.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }
}

/// The square tile grid.
///
/// Terrain lives in a dense row-major array and never changes after
/// generation. Ownership is a sparse coordinate index, so a tile can hold at
/// most one owner.
#[derive(Debug, Clone)]
pub struct Map {
    /// Side length in tiles.
    size: u16,
    /// Cells stored in row-major order.
    cells: Vec<Cell>,
    /// Current owner of each claimed tile.
    owners: BTreeMap<Coord, AgentId>,
}

impl Map {
    /// Create a map filled with the given cell.
    ///
    /// Returns `None` if size is zero.
    #[must_use]
    pub fn filled(size: u16, cell: Cell) -> Option<Self> {
        if size == 0 {
            return None;
        }
        let len = usize::from(size) * usize::from(size);
        Some(Self {
            size,
            cells: vec![cell; len],
            owners: BTreeMap::new(),
        })
    }

    /// Build a map from generated cells.
    ///
    /// Returns `None` unless `cells.len() == size * size` and size is non-zero.
    #[must_use]
    pub fn from_cells(size: u16, cells: Vec<Cell>) -> Option<Self> {
        if size == 0 || cells.len() != usize::from(size) * usize::from(size) {
            return None;
        }
        Some(Self {
            size,
            cells,
            owners: BTreeMap::new(),
        })
    }

    /// Build a map by evaluating `cell_at` for every coordinate, rows in parallel.
    ///
    /// A zero size is treated as 1.
    #[must_use]
    pub fn from_fn(size: u16, cell_at: impl Fn(Coord) -> Cell + Sync) -> Self {
        let size = size.max(1);
        let side = usize::from(size);
        let cells = (0..side * side)
            .into_par_iter()
            .map(|idx| {
                // Index < size * size, so both parts fit in u16.
                #[allow(clippy::cast_possible_truncation)]
                let coord = Coord::new((idx % side) as u16, (idx / side) as u16);
                cell_at(coord)
            })
            .collect();
        Self {
            size,
            cells,
            owners: BTreeMap::new(),
        }
    }

    /// Side length of the map.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.size
    }

    /// Raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Check if a coordinate is within the map bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.size && coord.y < self.size
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.y) * usize::from(self.size) + usize::from(coord.x))
        } else {
            None
        }
    }

    /// Terrain cell at a coordinate.
    #[must_use]
    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// Full tile view at a coordinate.
    #[must_use]
    pub fn tile(&self, coord: Coord) -> Option<Tile> {
        self.cell(coord).map(|cell| Tile {
            coord,
            terrain: cell.terrain,
            biome: cell.biome,
            owner: self.owners.get(&coord).cloned(),
        })
    }

    /// Whether the coordinate is in bounds and passable.
    #[must_use]
    pub fn is_passable(&self, coord: Coord) -> bool {
        self.cell(coord).is_some_and(|cell| cell.terrain.is_passable())
    }

    /// Current owner of a tile.
    #[must_use]
    pub fn owner(&self, coord: Coord) -> Option<&AgentId> {
        self.owners.get(&coord)
    }

    /// Overwrite the owner of a tile. Capture replaces, never merges.
    ///
    /// Returns the previous owner, or `None` if out of bounds or unowned.
    pub fn set_owner(&mut self, coord: Coord, owner: AgentId) -> Option<AgentId> {
        if !self.in_bounds(coord) {
            return None;
        }
        self.owners.insert(coord, owner)
    }

    /// Remove ownership from a tile.
    pub fn clear_owner(&mut self, coord: Coord) -> Option<AgentId> {
        self.owners.remove(&coord)
    }

    /// All owned tiles in row-major order.
    pub fn owned(&self) -> impl Iterator<Item = (Coord, &AgentId)> {
        self.owners.iter().map(|(coord, owner)| (*coord, owner))
    }

    /// Tiles owned by one agent.
    pub fn tiles_owned_by<'a>(&'a self, agent: &'a AgentId) -> impl Iterator<Item = Coord> + 'a {
        self.owners
            .iter()
            .filter(move |(_, owner)| *owner == agent)
            .map(|(coord, _)| *coord)
    }

    /// Count tiles owned by one agent.
    #[must_use]
    pub fn count_owned(&self, agent: &AgentId) -> usize {
        self.owners.values().filter(|owner| *owner == agent).count()
    }

    /// Count passable tiles.
    #[must_use]
    pub fn passable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.terrain.is_passable()).count()
    }

    /// Iterate over all coordinates and cells.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let size = usize::from(self.size);
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            // Index < size * size, so both parts fit in u16.
            #[allow(clippy::cast_possible_truncation)]
            let coord = Coord::new((idx % size) as u16, (idx / size) as u16);
            (coord, *cell)
        })
    }

    /// Coordinates within a filled Euclidean circle, clipped to the map.
    pub fn circle(&self, center: Coord, radius: u32) -> impl Iterator<Item = Coord> + '_ {
        let r = i32::try_from(radius).unwrap_or(i32::MAX / 4).min(i32::from(self.size));
        let r_sq = i64::from(r) * i64::from(r);
        let (cx, cy) = (i32::from(center.x), i32::from(center.y));
        let size = i32::from(self.size);
        let y_range = (cy - r).max(0)..=(cy + r).min(size - 1);
        y_range.flat_map(move |y| {
            let x_range = (cx - r).max(0)..=(cx + r).min(size - 1);
            x_range.filter_map(move |x| {
                let (dx, dy) = (i64::from(x - cx), i64::from(y - cy));
                // Both coordinates were clamped to [0, size).
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let coord = Coord::new(x as u16, y as u16);
                (dx * dx + dy * dy <= r_sq).then_some(coord)
            })
        })
    }
}
