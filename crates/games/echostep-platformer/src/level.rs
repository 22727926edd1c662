use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::CollisionType;

/// Env var naming the directory holding `level_<n>.json` files.
pub const LEVELS_DIR_ENV: &str = "ECHOSTEP_LEVELS_DIR";
pub const DEFAULT_LEVELS_DIR: &str = "config/levels";

/// A point in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: f32,
    pub y: f32,
}

/// A pre-merged run of tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpawn {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub collision_type: CollisionType,
    #[serde(default)]
    pub required_coins: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSpawn {
    pub x: f32,
    pub y: f32,
    pub label: String,
}

/// Spawn lists for one level, in tile units. Positions are scaled by the
/// configured tile size when the level is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub player: TilePoint,
    pub platforms: Vec<PlatformSpawn>,
    #[serde(default)]
    pub coins: Vec<TilePoint>,
    #[serde(default)]
    pub enemies: Vec<TilePoint>,
    #[serde(default)]
    pub anchors: Vec<AnchorSpawn>,
}

impl LevelData {
    /// Pixel y below which the player is considered lost: the lowest
    /// platform bottom plus `margin`.
    pub fn kill_plane(&self, tile_size: f32, margin: f32) -> f32 {
        let lowest = self
            .platforms
            .iter()
            .map(|p| (p.y + p.h) * tile_size)
            .fold(self.player.y * tile_size, f32::max);
        lowest + margin
    }
}

#[derive(Debug)]
pub enum LevelError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse {
        path: String,
        message: String,
    },
    /// The directory held no `level_0.json`.
    Empty(String),
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {path}: {source}"),
            Self::Parse { path, message } => write!(f, "failed to parse {path}: {message}"),
            Self::Empty(dir) => write!(f, "no level files in {dir}"),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Ordered levels of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet {
    levels: Vec<LevelData>,
}

impl LevelSet {
    /// An empty list is replaced by the built-in levels.
    pub fn from_levels(levels: Vec<LevelData>) -> Self {
        if levels.is_empty() {
            return Self::builtin();
        }
        Self { levels }
    }

    pub fn builtin() -> Self {
        Self {
            levels: vec![first_steps(), clone_climb(), one_way_tower()],
        }
    }

    /// Load levels from `ECHOSTEP_LEVELS_DIR` (default `config/levels`),
    /// falling back to the built-in set.
    pub fn load() -> Self {
        let dir = std::env::var(LEVELS_DIR_ENV)
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_LEVELS_DIR.to_string());
        match Self::load_from_dir(&dir) {
            Ok(set) => {
                tracing::info!(dir = %dir, levels = set.len(), "Loaded level files");
                set
            },
            Err(LevelError::Empty(_)) => {
                tracing::debug!(dir = %dir, "No level files found, using built-in levels");
                Self::builtin()
            },
            Err(e) => {
                tracing::warn!("{e}, using built-in levels");
                Self::builtin()
            },
        }
    }

    /// Read `level_0.json`, `level_1.json`, ... until the first missing index.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, LevelError> {
        let dir = dir.as_ref();
        let mut levels = Vec::new();
        loop {
            let path = dir.join(format!("level_{}.json", levels.len()));
            let display = path.display().to_string();
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => break,
                Err(source) => {
                    return Err(LevelError::Io {
                        path: display,
                        source,
                    });
                },
            };
            let level = serde_json::from_str::<LevelData>(&content).map_err(|e| {
                LevelError::Parse {
                    path: display,
                    message: e.to_string(),
                }
            })?;
            levels.push(level);
        }
        if levels.is_empty() {
            return Err(LevelError::Empty(dir.display().to_string()));
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.levels.len()
    }

    /// Level at `index`, or the first level if the index is out of range.
    pub fn get(&self, index: usize) -> &LevelData {
        match self.levels.get(index) {
            Some(level) => level,
            None => {
                tracing::warn!(
                    index,
                    available = self.levels.len(),
                    "Level index out of range, loading the first level"
                );
                &self.levels[0]
            },
        }
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn point(x: f32, y: f32) -> TilePoint {
    TilePoint { x, y }
}

fn solid(x: f32, y: f32, w: f32, h: f32) -> PlatformSpawn {
    PlatformSpawn {
        x,
        y,
        w,
        h,
        collision_type: CollisionType::Solid,
        required_coins: None,
    }
}

fn typed(x: f32, y: f32, w: f32, collision_type: CollisionType) -> PlatformSpawn {
    PlatformSpawn {
        collision_type,
        ..solid(x, y, w, 1.0)
    }
}

/// Player spawns stand 40px tall on a ground row: 1.25 tiles above its top.
const STANDING: f32 = 1.25;

fn first_steps() -> LevelData {
    LevelData {
        name: "First Steps".to_string(),
        player: point(2.0, 15.0 - STANDING),
        platforms: vec![
            solid(0.0, 15.0, 40.0, 2.0),
            solid(10.0, 12.0, 4.0, 1.0),
            solid(17.0, 10.0, 3.0, 1.0),
            solid(39.0, 5.0, 1.0, 10.0),
        ],
        coins: vec![point(11.5, 11.0), point(18.0, 9.0), point(33.0, 14.0)],
        enemies: vec![point(25.0, 14.0)],
        anchors: vec![AnchorSpawn {
            x: 36.0,
            y: 14.0,
            label: "exit".to_string(),
        }],
    }
}

fn clone_climb() -> LevelData {
    LevelData {
        name: "Clone Climb".to_string(),
        player: point(2.0, 15.0 - STANDING),
        platforms: vec![
            solid(0.0, 15.0, 14.0, 2.0),
            solid(12.0, 8.0, 2.0, 7.0),
            solid(14.0, 8.0, 14.0, 1.0),
            PlatformSpawn {
                required_coins: Some(1),
                ..typed(6.0, 11.0, 3.0, CollisionType::Numbered)
            },
        ],
        coins: vec![point(7.0, 10.0), point(20.0, 7.0), point(26.0, 7.0)],
        enemies: vec![point(20.0, 7.0)],
        anchors: Vec::new(),
    }
}

fn one_way_tower() -> LevelData {
    LevelData {
        name: "One-Way Tower".to_string(),
        player: point(2.0, 15.0 - STANDING),
        platforms: vec![
            solid(0.0, 15.0, 24.0, 2.0),
            typed(4.0, 12.0, 4.0, CollisionType::OneWayUp),
            typed(9.0, 9.0, 4.0, CollisionType::OneWayUp),
            typed(14.0, 6.0, 4.0, CollisionType::OneWayUp),
            solid(23.0, 3.0, 1.0, 12.0),
        ],
        coins: vec![point(5.0, 11.0), point(15.0, 5.0)],
        enemies: vec![point(18.0, 14.0)],
        anchors: vec![AnchorSpawn {
            x: 12.0,
            y: 2.0,
            label: "camera".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_have_ground_and_coins() {
        let set = LevelSet::builtin();
        assert_eq!(set.len(), 3);
        for i in 0..set.len() {
            let level = set.get(i);
            assert!(!level.platforms.is_empty(), "{} has no platforms", level.name);
            assert!(!level.coins.is_empty(), "{} has no coins", level.name);
        }
    }

    #[test]
    fn out_of_range_index_falls_back_to_first() {
        let set = LevelSet::builtin();
        assert_eq!(set.get(99), set.get(0));
        assert!(!set.contains(99));
    }

    #[test]
    fn empty_list_uses_builtin() {
        assert_eq!(LevelSet::from_levels(Vec::new()), LevelSet::builtin());
    }

    #[test]
    fn kill_plane_sits_below_lowest_platform() {
        let level = first_steps();
        assert_eq!(level.kill_plane(32.0, 400.0), 17.0 * 32.0 + 400.0);
    }

    #[test]
    fn spawn_list_parses_with_defaults() {
        let json = r#"{
            "name": "tiny",
            "player": { "x": 1, "y": 2 },
            "platforms": [
                { "x": 0, "y": 5, "w": 10, "h": 1 },
                { "x": 3, "y": 3, "w": 2, "h": 1, "collision_type": "one-way-up" }
            ]
        }"#;
        let level: LevelData = serde_json::from_str(json).unwrap();
        assert_eq!(level.platforms[0].collision_type, CollisionType::Solid);
        assert_eq!(level.platforms[1].collision_type, CollisionType::OneWayUp);
        assert!(level.coins.is_empty());
        assert!(level.anchors.is_empty());
    }

    #[test]
    fn load_from_missing_dir_is_empty() {
        assert!(matches!(
            LevelSet::load_from_dir("/nonexistent/echostep/levels"),
            Err(LevelError::Empty(_))
        ));
    }

    #[test]
    fn load_from_dir_reads_sequential_files() {
        let dir = std::env::temp_dir().join(format!("echostep-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (i, level) in [first_steps(), one_way_tower()].iter().enumerate() {
            let json = serde_json::to_string(level).unwrap();
            std::fs::write(dir.join(format!("level_{i}.json")), json).unwrap();
        }
        // A gap ends the sequence.
        let json = serde_json::to_string(&clone_climb()).unwrap();
        std::fs::write(dir.join("level_3.json"), json).unwrap();

        let set = LevelSet::load_from_dir(&dir).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).name, "One-Way Tower");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = std::env::temp_dir().join(format!("echostep-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("level_0.json"), "{ not json").unwrap();
        let err = LevelSet::load_from_dir(&dir).unwrap_err();
        assert!(matches!(err, LevelError::Parse { .. }));
        assert!(err.to_string().contains("level_0.json"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
