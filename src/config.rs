use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::ConfigError;
use crate::model::{PlayerClass, Team};

const DEFAULT_PORT: u16 = 8200;
const DEFAULT_TICK_RATE: u32 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_rate: u32,
    pub public_dir: PathBuf,
    pub world_config: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_rate: DEFAULT_TICK_RATE,
            public_dir: PathBuf::from("public"),
            world_config: PathBuf::from("data/world.json"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup("PORT") {
            config.port = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: "PORT", value })?;
        }
        if let Some(value) = lookup("TICK_RATE") {
            config.tick_rate = match value.parse::<u32>() {
                Ok(rate) if rate > 0 => rate,
                _ => return Err(ConfigError::InvalidEnv { name: "TICK_RATE", value }),
            };
        }
        if let Some(value) = lookup("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("WORLD_CONFIG") {
            config.world_config = PathBuf::from(value);
        }
        Ok(config)
    }

    pub fn tick_interval_ms(&self) -> u64 {
        (1000 / self.tick_rate.max(1)).max(1) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edge-inclusive point test.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStats {
    pub name: String,
    pub damage: f32,
    pub cooldown_ms: i64,
    pub speed: f32,
    pub projectile_count: u32,
    pub spread: f32,
    pub projectile_speed: f32,
    pub max_distance: f32,
    pub min_damage: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTable {
    pub classic: ClassStats,
    pub sniper: ClassStats,
    pub shotgun: ClassStats,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            classic: ClassStats {
                name: "Classic".to_string(),
                damage: 1.0,
                cooldown_ms: 100,
                speed: 2.5,
                projectile_count: 1,
                spread: 0.0,
                projectile_speed: 20.0,
                max_distance: 600.0,
                min_damage: 1.0,
            },
            sniper: ClassStats {
                name: "Sniper".to_string(),
                damage: 2.0,
                cooldown_ms: 800,
                speed: 2.0,
                projectile_count: 1,
                spread: 0.0,
                projectile_speed: 20.0,
                max_distance: 1000.0,
                min_damage: 2.0,
            },
            shotgun: ClassStats {
                name: "Shotgun".to_string(),
                damage: 3.0,
                cooldown_ms: 1000,
                speed: 1.7,
                projectile_count: 2,
                spread: 0.2,
                projectile_speed: 20.0,
                max_distance: 300.0,
                min_damage: 1.0,
            },
        }
    }
}

impl ClassTable {
    pub fn get(&self, class: PlayerClass) -> &ClassStats {
        match class {
            PlayerClass::Classic => &self.classic,
            PlayerClass::Sniper => &self.sniper,
            PlayerClass::Shotgun => &self.shotgun,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterConfig {
    pub spawn_interval_ms: i64,
    pub duration_ms: i64,
    pub speed_multiplier: f32,
    pub candidates: Vec<Point>,
    pub max_attempts: u32,
    pub wall_clearance: f32,
    pub spawn_buffer: f32,
    pub occupancy_radius: f32,
    pub edge_margin: f32,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 60_000,
            duration_ms: 10_000,
            speed_multiplier: 1.1,
            candidates: vec![
                Point::new(750.0, 100.0),
                Point::new(750.0, 1000.0),
                Point::new(500.0, 800.0),
                Point::new(1000.0, 800.0),
                Point::new(500.0, 150.0),
                Point::new(1000.0, 150.0),
                Point::new(750.0, 700.0),
            ],
            max_attempts: 10,
            wall_clearance: 30.0,
            spawn_buffer: 100.0,
            occupancy_radius: 30.0,
            edge_margin: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub border: Rect,
    pub walls: Vec<Rect>,
    pub red_spawn: Rect,
    pub blue_spawn: Rect,
    pub red_base: Rect,
    pub blue_base: Rect,
    pub respawn_offset: Point,
    pub flag_home: Point,
    pub flag_off_world: Point,
    pub classes: ClassTable,
    pub base_speed: f32,
    pub medikits: Vec<Point>,
    pub armors: Vec<Point>,
    pub medikit_respawn_ms: i64,
    pub armor_respawn_ms: i64,
    pub booster: BoosterConfig,
    pub flag_pickup_range: f32,
    pub medikit_pickup_range: f32,
    pub armor_pickup_range: f32,
    pub booster_pickup_range: f32,
    pub countdown_secs: u32,
    pub flag_reset_delay_ms: i64,
    pub match_reset_delay_ms: i64,
    pub winning_score: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            border: Rect::new(0.0, 0.0, 1600.0, 1200.0),
            walls: vec![
                Rect::new(300.0, 200.0, 10.0, 400.0),
                Rect::new(1190.0, 200.0, 10.0, 400.0),
                Rect::new(700.0, 350.0, 10.0, 100.0),
                Rect::new(790.0, 350.0, 10.0, 100.0),
                Rect::new(700.0, 200.0, 100.0, 10.0),
                Rect::new(700.0, 590.0, 100.0, 10.0),
            ],
            red_spawn: Rect::new(100.0, 400.0, 200.0, 200.0),
            blue_spawn: Rect::new(1400.0, 400.0, 200.0, 200.0),
            red_base: Rect::new(50.0, 345.0, 100.0, 110.0),
            blue_base: Rect::new(1350.0, 345.0, 100.0, 110.0),
            respawn_offset: Point::new(50.0, 50.0),
            flag_home: Point::new(750.0, 400.0),
            flag_off_world: Point::new(-100.0, -100.0),
            classes: ClassTable::default(),
            base_speed: 3.0,
            medikits: vec![Point::new(750.0, 150.0), Point::new(750.0, 1050.0)],
            armors: vec![Point::new(500.0, 700.0), Point::new(1000.0, 700.0)],
            medikit_respawn_ms: 45_000,
            armor_respawn_ms: 45_000,
            booster: BoosterConfig::default(),
            flag_pickup_range: 20.0,
            medikit_pickup_range: 10.0,
            armor_pickup_range: 10.0,
            booster_pickup_range: 30.0,
            countdown_secs: 5,
            flag_reset_delay_ms: 5_000,
            match_reset_delay_ms: 3_000,
            winning_score: 3,
        }
    }
}

impl WorldConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Loads the file when present, otherwise falls back to the built-in arena.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("world config {} not found, using built-in arena", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn stats(&self, class: PlayerClass) -> &ClassStats {
        self.classes.get(class)
    }

    pub fn spawn_for(&self, team: Team) -> Rect {
        match team {
            Team::Red => self.red_spawn,
            Team::Blue => self.blue_spawn,
        }
    }

    pub fn base_for(&self, team: Team) -> Rect {
        match team {
            Team::Red => self.red_base,
            Team::Blue => self.blue_base,
        }
    }

    pub fn respawn_point(&self, team: Team) -> (f32, f32) {
        let spawn = self.spawn_for(team);
        (spawn.x + self.respawn_offset.x, spawn.y + self.respawn_offset.y)
    }
}
