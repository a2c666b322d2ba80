use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ClassStats, WorldConfig};

pub type ConnId = Uuid;

pub const MAX_HEALTH: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::Red => "RED",
            Team::Blue => "BLUE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerClass {
    Classic,
    Sniper,
    Shotgun,
}

impl PlayerClass {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(PlayerClass::Classic),
            "sniper" => Some(PlayerClass::Sniper),
            "shotgun" => Some(PlayerClass::Shotgun),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnId,
    pub username: String,
    pub team: Team,
    pub class: PlayerClass,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub armor: i32,
    pub has_flag: bool,
    pub can_move: bool,
    pub can_shoot: bool,
    pub last_shot_ms: Option<i64>,
    pub speed_boost_active: bool,
    pub kills: u32,
    pub deaths: u32,
}

impl Player {
    pub fn new(
        id: ConnId,
        username: String,
        team: Team,
        class: PlayerClass,
        config: &WorldConfig,
    ) -> Self {
        let spawn = config.spawn_for(team);
        Self {
            id,
            username,
            team,
            class,
            x: spawn.x,
            y: spawn.y,
            health: MAX_HEALTH,
            armor: 0,
            has_flag: false,
            can_move: false,
            can_shoot: false,
            last_shot_ms: None,
            speed_boost_active: false,
            kills: 0,
            deaths: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.can_move && self.can_shoot
    }

    /// Puts the player back at the team respawn point with fresh combat stats.
    pub fn respawn(&mut self, config: &WorldConfig) {
        let (x, y) = config.respawn_point(self.team);
        self.x = x;
        self.y = y;
        self.health = MAX_HEALTH;
        self.armor = 0;
        self.has_flag = false;
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub start_x: f32,
    pub start_y: f32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub owner: ConnId,
    pub damage: f32,
    pub class: PlayerClass,
}

impl Projectile {
    pub fn fired(owner: &Player, angle: f32, stats: &ClassStats) -> Self {
        Self {
            start_x: owner.x,
            start_y: owner.y,
            x: owner.x,
            y: owner.y,
            vx: angle.cos() * stats.projectile_speed,
            vy: angle.sin() * stats.projectile_speed,
            owner: owner.id,
            damage: stats.damage,
            class: owner.class,
        }
    }

    pub fn distance_traveled(&self) -> f32 {
        let dx = self.x - self.start_x;
        let dy = self.y - self.start_y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Flag {
    pub x: f32,
    pub y: f32,
    pub holder: Option<ConnId>,
}

impl Flag {
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, holder: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub red: u32,
    pub blue: u32,
}

impl Score {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    pub fn increment(&mut self, team: Team) -> u32 {
        let slot = match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        };
        *slot += 1;
        *slot
    }

    pub fn clear(&mut self) {
        self.red = 0;
        self.blue = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Item {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}

impl Item {
    pub fn active_at(x: f32, y: f32) -> Self {
        Self { x, y, active: true }
    }
}
