use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::config::WorldConfig;
use crate::model::{ConnId, Flag, Item, Player, Projectile, Score};
use crate::protocol::{Audience, Outbound, PlayerPublic, ProjectilePublic, ServerMessage, Snapshot};
use crate::timers::{Scheduler, TimerKind};

/// Where a connection sits in its lifecycle, derived from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connected,
    Joined,
    Active,
}

/// The authoritative match state. Owned by the game task; every handler and
/// the tick engine take it by `&mut`.
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) players: HashMap<ConnId, Player>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) flag: Flag,
    pub(crate) score: Score,
    pub(crate) chat_log: Vec<String>,
    pub(crate) medikits: Vec<Item>,
    pub(crate) armors: Vec<Item>,
    pub(crate) speed_boosters: Vec<Item>,
    pub(crate) last_booster_spawn_ms: Option<i64>,
    pub(crate) scheduler: Scheduler,
    pub(crate) countdown_remaining: u32,
    pub(crate) match_running: bool,
    pub(crate) rng: StdRng,
    pub(crate) now_ms: i64,
    events: Vec<Outbound>,
}

impl World {
    pub fn new(config: WorldConfig, now_ms: i64) -> Self {
        Self::with_rng(config, StdRng::from_entropy(), now_ms)
    }

    pub fn with_rng(config: WorldConfig, rng: StdRng, now_ms: i64) -> Self {
        let medikits = config
            .medikits
            .iter()
            .map(|point| Item::active_at(point.x, point.y))
            .collect();
        let armors = config
            .armors
            .iter()
            .map(|point| Item::active_at(point.x, point.y))
            .collect();
        let flag = Flag::at(config.flag_home.x, config.flag_home.y);
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKind::MedikitRespawn, now_ms + config.medikit_respawn_ms);
        scheduler.schedule(TimerKind::ArmorRespawn, now_ms + config.armor_respawn_ms);

        Self {
            config,
            players: HashMap::new(),
            projectiles: Vec::new(),
            flag,
            score: Score::default(),
            chat_log: Vec::new(),
            medikits,
            armors,
            speed_boosters: Vec::new(),
            last_booster_spawn_ms: None,
            scheduler,
            countdown_remaining: 0,
            match_running: false,
            rng,
            now_ms,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn players(&self) -> &HashMap<ConnId, Player> {
        &self.players
    }

    pub fn player(&self, id: ConnId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: ConnId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn chat_log(&self) -> &[String] {
        &self.chat_log
    }

    pub fn medikits(&self) -> &[Item] {
        &self.medikits
    }

    pub fn medikits_mut(&mut self) -> &mut [Item] {
        &mut self.medikits
    }

    pub fn armors(&self) -> &[Item] {
        &self.armors
    }

    pub fn armors_mut(&mut self) -> &mut [Item] {
        &mut self.armors
    }

    pub fn speed_boosters(&self) -> &[Item] {
        &self.speed_boosters
    }

    pub fn set_speed_boosters(&mut self, boosters: Vec<Item>) {
        self.speed_boosters = boosters;
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn match_running(&self) -> bool {
        self.match_running
    }

    pub fn countdown_pending(&self) -> bool {
        self.scheduler.is_pending(TimerKind::MatchCountdown)
    }

    pub fn phase(&self, id: ConnId) -> ConnectionPhase {
        match self.players.get(&id) {
            None => ConnectionPhase::Connected,
            Some(player) if player.is_active() => ConnectionPhase::Active,
            Some(_) => ConnectionPhase::Joined,
        }
    }

    pub(crate) fn advance_clock(&mut self, now_ms: i64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn add_player(&mut self, player: Player) -> Option<Player> {
        self.players.insert(player.id, player)
    }

    pub fn remove_player(&mut self, id: ConnId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            self.scheduler.cancel(TimerKind::SpeedBoostExpiry(id));
        }
        removed
    }

    pub fn push_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn remove_projectile_at(&mut self, index: usize) -> Option<Projectile> {
        if index < self.projectiles.len() {
            Some(self.projectiles.remove(index))
        } else {
            None
        }
    }

    /// Clears the holder and leaves the flag at the given spot.
    pub(crate) fn drop_flag_at(&mut self, x: f32, y: f32) {
        if let Some(holder) = self.flag.holder.take() {
            if let Some(player) = self.players.get_mut(&holder) {
                player.has_flag = false;
            }
        }
        self.flag.x = x;
        self.flag.y = y;
    }

    /// Holder and `has_flag` agree: either nobody carries the flag, or exactly
    /// the connected holder does.
    pub fn flag_consistent(&self) -> bool {
        let carriers: Vec<ConnId> = self
            .players
            .values()
            .filter(|player| player.has_flag)
            .map(|player| player.id)
            .collect();
        match self.flag.holder {
            None => carriers.is_empty(),
            Some(holder) => carriers == vec![holder],
        }
    }

    pub fn tick_snapshot(&self) -> Snapshot {
        Snapshot {
            players: self
                .players
                .iter()
                .map(|(id, player)| (*id, PlayerPublic::from(player)))
                .collect(),
            projectiles: self.projectiles.iter().map(ProjectilePublic::from).collect(),
            walls: self.config.walls.clone(),
            flag: self.flag,
            score: self.score,
        }
    }

    pub fn drain_events(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, audience: Audience, message: ServerMessage) {
        self.events.push(Outbound { audience, message });
    }

    pub(crate) fn broadcast(&mut self, message: ServerMessage) {
        self.emit(Audience::All, message);
    }

    pub(crate) fn send_to(&mut self, id: ConnId, message: ServerMessage) {
        self.emit(Audience::Only(id), message);
    }

    pub(crate) fn broadcast_state(&mut self) {
        let snapshot = self.tick_snapshot();
        self.broadcast(ServerMessage::State(snapshot));
    }

    pub(crate) fn push_chat(&mut self, line: String) {
        self.chat_log.push(line);
        let messages = self.chat_log.clone();
        self.broadcast(ServerMessage::ChatUpdate { messages });
    }

    /// Transient line shown in the chat box but not kept in the log.
    pub(crate) fn announce(&mut self, text: String) {
        self.broadcast(ServerMessage::ChatMessage { text });
    }

    /// Initial pushes for a socket that just opened.
    pub fn welcome(&mut self, id: ConnId) {
        self.send_to(id, ServerMessage::Welcome { id });
        self.send_to(
            id,
            ServerMessage::ChatUpdate {
                messages: self.chat_log.clone(),
            },
        );
        self.send_to(
            id,
            ServerMessage::UpdateMedikits {
                items: self.medikits.clone(),
            },
        );
        self.send_to(
            id,
            ServerMessage::UpdateArmors {
                items: self.armors.clone(),
            },
        );
        self.send_to(
            id,
            ServerMessage::UpdateSpeedBoosters {
                items: self.speed_boosters.clone(),
            },
        );
    }
}
