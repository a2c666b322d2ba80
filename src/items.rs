use rand::Rng;
use tracing::{debug, info};

use crate::config::{Point, Rect};
use crate::geometry::within_reach;
use crate::model::{ConnId, Item, MAX_HEALTH};
use crate::protocol::ServerMessage;
use crate::timers::TimerKind;
use crate::world::World;

impl World {
    pub(crate) fn check_medikit_pickup(&mut self, id: ConnId) {
        let range = self.config.medikit_pickup_range;
        let player = match self.players.get_mut(&id) {
            Some(player) => player,
            None => return,
        };
        let medikit = match self
            .medikits
            .iter_mut()
            .find(|item| item.active && within_reach(player.x, player.y, item.x, item.y, range))
        {
            Some(medikit) => medikit,
            None => return,
        };
        medikit.active = false;
        let healed = player.health < MAX_HEALTH;
        if healed {
            player.health = MAX_HEALTH;
        }
        let username = player.username.clone();

        if healed {
            self.announce(format!("{} picked up a medikit!", username));
        }
        self.broadcast(ServerMessage::UpdateMedikits {
            items: self.medikits.clone(),
        });
    }

    pub(crate) fn check_armor_pickup(&mut self, id: ConnId) {
        let range = self.config.armor_pickup_range;
        let player = match self.players.get_mut(&id) {
            Some(player) => player,
            None => return,
        };
        let armor = match self
            .armors
            .iter_mut()
            .find(|item| item.active && within_reach(player.x, player.y, item.x, item.y, range))
        {
            Some(armor) => armor,
            None => return,
        };
        armor.active = false;
        let equipped = player.armor == 0;
        if equipped {
            player.armor = 1;
        }
        let username = player.username.clone();

        if equipped {
            self.announce(format!("{} picked up armor!", username));
        }
        self.broadcast(ServerMessage::UpdateArmors {
            items: self.armors.clone(),
        });
    }

    /// A second booster while one is running only pushes the expiry back.
    pub(crate) fn check_booster_pickup(&mut self, id: ConnId) {
        let range = self.config.booster_pickup_range;
        let player = match self.players.get_mut(&id) {
            Some(player) => player,
            None => return,
        };
        let booster = match self
            .speed_boosters
            .iter_mut()
            .find(|item| item.active && within_reach(player.x, player.y, item.x, item.y, range))
        {
            Some(booster) => booster,
            None => return,
        };
        booster.active = false;
        player.speed_boost_active = true;
        debug!("{} picked up a speed booster", player.username);

        let duration_ms = self.config.booster.duration_ms;
        self.scheduler
            .schedule(TimerKind::SpeedBoostExpiry(id), self.now_ms + duration_ms);
        self.send_to(id, ServerMessage::SpeedBoostActive { duration_ms });
        self.broadcast(ServerMessage::UpdateSpeedBoosters {
            items: self.speed_boosters.clone(),
        });
    }

    pub(crate) fn expire_speed_boost(&mut self, id: ConnId) {
        let player = match self.players.get_mut(&id) {
            Some(player) => player,
            None => return,
        };
        player.speed_boost_active = false;
        self.send_to(id, ServerMessage::SpeedBoostEnded);
    }

    pub(crate) fn respawn_medikits(&mut self, due_ms: i64) {
        for medikit in &mut self.medikits {
            medikit.active = true;
        }
        self.broadcast(ServerMessage::UpdateMedikits {
            items: self.medikits.clone(),
        });
        let next = next_sweep(due_ms, self.now_ms, self.config.medikit_respawn_ms);
        self.scheduler.schedule(TimerKind::MedikitRespawn, next);
    }

    pub(crate) fn respawn_armors(&mut self, due_ms: i64) {
        for armor in &mut self.armors {
            armor.active = true;
        }
        self.broadcast(ServerMessage::UpdateArmors {
            items: self.armors.clone(),
        });
        let next = next_sweep(due_ms, self.now_ms, self.config.armor_respawn_ms);
        self.scheduler.schedule(TimerKind::ArmorRespawn, next);
    }

    /// Spawns a booster when none has been placed yet or the interval passed.
    pub(crate) fn maybe_spawn_booster(&mut self) {
        let due = match self.last_booster_spawn_ms {
            None => true,
            Some(last) => self.now_ms - last >= self.config.booster.spawn_interval_ms,
        };
        if due {
            self.spawn_booster();
        }
    }

    /// Replaces whatever booster is on the map with a fresh one.
    pub fn spawn_booster(&mut self) {
        let position = self.find_booster_position();
        info!("speed booster spawned at ({:.0}, {:.0})", position.x, position.y);
        self.speed_boosters = vec![Item::active_at(position.x, position.y)];
        self.last_booster_spawn_ms = Some(self.now_ms);
        self.broadcast(ServerMessage::UpdateSpeedBoosters {
            items: self.speed_boosters.clone(),
        });
    }

    fn find_booster_position(&mut self) -> Point {
        let booster = &self.config.booster;
        if !booster.candidates.is_empty() {
            for _ in 0..booster.max_attempts {
                let index = self.rng.gen_range(0..booster.candidates.len());
                let candidate = booster.candidates[index];
                if self.booster_spot_is_free(candidate) {
                    return candidate;
                }
            }
        }

        let margin = booster.edge_margin;
        let border = self.config.border;
        let x = random_between(&mut self.rng, border.x + margin, border.x + border.width - margin);
        let y = random_between(&mut self.rng, border.y + margin, border.y + border.height - margin);
        Point::new(x, y)
    }

    fn booster_spot_is_free(&self, spot: Point) -> bool {
        let booster = &self.config.booster;
        let clearance = booster.wall_clearance;
        let near_wall = self
            .config
            .walls
            .iter()
            .any(|wall| grown(wall, clearance).contains(spot.x, spot.y));
        if near_wall {
            return false;
        }

        let near_spawn = [self.config.red_spawn, self.config.blue_spawn]
            .iter()
            .any(|spawn| distance(spot.x, spot.y, spawn.x, spawn.y) < booster.spawn_buffer);
        if near_spawn {
            return false;
        }

        let radius = booster.occupancy_radius;
        !self
            .medikits
            .iter()
            .chain(self.armors.iter())
            .chain(self.speed_boosters.iter())
            .any(|item| item.active && distance(spot.x, spot.y, item.x, item.y) < radius)
    }
}

/// Keeps the sweep on its fixed cadence, but skips missed rounds instead
/// of replaying them.
fn next_sweep(due_ms: i64, now_ms: i64, period_ms: i64) -> i64 {
    let next = due_ms + period_ms.max(1);
    if next > now_ms {
        next
    } else {
        now_ms + period_ms.max(1)
    }
}

fn grown(rect: &Rect, by: f32) -> Rect {
    Rect::new(
        rect.x - by,
        rect.y - by,
        rect.width + 2.0 * by,
        rect.height + 2.0 * by,
    )
}

fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

fn random_between(rng: &mut impl Rng, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoosterConfig, WorldConfig};
    use crate::model::{Player, PlayerClass, Team};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn world_with(config: WorldConfig) -> World {
        World::with_rng(config, StdRng::seed_from_u64(5), 0)
    }

    fn standing_at(world: &mut World, x: f32, y: f32) -> ConnId {
        let mut player = Player::new(
            Uuid::new_v4(),
            "mia".to_string(),
            Team::Red,
            PlayerClass::Classic,
            world.config(),
        );
        player.x = x;
        player.y = y;
        let id = player.id;
        world.add_player(player);
        id
    }

    #[test]
    fn medikit_heals_wounded_player_and_deactivates() {
        let mut world = world_with(WorldConfig::default());
        let id = standing_at(&mut world, 755.0, 145.0);
        world.player_mut(id).unwrap().health = 1;
        world.check_medikit_pickup(id);
        assert_eq!(world.player(id).unwrap().health, 2);
        assert!(!world.medikits()[0].active);
        assert!(world.medikits()[1].active);
    }

    #[test]
    fn medikit_is_used_up_even_at_full_health() {
        let mut world = world_with(WorldConfig::default());
        let id = standing_at(&mut world, 750.0, 150.0);
        world.check_medikit_pickup(id);
        assert_eq!(world.player(id).unwrap().health, 2);
        assert!(!world.medikits()[0].active);
        let events = world.drain_events();
        assert!(events
            .iter()
            .all(|e| !matches!(e.message, ServerMessage::ChatMessage { .. })));
    }

    #[test]
    fn medikit_out_of_reach_is_untouched() {
        let mut world = world_with(WorldConfig::default());
        let id = standing_at(&mut world, 760.0, 150.0);
        world.player_mut(id).unwrap().health = 1;
        world.check_medikit_pickup(id);
        assert_eq!(world.player(id).unwrap().health, 1);
        assert!(world.medikits()[0].active);
    }

    #[test]
    fn armor_only_granted_when_bare() {
        let mut world = world_with(WorldConfig::default());
        let id = standing_at(&mut world, 500.0, 700.0);
        world.check_armor_pickup(id);
        assert_eq!(world.player(id).unwrap().armor, 1);
        assert!(!world.armors()[0].active);

        world.armors_mut()[0].active = true;
        world.player_mut(id).unwrap().armor = 2;
        world.check_armor_pickup(id);
        assert_eq!(world.player(id).unwrap().armor, 2);
        assert!(!world.armors()[0].active);
    }

    #[test]
    fn sweeps_reactivate_everything_and_reschedule() {
        let mut world = world_with(WorldConfig::default());
        for item in world.medikits_mut() {
            item.active = false;
        }
        world.armors_mut()[1].active = false;
        world.tick(45_000);
        assert!(world.medikits().iter().all(|m| m.active));
        assert!(world.armors().iter().all(|a| a.active));
        assert_eq!(world.scheduler().due_at(TimerKind::MedikitRespawn), Some(90_000));
        assert_eq!(world.scheduler().due_at(TimerKind::ArmorRespawn), Some(90_000));
    }

    #[test]
    fn missed_sweeps_are_not_replayed() {
        assert_eq!(next_sweep(45_000, 45_010, 45_000), 90_000);
        assert_eq!(next_sweep(45_000, 200_000, 45_000), 245_000);
    }

    #[test]
    fn booster_pickup_starts_and_refreshes_boost() {
        let mut world = world_with(WorldConfig::default());
        world.set_speed_boosters(vec![Item::active_at(400.0, 900.0)]);
        let id = standing_at(&mut world, 420.0, 880.0);
        world.check_booster_pickup(id);
        assert!(world.player(id).unwrap().speed_boost_active);
        assert_eq!(
            world.scheduler().due_at(TimerKind::SpeedBoostExpiry(id)),
            Some(10_000)
        );
        let events = world.drain_events();
        assert!(events.iter().any(|e| e.audience == crate::protocol::Audience::Only(id)
            && e.message == ServerMessage::SpeedBoostActive { duration_ms: 10_000 }));

        world.advance_clock(6_000);
        world.set_speed_boosters(vec![Item::active_at(420.0, 880.0)]);
        world.check_booster_pickup(id);
        assert_eq!(
            world.scheduler().due_at(TimerKind::SpeedBoostExpiry(id)),
            Some(16_000)
        );
    }

    #[test]
    fn boost_expiry_notifies_only_that_player() {
        let mut world = world_with(WorldConfig::default());
        let id = standing_at(&mut world, 420.0, 880.0);
        world.player_mut(id).unwrap().speed_boost_active = true;
        world.expire_speed_boost(id);
        assert!(!world.player(id).unwrap().speed_boost_active);
        let events = world.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].audience, crate::protocol::Audience::Only(id));
        assert_eq!(events[0].message, ServerMessage::SpeedBoostEnded);
    }

    #[test]
    fn booster_spawns_once_per_interval() {
        let mut world = world_with(WorldConfig::default());
        world.tick(0);
        assert_eq!(world.speed_boosters().len(), 1);
        let first = world.speed_boosters()[0];

        world.speed_boosters[0].active = false;
        world.tick(59_999);
        assert!(!world.speed_boosters()[0].active);

        world.tick(60_000);
        assert_eq!(world.speed_boosters().len(), 1);
        assert!(world.speed_boosters()[0].active);
        let candidates = &world.config().booster.candidates;
        assert!(candidates.iter().any(|c| c.x == first.x && c.y == first.y));
    }

    #[test]
    fn booster_falls_back_inside_margin_when_candidates_blocked() {
        let config = WorldConfig {
            booster: BoosterConfig {
                // On top of a wall.
                candidates: vec![Point::new(305.0, 300.0)],
                ..BoosterConfig::default()
            },
            ..WorldConfig::default()
        };
        let mut world = world_with(config);
        world.spawn_booster();
        let booster = world.speed_boosters()[0];
        assert!(booster.x != 305.0 || booster.y != 300.0);
        assert!((30.0..=1570.0).contains(&booster.x));
        assert!((30.0..=1170.0).contains(&booster.y));
    }

    #[test]
    fn spot_checks_walls_spawns_and_items() {
        let world = world_with(WorldConfig::default());
        assert!(!world.booster_spot_is_free(Point::new(290.0, 300.0)));
        assert!(!world.booster_spot_is_free(Point::new(150.0, 450.0)));
        assert!(!world.booster_spot_is_free(Point::new(750.0, 160.0)));
        assert!(world.booster_spot_is_free(Point::new(750.0, 700.0)));
    }
}
