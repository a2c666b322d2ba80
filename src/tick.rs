use tracing::{debug, info};

use crate::geometry::{projectile_hits_player, projectile_hits_wall};
use crate::model::{ConnId, Player, Projectile};
use crate::timers::TimerKind;
use crate::world::World;

/// Distance-scaled damage, rounded, never below `min_damage`.
pub fn falloff_damage(base: f32, distance: f32, max_distance: f32, min_damage: f32) -> i32 {
    if max_distance <= 0.0 {
        return min_damage.max(base).round() as i32;
    }
    let scaled = base * (1.0 - distance / max_distance);
    scaled.max(min_damage).round() as i32
}

/// Armor soaks damage first; whatever it cannot absorb goes to health.
pub fn apply_damage(player: &mut Player, damage: i32) {
    if player.armor > 0 {
        player.armor -= damage;
        if player.armor < 0 {
            player.health += player.armor;
            player.armor = 0;
        }
    } else {
        player.health -= damage;
    }
}

enum ProjectileStep {
    Flying,
    Expired,
    Hit(ConnId),
}

impl World {
    /// One simulation step: deferred work first, then booster spawning and
    /// projectile flight.
    pub fn tick(&mut self, now_ms: i64) {
        self.advance_clock(now_ms);
        self.run_due_timers();
        self.maybe_spawn_booster();
        self.update_projectiles();
    }

    fn run_due_timers(&mut self) {
        while let Some((kind, due_ms)) = self.scheduler.pop_due(self.now_ms) {
            match kind {
                TimerKind::MatchCountdown => self.countdown_step(due_ms),
                TimerKind::FlagReset => self.reset_flag(),
                TimerKind::MatchReset => self.reset_match(),
                TimerKind::MedikitRespawn => self.respawn_medikits(due_ms),
                TimerKind::ArmorRespawn => self.respawn_armors(due_ms),
                TimerKind::SpeedBoostExpiry(id) => self.expire_speed_boost(id),
            }
        }
    }

    pub(crate) fn update_projectiles(&mut self) {
        let mut index = 0;
        while index < self.projectiles.len() {
            match self.step_projectile(index) {
                ProjectileStep::Flying => index += 1,
                ProjectileStep::Expired => {
                    self.projectiles.remove(index);
                }
                ProjectileStep::Hit(victim) => {
                    let projectile = self.projectiles.remove(index);
                    self.resolve_hit(victim, &projectile);
                }
            }
        }
    }

    fn step_projectile(&mut self, index: usize) -> ProjectileStep {
        let projectile = &mut self.projectiles[index];
        projectile.x += projectile.vx;
        projectile.y += projectile.vy;

        if projectile_hits_wall(projectile.x, projectile.y, &self.config.walls) {
            return ProjectileStep::Expired;
        }
        let max_distance = self.config.stats(projectile.class).max_distance;
        if projectile.distance_traveled() > max_distance {
            return ProjectileStep::Expired;
        }

        let projectile = &self.projectiles[index];
        self.players
            .values()
            .find(|player| {
                player.id != projectile.owner
                    && projectile_hits_player(projectile.x, projectile.y, player.x, player.y)
            })
            .map(|player| ProjectileStep::Hit(player.id))
            .unwrap_or(ProjectileStep::Flying)
    }

    fn resolve_hit(&mut self, victim: ConnId, projectile: &Projectile) {
        let stats = self.config.stats(projectile.class);
        let damage = falloff_damage(
            projectile.damage,
            projectile.distance_traveled(),
            stats.max_distance,
            stats.min_damage,
        );

        let player = match self.players.get_mut(&victim) {
            Some(player) => player,
            None => return,
        };
        let had_armor = player.armor > 0;
        apply_damage(player, damage);
        let username = player.username.clone();
        let line = if had_armor {
            format!(
                "{} was hit! Armor: {}, Health: {}",
                username,
                player.armor,
                player.health.max(0)
            )
        } else {
            format!("{} was hit! Health: {}", username, player.health.max(0))
        };
        let eliminated = player.health <= 0;
        let (death_x, death_y) = (player.x, player.y);
        debug!("{}", line);
        self.announce(line);

        if !eliminated {
            return;
        }

        if self.flag.holder == Some(victim) {
            self.drop_flag_at(death_x, death_y);
        }
        if let Some(player) = self.players.get_mut(&victim) {
            player.respawn(&self.config);
            player.deaths += 1;
        }
        if let Some(shooter) = self.players.get_mut(&projectile.owner) {
            shooter.kills += 1;
        }
        info!("{} was eliminated", username);
        self.announce(format!("{} was eliminated!", username));
    }
}
