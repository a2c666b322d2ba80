use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::CommandError;
use crate::geometry::{movement_box_hits_wall, within_border, MOVE_BOX};
use crate::model::{ConnId, Player, PlayerClass, Projectile, Team};
use crate::protocol::{Audience, ClientMessage, ProjectilePublic, ServerMessage};
use crate::timers::TimerKind;
use crate::world::World;

const MAX_NAME_CHARS: usize = 20;
const MAX_CHAT_CHARS: usize = 160;

fn required(value: Option<String>, field: &'static str) -> Result<String, CommandError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(CommandError::MissingField(field)),
    }
}

impl World {
    pub fn handle_command(&mut self, id: ConnId, command: ClientMessage, now_ms: i64) {
        match command {
            ClientMessage::ChooseTeam {
                username,
                team,
                class,
            } => {
                if let Err(err) = self.choose_team(id, username, team, class, now_ms) {
                    warn!("team choice from {} rejected: {}", id, err);
                    self.send_to(
                        id,
                        ServerMessage::ErrorMessage {
                            message: err.to_string(),
                        },
                    );
                }
            }
            ClientMessage::Move { dx, dy } => self.move_player(id, dx, dy, now_ms),
            ClientMessage::Shoot { angle } => self.shoot(id, angle, now_ms),
            ClientMessage::ChatMessage { text } => self.chat_message(id, &text, now_ms),
        }
    }

    pub fn choose_team(
        &mut self,
        id: ConnId,
        username: Option<String>,
        team: Option<String>,
        class: Option<String>,
        now_ms: i64,
    ) -> Result<(), CommandError> {
        let username = required(username, "username")?;
        let team_raw = required(team, "team")?;
        let class_raw = required(class, "class")?;
        let team = Team::parse(&team_raw).ok_or(CommandError::UnknownTeam(team_raw))?;
        let class = PlayerClass::parse(&class_raw).ok_or(CommandError::UnknownClass(class_raw))?;
        let username: String = username.chars().take(MAX_NAME_CHARS).collect();

        self.advance_clock(now_ms);

        if let Some(previous) = self.players.get(&id) {
            if previous.has_flag {
                let (x, y) = (previous.x, previous.y);
                self.drop_flag_at(x, y);
            }
            self.scheduler.cancel(TimerKind::SpeedBoostExpiry(id));
        }

        let player = Player::new(id, username.clone(), team, class, &self.config);
        let class_name = self.config.stats(class).name.clone();
        self.add_player(player);

        info!("{} joined team {} as {}", username, team.label(), class_name);
        self.push_chat(format!(
            "{} joined team {} as {}!",
            username,
            team.label(),
            class_name
        ));
        self.broadcast_state();

        // Every join restarts the countdown; the newcomer stays gated until it ends.
        self.start_countdown();
        Ok(())
    }

    pub fn move_player(&mut self, id: ConnId, dx: f32, dy: f32, now_ms: i64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.advance_clock(now_ms);
        let player = match self.players.get_mut(&id) {
            Some(player) if player.can_move => player,
            _ => return,
        };

        let stats = self.config.classes.get(player.class);
        let mut speed_multiplier = stats.speed / self.config.base_speed;
        if player.speed_boost_active {
            speed_multiplier *= self.config.booster.speed_multiplier;
        }
        let new_x = player.x + dx * speed_multiplier;
        let new_y = player.y + dy * speed_multiplier;

        let mut moved = None;
        if !movement_box_hits_wall(new_x, new_y, &self.config.walls)
            && within_border(new_x, new_y, MOVE_BOX, MOVE_BOX, &self.config.border)
        {
            player.x = new_x;
            player.y = new_y;
            moved = Some((new_x, new_y));
        }

        if let Some((x, y)) = moved {
            if self.flag.holder == Some(id) {
                self.flag.x = x;
                self.flag.y = y;
            }
            self.emit(
                Audience::AllExcept(id),
                ServerMessage::PlayerMoved { id, x, y },
            );
        }

        self.check_flag_pickup(id);
        self.check_flag_capture(id);
        self.check_medikit_pickup(id);
        self.check_armor_pickup(id);
        self.check_booster_pickup(id);
    }

    pub fn shoot(&mut self, id: ConnId, angle: f32, now_ms: i64) {
        if !angle.is_finite() {
            return;
        }
        self.advance_clock(now_ms);
        let player = match self.players.get_mut(&id) {
            Some(player) if player.can_shoot => player,
            _ => return,
        };

        let stats = self.config.classes.get(player.class);
        if let Some(last_shot) = player.last_shot_ms {
            if now_ms - last_shot < stats.cooldown_ms {
                return;
            }
        }

        let use_spread = stats.projectile_count > 1 || stats.spread > 0.0;
        let half_spread = stats.spread / 2.0;
        for _ in 0..stats.projectile_count {
            let offset = if use_spread && half_spread > 0.0 {
                self.rng.gen_range(-half_spread..=half_spread)
            } else {
                0.0
            };
            self.projectiles
                .push(Projectile::fired(player, angle + offset, stats));
        }
        player.last_shot_ms = Some(now_ms);
        debug!("{} fired {} projectile(s)", player.username, stats.projectile_count);

        let projectiles = self.projectiles.iter().map(ProjectilePublic::from).collect();
        self.broadcast(ServerMessage::NewProjectile { projectiles });
    }

    pub fn chat_message(&mut self, id: ConnId, text: &str, now_ms: i64) {
        self.advance_clock(now_ms);
        let username = match self.players.get(&id) {
            Some(player) => player.username.clone(),
            None => return,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let trimmed: String = trimmed.chars().take(MAX_CHAT_CHARS).collect();
        self.push_chat(format!("{}: {}", username, trimmed));
    }

    pub fn disconnect(&mut self, id: ConnId, now_ms: i64) {
        self.advance_clock(now_ms);
        if let Some(player) = self.players.get(&id) {
            let username = player.username.clone();
            if player.has_flag {
                let (x, y) = (player.x, player.y);
                self.drop_flag_at(x, y);
                self.announce(format!("{} dropped the flag!", username));
            }
            self.remove_player(id);
            self.push_chat(format!("{} left the game.", username));
            info!("{} left the game", username);
        }

        if self.players.is_empty() {
            self.match_running = false;
            self.scheduler.cancel(TimerKind::MatchCountdown);
        }
        debug!("connection {} closed", id);
        self.broadcast_state();
    }
}
