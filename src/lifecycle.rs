use tracing::info;

use crate::geometry::within_reach;
use crate::model::{ConnId, Flag, Team};
use crate::protocol::ServerMessage;
use crate::timers::TimerKind;
use crate::world::World;

const COUNTDOWN_STEP_MS: i64 = 1_000;

impl World {
    /// Starts the lobby countdown, replacing one already running.
    pub(crate) fn start_countdown(&mut self) {
        self.scheduler.cancel(TimerKind::MatchCountdown);
        self.countdown_remaining = self.config.countdown_secs;
        if self.countdown_remaining == 0 {
            self.start_match();
            return;
        }
        info!("match starts in {} seconds", self.countdown_remaining);
        self.broadcast(ServerMessage::Countdown {
            seconds: self.countdown_remaining,
        });
        self.scheduler
            .schedule(TimerKind::MatchCountdown, self.now_ms + COUNTDOWN_STEP_MS);
    }

    pub(crate) fn countdown_step(&mut self, due_ms: i64) {
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining > 0 {
            self.broadcast(ServerMessage::Countdown {
                seconds: self.countdown_remaining,
            });
            self.scheduler
                .schedule(TimerKind::MatchCountdown, due_ms + COUNTDOWN_STEP_MS);
        } else {
            self.start_match();
        }
    }

    fn start_match(&mut self) {
        self.scheduler.cancel(TimerKind::MatchCountdown);
        for player in self.players.values_mut() {
            player.can_move = true;
            player.can_shoot = true;
        }
        self.match_running = true;
        info!("match started with {} players", self.players.len());
        self.broadcast(ServerMessage::GameStarted);
        self.broadcast_state();
    }

    pub(crate) fn check_flag_pickup(&mut self, id: ConnId) {
        if self.flag.holder.is_some() {
            return;
        }
        let range = self.config.flag_pickup_range;
        let player = match self.players.get_mut(&id) {
            Some(player) => player,
            None => return,
        };
        if !within_reach(player.x, player.y, self.flag.x, self.flag.y, range) {
            return;
        }
        player.has_flag = true;
        self.flag.holder = Some(id);
        self.flag.x = player.x;
        self.flag.y = player.y;
        let username = player.username.clone();
        info!("{} picked up the flag", username);
        self.announce(format!("{} picked up the flag!", username));
    }

    pub(crate) fn check_flag_capture(&mut self, id: ConnId) {
        let (team, username) = match self.players.get(&id) {
            Some(player)
                if player.has_flag && self.config.base_for(player.team).contains(player.x, player.y) =>
            {
                (player.team, player.username.clone())
            }
            _ => return,
        };

        let total = self.score.increment(team);
        let off_world = self.config.flag_off_world;
        self.drop_flag_at(off_world.x, off_world.y);
        info!("point for team {} ({} total)", team.label(), total);
        self.announce(format!("{} scored a point for team {}!", username, team.label()));
        self.scheduler.schedule(
            TimerKind::FlagReset,
            self.now_ms + self.config.flag_reset_delay_ms,
        );

        if total >= self.config.winning_score {
            self.game_over(team);
        }
    }

    /// Brings the flag back to the centre after a capture, unless something
    /// already moved it.
    pub(crate) fn reset_flag(&mut self) {
        if self.flag.holder.is_some() {
            return;
        }
        let home = self.config.flag_home;
        self.flag = Flag::at(home.x, home.y);
        self.announce("The flag is available again!".to_string());
        self.broadcast_state();
    }

    fn game_over(&mut self, winner: Team) {
        info!("team {} wins the match", winner.label());
        self.broadcast(ServerMessage::GameOver { team: winner });
        self.score.clear();
        self.scheduler.schedule(
            TimerKind::MatchReset,
            self.now_ms + self.config.match_reset_delay_ms,
        );
    }

    /// Full reset after a win: score, flag, every item kind, projectiles and
    /// each player's position, counters and boost. Deferred work from the old round is
    /// dropped.
    pub(crate) fn reset_match(&mut self) {
        self.scheduler.cancel(TimerKind::FlagReset);
        self.scheduler
            .cancel_where(|kind| matches!(kind, TimerKind::SpeedBoostExpiry(_)));

        self.score.clear();
        let home = self.config.flag_home;
        self.flag = Flag::at(home.x, home.y);
        self.projectiles.clear();
        for item in self
            .medikits
            .iter_mut()
            .chain(self.armors.iter_mut())
            .chain(self.speed_boosters.iter_mut())
        {
            item.active = true;
        }
        let mut boost_cleared = Vec::new();
        for player in self.players.values_mut() {
            player.respawn(&self.config);
            player.kills = 0;
            player.deaths = 0;
            player.last_shot_ms = None;
            if player.speed_boost_active {
                player.speed_boost_active = false;
                boost_cleared.push(player.id);
            }
        }

        info!("match reset");
        self.announce("A new round begins!".to_string());
        for id in boost_cleared {
            self.send_to(id, ServerMessage::SpeedBoostEnded);
        }
        self.broadcast(ServerMessage::UpdateMedikits {
            items: self.medikits.clone(),
        });
        self.broadcast(ServerMessage::UpdateArmors {
            items: self.armors.clone(),
        });
        self.broadcast(ServerMessage::UpdateSpeedBoosters {
            items: self.speed_boosters.clone(),
        });
        self.broadcast_state();
    }
}
