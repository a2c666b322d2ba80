use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Rect;
use crate::model::{ConnId, Flag, Item, Player, PlayerClass, Projectile, Score, Team};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    ChooseTeam {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        team: Option<String>,
        #[serde(default)]
        class: Option<String>,
    },
    Move {
        dx: f32,
        dy: f32,
    },
    Shoot {
        angle: f32,
    },
    ChatMessage {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome {
        id: ConnId,
    },
    State(Snapshot),
    ChatUpdate {
        messages: Vec<String>,
    },
    ChatMessage {
        text: String,
    },
    Countdown {
        seconds: u32,
    },
    GameStarted,
    UpdateMedikits {
        items: Vec<Item>,
    },
    UpdateArmors {
        items: Vec<Item>,
    },
    UpdateSpeedBoosters {
        items: Vec<Item>,
    },
    SpeedBoostActive {
        #[serde(rename = "durationMs")]
        duration_ms: i64,
    },
    SpeedBoostEnded,
    NewProjectile {
        projectiles: Vec<ProjectilePublic>,
    },
    GameOver {
        team: Team,
    },
    PlayerMoved {
        id: ConnId,
        x: f32,
        y: f32,
    },
    ErrorMessage {
        message: String,
    },
}

/// Who an event-driven message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    Only(ConnId),
    AllExcept(ConnId),
}

impl Audience {
    pub fn includes(&self, id: ConnId) -> bool {
        match self {
            Audience::All => true,
            Audience::Only(target) => *target == id,
            Audience::AllExcept(skipped) => *skipped != id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub players: BTreeMap<ConnId, PlayerPublic>,
    pub projectiles: Vec<ProjectilePublic>,
    pub walls: Vec<Rect>,
    pub flag: Flag,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublic {
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub armor: i32,
    pub has_flag: bool,
    pub team: Team,
    pub speed_boost_active: bool,
    pub username: String,
}

impl From<&Player> for PlayerPublic {
    fn from(player: &Player) -> Self {
        Self {
            x: player.x,
            y: player.y,
            health: player.health,
            armor: player.armor,
            has_flag: player.has_flag,
            team: player.team,
            speed_boost_active: player.speed_boost_active,
            username: player.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectilePublic {
    pub x: f32,
    pub y: f32,
    pub class: PlayerClass,
}

impl From<&Projectile> for ProjectilePublic {
    fn from(projectile: &Projectile) -> Self {
        Self {
            x: projectile.x,
            y: projectile.y,
            class: projectile.class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn parses_inbound_commands() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"chooseTeam","username":"ana","team":"red","class":"sniper"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::ChooseTeam {
                username: Some("ana".to_string()),
                team: Some("red".to_string()),
                class: Some("sniper".to_string()),
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"move","dx":3,"dy":-3}"#).unwrap();
        assert_eq!(msg, ClientMessage::Move { dx: 3.0, dy: -3.0 });

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"chatMessage","text":"hi"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ChatMessage { text: "hi".to_string() });
    }

    #[test]
    fn unknown_command_types_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"ping"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"teleport","x":1}"#).is_err());
    }

    #[test]
    fn choose_team_tolerates_missing_fields() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"chooseTeam","username":"ana"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::ChooseTeam {
                username: Some("ana".to_string()),
                team: None,
                class: None,
            }
        );
    }

    #[test]
    fn outbound_names_match_client_events() {
        let value = serde_json::to_value(ServerMessage::Countdown { seconds: 4 }).unwrap();
        assert_eq!(value, json!({"type": "countdown", "seconds": 4}));

        let value = serde_json::to_value(ServerMessage::SpeedBoostActive { duration_ms: 10_000 }).unwrap();
        assert_eq!(value, json!({"type": "speedBoostActive", "durationMs": 10_000}));

        let value = serde_json::to_value(ServerMessage::GameOver { team: Team::Blue }).unwrap();
        assert_eq!(value, json!({"type": "gameOver", "team": "blue"}));

        let value = serde_json::to_value(ServerMessage::GameStarted).unwrap();
        assert_eq!(value, json!({"type": "gameStarted"}));
    }

    #[test]
    fn snapshot_serializes_flat_under_state_tag() {
        let id = Uuid::new_v4();
        let mut players = BTreeMap::new();
        players.insert(
            id,
            PlayerPublic {
                x: 1.0,
                y: 2.0,
                health: 2,
                armor: 0,
                has_flag: true,
                team: Team::Red,
                speed_boost_active: false,
                username: "ana".to_string(),
            },
        );
        let snapshot = Snapshot {
            players,
            projectiles: Vec::new(),
            walls: Vec::new(),
            flag: Flag {
                x: 1.0,
                y: 2.0,
                holder: Some(id),
            },
            score: Score { red: 1, blue: 0 },
        };
        let value = serde_json::to_value(ServerMessage::State(snapshot)).unwrap();
        assert_eq!(value["type"], "state");
        assert_eq!(value["players"][id.to_string()]["hasFlag"], true);
        assert_eq!(value["flag"]["holder"], id.to_string());
        assert_eq!(value["score"]["red"], 1);
        assert!(value["players"][id.to_string()].get("lastShot").is_none());
    }

    #[test]
    fn audience_routing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(Audience::All.includes(a));
        assert!(Audience::Only(a).includes(a));
        assert!(!Audience::Only(a).includes(b));
        assert!(!Audience::AllExcept(a).includes(a));
        assert!(Audience::AllExcept(a).includes(b));
    }
}
