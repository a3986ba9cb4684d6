// Typed records for every Bisca collection.
//
// Field names are the stored names. Optional fields whose validator does not
// admit `null` are omitted when `None`; nullable fields store `null`.

use std::collections::BTreeMap;
use std::fmt;

use bson::{DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::db::record::Record;
use crate::utils::id::generate_id;

// ─── Enum domains ────────────────────────────────────────────────

/// State of a directed `user_friends` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Accepted, Self::Blocked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Blocked => "Blocked",
        }
    }
}

/// Lifecycle of a friend request or a game invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl RequestStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Accepted, Self::Declined, Self::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
            Self::Expired => "Expired",
        }
    }

    /// Whether the request can no longer change.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Game invites share the request lifecycle.
pub type InviteStatus = RequestStatus;

/// Phase of a game, shared by the listing and the full state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Waiting,
    Predicting,
    Playing,
    Paused,
    Finished,
}

impl GameStatus {
    pub const ALL: [Self; 5] = [
        Self::Waiting,
        Self::Predicting,
        Self::Playing,
        Self::Paused,
        Self::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Predicting => "Predicting",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Finished => "Finished",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(FriendshipStatus, RequestStatus, GameStatus);

/// String list of an enum domain, as the validator declares it.
pub fn domain<T: Copy, const N: usize>(all: [T; N], name: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(name).collect()
}

// ─── Users ───────────────────────────────────────────────────────

/// Authentication identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: &str) -> Self {
        let now = DateTime::now();
        Self {
            id: generate_id(),
            username: username.to_string(),
            email: email.to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Public profile, 1:1 with `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl UserProfile {
    pub fn new(user_id: &str, name: &str, surname: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            surname: surname.to_string(),
            bio: String::new(),
            profile_picture: None,
            updated_at: Some(DateTime::now()),
        }
    }
}

/// Outcome of one finished game for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Victory,
    Defeat,
    Draw,
}

/// Aggregate counters, 1:1 with `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub user_id: String,
    #[serde(default)]
    pub victories: i32,
    #[serde(default)]
    pub defeats: i32,
    #[serde(default)]
    pub draws: i32,
    #[serde(default)]
    pub total_games: i32,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub lose_rate: f64,
    #[serde(default)]
    pub draw_rate: f64,
    #[serde(default)]
    pub total_rate: f64,
    #[serde(default)]
    pub total_rate_games: i32,
    pub last_updated: DateTime,
}

impl UserStatistics {
    /// Zeroed counters for a new user.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            victories: 0,
            defeats: 0,
            draws: 0,
            total_games: 0,
            win_rate: 0.0,
            lose_rate: 0.0,
            draw_rate: 0.0,
            total_rate: 0.0,
            total_rate_games: 0,
            last_updated: DateTime::now(),
        }
    }

    /// Fold one finished game into the counters and rates.
    ///
    /// `total_rate` scores a draw as half a victory.
    pub fn record(&mut self, result: GameResult) {
        self.total_games += 1;
        self.total_rate_games += 1;

        match result {
            GameResult::Victory => self.victories += 1,
            GameResult::Defeat => self.defeats += 1,
            GameResult::Draw => self.draws += 1,
        }

        let total = f64::from(self.total_games);
        self.win_rate = f64::from(self.victories) / total;
        self.lose_rate = f64::from(self.defeats) / total;
        self.draw_rate = f64::from(self.draws) / total;
        self.total_rate =
            (f64::from(self.victories) + 0.5 * f64::from(self.draws)) / f64::from(self.total_rate_games);
        self.last_updated = DateTime::now();
    }
}

/// Directed friendship edge `user_id → friend_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFriend {
    pub user_id: String,
    pub friend_id: String,
    pub status: FriendshipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl UserFriend {
    pub fn new(user_id: &str, friend_id: &str, status: FriendshipStatus) -> Self {
        let now = DateTime::now();
        Self {
            user_id: user_id.to_string(),
            friend_id: friend_id.to_string(),
            status,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// The same relation seen from the other side.
    pub fn mirrored(&self) -> Self {
        Self {
            user_id: self.friend_id.clone(),
            friend_id: self.user_id.clone(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFriendRequest {
    pub request_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default)]
    pub responded_at: Option<DateTime>,
}

impl UserFriendRequest {
    pub fn new(from_user_id: &str, to_user_id: &str) -> Self {
        Self {
            request_id: generate_id(),
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            status: RequestStatus::Pending,
            created_at: Some(DateTime::now()),
            responded_at: None,
        }
    }
}

// ─── Cards ───────────────────────────────────────────────────────

/// The four suits of the Italian deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Denari,
    Coppe,
    Spade,
    Bastoni,
}

/// Card ranks, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Due,
    Tre,
    Quattro,
    Cinque,
    Sei,
    Sette,
    Fante,
    Cavallo,
    Re,
    Asso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub value: Rank,
}

impl Card {
    pub fn new(suit: Suit, value: Rank) -> Self {
        Self { suit, value }
    }
}

/// One entry of `game_states.cards_played`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedCard {
    pub player_id: String,
    pub card: Card,
}

// ─── Games ───────────────────────────────────────────────────────

/// Rule set embedded in both `game_infos` and `game_states`.
///
/// `victory_conditions` and `scoring_system` are free-form documents owned
/// by the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub max_players: i32,
    pub min_players: i32,
    #[serde(default)]
    pub cards_per_player: Option<i32>,
    #[serde(default)]
    pub time_per_turn: Option<i32>,
    #[serde(default)]
    pub time_per_prediction: Option<i32>,
    #[serde(default)]
    pub allow_spectators: bool,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub friendly_mode: bool,
    #[serde(default)]
    pub show_trump_card: bool,
    #[serde(default)]
    pub prediction_required: bool,
    #[serde(default)]
    pub max_predictions: Option<i32>,
    pub victory_conditions: Document,
    pub scoring_system: Document,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_players: 4,
            min_players: 2,
            cards_per_player: None,
            time_per_turn: None,
            time_per_prediction: None,
            allow_spectators: false,
            auto_start: false,
            friendly_mode: false,
            show_trump_card: true,
            prediction_required: true,
            max_predictions: None,
            victory_conditions: Document::new(),
            scoring_system: Document::new(),
        }
    }
}

/// Lobby-listing projection of a game (join phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: String,
    pub game_name: String,
    pub host_id: String,
    pub host_username: String,
    pub game_status: GameStatus,
    pub max_players: i32,
    #[serde(default)]
    pub current_players_count: i32,
    #[serde(default)]
    pub password_protected: bool,
    #[serde(default)]
    pub password_hash: Option<String>,
    pub rules: GameRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime>,
}

impl GameInfo {
    pub fn new(game_name: &str, host_id: &str, host_username: &str, rules: GameRules) -> Self {
        let now = DateTime::now();
        Self {
            game_id: generate_id(),
            game_name: game_name.to_string(),
            host_id: host_id.to_string(),
            host_username: host_username.to_string(),
            game_status: GameStatus::Waiting,
            max_players: rules.max_players,
            current_players_count: 1,
            password_protected: false,
            password_hash: None,
            rules,
            created_at: Some(now),
            last_updated: Some(now),
        }
    }

    pub fn with_password_hash(mut self, hash: &str) -> Self {
        self.password_protected = true;
        self.password_hash = Some(hash.to_string());
        self
    }
}

/// A seat in an active game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub player_id: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub is_guest: bool,
    #[serde(default)]
    pub prediction: Option<i32>,
    #[serde(default)]
    pub actual_wins: i32,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub user_stats: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime>,
}

impl PlayerEntry {
    pub fn guest(username: &str) -> Self {
        Self {
            player_id: generate_id(),
            username: username.to_string(),
            user_id: None,
            is_guest: true,
            prediction: None,
            actual_wins: 0,
            is_ready: false,
            profile_picture: None,
            user_stats: None,
            joined_at: Some(DateTime::now()),
        }
    }

    /// A seat for a registered user; the player id is the user id.
    pub fn registered(user: &User) -> Self {
        Self {
            player_id: user.id.clone(),
            user_id: Some(user.id.clone()),
            is_guest: false,
            ..Self::guest(&user.username)
        }
    }
}

/// Authoritative state of a game in play (game phase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,
    pub game_name: String,
    pub host_id: String,
    pub players: Vec<PlayerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<String>,
    #[serde(default)]
    pub cards_played: Vec<PlayedCard>,
    #[serde(default)]
    pub player_hands: BTreeMap<String, Vec<Card>>,
    #[serde(default)]
    pub trump_card: Option<Card>,
    pub game_status: GameStatus,
    #[serde(default)]
    pub current_round: i32,
    #[serde(default)]
    pub total_rounds: i32,
    #[serde(default)]
    pub max_players: i32,
    #[serde(default)]
    pub password_protected: bool,
    pub rules: GameRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime>,
}

impl GameState {
    /// Start the game phase from a listing: same id, name, host and rules.
    pub fn from_info(info: &GameInfo, players: Vec<PlayerEntry>) -> Self {
        Self {
            game_id: info.game_id.clone(),
            game_name: info.game_name.clone(),
            host_id: info.host_id.clone(),
            players,
            current_turn: None,
            cards_played: Vec::new(),
            player_hands: BTreeMap::new(),
            trump_card: None,
            game_status: GameStatus::Predicting,
            current_round: 1,
            total_rounds: info.rules.cards_per_player.unwrap_or(0),
            max_players: info.max_players,
            password_protected: info.password_protected,
            rules: info.rules.clone(),
            created_at: info.created_at,
            last_updated: Some(DateTime::now()),
        }
    }
}

/// Pre-game join staging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLobby {
    pub lobby_id: String,
    pub host_id: String,
    pub max_players: i32,
    #[serde(default)]
    pub current_players: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl GameLobby {
    pub fn new(host_id: &str, max_players: i32) -> Self {
        Self {
            lobby_id: generate_id(),
            host_id: host_id.to_string(),
            max_players,
            current_players: vec![host_id.to_string()],
            is_public: true,
            created_at: Some(DateTime::now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInvite {
    pub invite_id: String,
    pub game_id: String,
    pub from_player_id: String,
    pub to_player_id: String,
    pub status: InviteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default)]
    pub responded_at: Option<DateTime>,
}

impl GameInvite {
    pub fn new(game_id: &str, from_player_id: &str, to_player_id: &str) -> Self {
        Self {
            invite_id: generate_id(),
            game_id: game_id.to_string(),
            from_player_id: from_player_id.to_string(),
            to_player_id: to_player_id.to_string(),
            status: InviteStatus::Pending,
            created_at: Some(DateTime::now()),
            responded_at: None,
        }
    }
}

// ─── Record bindings ─────────────────────────────────────────────

macro_rules! record {
    ($ty:ty, $coll:expr, [$($key:ident),+]) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $coll;
            const KEY: &'static [&'static str] = &[$(stringify!($key)),+];

            fn key_filter(&self) -> Document {
                bson::doc! { $(stringify!($key): self.$key.clone()),+ }
            }
        }
    };
}

record!(User, "users", [id]);
record!(UserProfile, "user_profiles", [user_id]);
record!(UserStatistics, "user_statistics", [user_id]);
record!(UserFriend, "user_friends", [user_id, friend_id]);
record!(UserFriendRequest, "user_friend_requests", [request_id]);
record!(GameInfo, "game_infos", [game_id]);
record!(GameState, "game_states", [game_id]);
record!(GameLobby, "game_lobbies", [lobby_id]);
record!(GameInvite, "game_invites", [invite_id]);
