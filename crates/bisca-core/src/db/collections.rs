// The Bisca database: nine collections, their validators and their indexes.

use crate::db::models::{domain, FriendshipStatus, GameStatus, RequestStatus};
use crate::db::schema::{
    CollectionSchema, DatabaseSchema, FieldSchema, IndexDirection, IndexSpec, ObjectSchema,
};

/// Default database name.
pub const DATABASE_NAME: &str = "biscaDB";

fn friendship_status() -> FieldSchema {
    FieldSchema::string_enum(&domain(FriendshipStatus::ALL, FriendshipStatus::as_str))
}

fn request_status() -> FieldSchema {
    FieldSchema::string_enum(&domain(RequestStatus::ALL, RequestStatus::as_str))
}

fn game_status() -> FieldSchema {
    FieldSchema::string_enum(&domain(GameStatus::ALL, GameStatus::as_str))
}

/// The embedded rule set shared by `game_infos` and `game_states`.
pub fn rules_schema() -> ObjectSchema {
    ObjectSchema::new()
        .required("max_players", FieldSchema::int())
        .required("min_players", FieldSchema::int())
        .optional("cards_per_player", FieldSchema::int().nullable())
        .optional("time_per_turn", FieldSchema::int().nullable())
        .optional("time_per_prediction", FieldSchema::int().nullable())
        .optional("allow_spectators", FieldSchema::bool())
        .optional("auto_start", FieldSchema::bool())
        .optional("friendly_mode", FieldSchema::bool())
        .optional("show_trump_card", FieldSchema::bool())
        .optional("prediction_required", FieldSchema::bool())
        .optional("max_predictions", FieldSchema::int().nullable())
        .required("victory_conditions", FieldSchema::object())
        .required("scoring_system", FieldSchema::object())
}

fn player_schema() -> ObjectSchema {
    ObjectSchema::new()
        .required("player_id", FieldSchema::string())
        .required("username", FieldSchema::string())
        .optional("user_id", FieldSchema::string().nullable())
        .required("is_guest", FieldSchema::bool())
        .optional("prediction", FieldSchema::int().nullable())
        .optional("actual_wins", FieldSchema::int())
        .optional("is_ready", FieldSchema::bool())
        .optional("profile_picture", FieldSchema::string().nullable())
        .optional("user_stats", FieldSchema::object().nullable())
        .optional("joined_at", FieldSchema::date())
}

pub fn users() -> CollectionSchema {
    CollectionSchema::new(
        "users",
        ObjectSchema::new()
            .required("id", FieldSchema::string())
            .required("username", FieldSchema::string())
            .required("email", FieldSchema::string())
            .required("password_hash", FieldSchema::string())
            .optional("created_at", FieldSchema::date())
            .optional("updated_at", FieldSchema::date()),
    )
    .describe("frequent read/write, authentication")
    .index(IndexSpec::asc("id").unique())
    .index(IndexSpec::asc("created_at"))
}

pub fn user_profiles() -> CollectionSchema {
    CollectionSchema::new(
        "user_profiles",
        ObjectSchema::new()
            .required("user_id", FieldSchema::string())
            .required("name", FieldSchema::string())
            .required("surname", FieldSchema::string())
            .optional("bio", FieldSchema::string())
            .optional("profile_picture", FieldSchema::string().nullable())
            .optional("updated_at", FieldSchema::date()),
    )
    .describe("read-heavy, rarely written")
    .index(IndexSpec::asc("user_id").unique())
}

pub fn user_statistics() -> CollectionSchema {
    CollectionSchema::new(
        "user_statistics",
        ObjectSchema::new()
            .required("user_id", FieldSchema::string())
            .optional("victories", FieldSchema::int())
            .optional("defeats", FieldSchema::int())
            .optional("draws", FieldSchema::int())
            .optional("total_games", FieldSchema::int())
            .optional("win_rate", FieldSchema::double())
            .optional("lose_rate", FieldSchema::double())
            .optional("draw_rate", FieldSchema::double())
            .optional("total_rate", FieldSchema::double())
            .optional("total_rate_games", FieldSchema::int())
            .required("last_updated", FieldSchema::date()),
    )
    .describe("write-heavy, leaderboard reads")
    .index(IndexSpec::asc("user_id").unique())
    .index(IndexSpec::desc("total_games"))
    .index(IndexSpec::desc("win_rate"))
    .index(IndexSpec::desc("victories"))
}

pub fn user_friends() -> CollectionSchema {
    CollectionSchema::new(
        "user_friends",
        ObjectSchema::new()
            .required("user_id", FieldSchema::string())
            .required("friend_id", FieldSchema::string())
            .required("status", friendship_status())
            .optional("created_at", FieldSchema::date())
            .optional("updated_at", FieldSchema::date()),
    )
    .describe("directed friendship edges")
    .index(IndexSpec::asc("user_id"))
    .index(IndexSpec::asc("friend_id"))
    .index(IndexSpec::asc("status"))
    .index(
        IndexSpec::asc("user_id")
            .then("friend_id", IndexDirection::Ascending)
            .unique(),
    )
}

pub fn user_friend_requests() -> CollectionSchema {
    CollectionSchema::new(
        "user_friend_requests",
        ObjectSchema::new()
            .required("request_id", FieldSchema::string())
            .required("from_user_id", FieldSchema::string())
            .required("to_user_id", FieldSchema::string())
            .required("status", request_status())
            .optional("created_at", FieldSchema::date())
            .optional("responded_at", FieldSchema::date().nullable()),
    )
    .describe("temporary, pending friend requests")
    .index(IndexSpec::asc("request_id").unique())
    .index(IndexSpec::asc("from_user_id"))
    .index(IndexSpec::asc("to_user_id"))
    .index(IndexSpec::asc("status"))
    .index(IndexSpec::desc("created_at"))
}

pub fn game_infos() -> CollectionSchema {
    CollectionSchema::new(
        "game_infos",
        ObjectSchema::new()
            .required("game_id", FieldSchema::string())
            .required("game_name", FieldSchema::string())
            .required("host_id", FieldSchema::string())
            .required("host_username", FieldSchema::string())
            .required("game_status", game_status())
            .optional("max_players", FieldSchema::int())
            .optional("current_players_count", FieldSchema::int())
            .optional("password_protected", FieldSchema::bool())
            .optional("password_hash", FieldSchema::string().nullable())
            .required("rules", FieldSchema::document(rules_schema()))
            .optional("created_at", FieldSchema::date())
            .optional("last_updated", FieldSchema::date()),
    )
    .describe("join phase, fast lobby queries")
    .index(IndexSpec::asc("game_id").unique())
    .index(IndexSpec::asc("game_status"))
    .index(IndexSpec::asc("password_protected"))
    .index(IndexSpec::asc("max_players"))
    .index(IndexSpec::asc("current_players_count"))
    .index(IndexSpec::desc("created_at"))
    .index(IndexSpec::asc("host_id"))
}

pub fn game_states() -> CollectionSchema {
    CollectionSchema::new(
        "game_states",
        ObjectSchema::new()
            .required("game_id", FieldSchema::string())
            .required("game_name", FieldSchema::string())
            .required("host_id", FieldSchema::string())
            .required(
                "players",
                FieldSchema::array().with_items(FieldSchema::document(player_schema())),
            )
            .optional("current_turn", FieldSchema::string())
            .optional("cards_played", FieldSchema::array())
            .optional("player_hands", FieldSchema::object())
            .optional("trump_card", FieldSchema::object().nullable())
            .required("game_status", game_status())
            .optional("current_round", FieldSchema::int())
            .optional("total_rounds", FieldSchema::int())
            .optional("max_players", FieldSchema::int())
            .optional("password_protected", FieldSchema::bool())
            .required("rules", FieldSchema::document(rules_schema()))
            .optional("created_at", FieldSchema::date())
            .optional("last_updated", FieldSchema::date()),
    )
    .describe("game phase, complete state")
    .index(IndexSpec::asc("game_id").unique())
    .index(IndexSpec::asc("game_status"))
    .index(IndexSpec::asc("current_turn"))
    .index(IndexSpec::asc("current_round"))
    .index(IndexSpec::desc("created_at"))
    .index(IndexSpec::desc("last_updated"))
    .index(IndexSpec::asc("players.player_id"))
    .index(IndexSpec::asc("host_id"))
}

pub fn game_lobbies() -> CollectionSchema {
    CollectionSchema::new(
        "game_lobbies",
        ObjectSchema::new()
            .required("lobby_id", FieldSchema::string())
            .required("host_id", FieldSchema::string())
            .required("max_players", FieldSchema::int())
            .optional("current_players", FieldSchema::array())
            .optional("is_public", FieldSchema::bool())
            .optional("created_at", FieldSchema::date()),
    )
    .describe("pre-game join staging")
    .index(IndexSpec::asc("lobby_id").unique())
    .index(IndexSpec::asc("host_id"))
    .index(IndexSpec::asc("is_public"))
    .index(IndexSpec::desc("created_at"))
}

pub fn game_invites() -> CollectionSchema {
    CollectionSchema::new(
        "game_invites",
        ObjectSchema::new()
            .required("invite_id", FieldSchema::string())
            .required("game_id", FieldSchema::string())
            .required("from_player_id", FieldSchema::string())
            .required("to_player_id", FieldSchema::string())
            .required("status", request_status())
            .optional("created_at", FieldSchema::date())
            .optional("responded_at", FieldSchema::date().nullable()),
    )
    .describe("temporary, pending game invites")
    .index(IndexSpec::asc("invite_id").unique())
    .index(IndexSpec::asc("game_id"))
    .index(IndexSpec::asc("from_player_id"))
    .index(IndexSpec::asc("to_player_id"))
    .index(IndexSpec::asc("status"))
    .index(IndexSpec::desc("created_at"))
}

impl DatabaseSchema {
    /// The full Bisca schema under `name`, collections in creation order.
    pub fn bisca_named(name: &str) -> Self {
        DatabaseSchema::new(name)
            .collection(users())
            .collection(user_profiles())
            .collection(user_statistics())
            .collection(user_friends())
            .collection(user_friend_requests())
            .collection(game_infos())
            .collection(game_states())
            .collection(game_lobbies())
            .collection(game_invites())
    }

    /// The full Bisca schema for `biscaDB`.
    pub fn bisca() -> Self {
        Self::bisca_named(DATABASE_NAME)
    }
}
