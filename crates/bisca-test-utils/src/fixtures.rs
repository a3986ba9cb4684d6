// Document generators: one valid document per collection, with fresh keys.
//
// Every generator returns a document its collection's validator accepts;
// tests derive invalid variants by removing or replacing fields.

use bson::{doc, Bson, DateTime, Document};
use chrono::{TimeDelta, Utc};

use bisca_core::utils::generate_id;

/// A timestamp `days` days in the past.
pub fn days_ago(days: i64) -> DateTime {
    DateTime::from_chrono(Utc::now() - TimeDelta::days(days))
}

pub fn user_doc() -> Document {
    let id = generate_id();
    doc! {
        "id": id.clone(),
        "username": format!("user-{}", &id[..8]),
        "email": format!("user-{}@email.com", &id[..8]),
        "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
        "created_at": days_ago(30),
        "updated_at": DateTime::now(),
    }
}

pub fn profile_doc(user_id: &str) -> Document {
    doc! {
        "user_id": user_id,
        "name": "Maria",
        "surname": "Rossi",
        "bio": "",
        "profile_picture": Bson::Null,
        "updated_at": DateTime::now(),
    }
}

pub fn statistics_doc(user_id: &str) -> Document {
    doc! {
        "user_id": user_id,
        "victories": 3,
        "defeats": 1,
        "draws": 0,
        "total_games": 4,
        "win_rate": 0.75,
        "lose_rate": 0.25,
        "draw_rate": 0.0,
        "total_rate": 0.75,
        "total_rate_games": 4,
        "last_updated": DateTime::now(),
    }
}

pub fn friend_doc(user_id: &str, friend_id: &str) -> Document {
    doc! {
        "user_id": user_id,
        "friend_id": friend_id,
        "status": "Accepted",
        "created_at": days_ago(2),
        "updated_at": DateTime::now(),
    }
}

pub fn friend_request_doc(from: &str, to: &str) -> Document {
    doc! {
        "request_id": generate_id(),
        "from_user_id": from,
        "to_user_id": to,
        "status": "Pending",
        "created_at": DateTime::now(),
        "responded_at": Bson::Null,
    }
}

pub fn rules_doc() -> Document {
    doc! {
        "max_players": 4,
        "min_players": 2,
        "cards_per_player": 5,
        "time_per_turn": Bson::Null,
        "time_per_prediction": 30,
        "allow_spectators": false,
        "auto_start": false,
        "friendly_mode": true,
        "show_trump_card": true,
        "prediction_required": true,
        "max_predictions": Bson::Null,
        "victory_conditions": { "mode": "most_lives" },
        "scoring_system": { "lives": 5 },
    }
}

pub fn game_info_doc(host_id: &str) -> Document {
    doc! {
        "game_id": generate_id(),
        "game_name": "Friday table",
        "host_id": host_id,
        "host_username": "host",
        "game_status": "Waiting",
        "max_players": 4,
        "current_players_count": 1,
        "password_protected": false,
        "password_hash": Bson::Null,
        "rules": rules_doc(),
        "created_at": DateTime::now(),
        "last_updated": DateTime::now(),
    }
}

pub fn player_doc(player_id: &str, is_guest: bool) -> Document {
    doc! {
        "player_id": player_id,
        "username": format!("player-{player_id}"),
        "user_id": if is_guest { Bson::Null } else { Bson::String(player_id.to_string()) },
        "is_guest": is_guest,
        "prediction": Bson::Null,
        "actual_wins": 0,
        "is_ready": true,
        "profile_picture": Bson::Null,
        "user_stats": Bson::Null,
        "joined_at": DateTime::now(),
    }
}

pub fn game_state_doc(host_id: &str) -> Document {
    doc! {
        "game_id": generate_id(),
        "game_name": "Friday table",
        "host_id": host_id,
        "players": [player_doc(host_id, false), player_doc(&generate_id(), true)],
        "current_turn": host_id,
        "cards_played": [],
        "player_hands": { host_id: [{ "suit": "Coppe", "value": "Asso" }] },
        "trump_card": { "suit": "Denari", "value": "Re" },
        "game_status": "Playing",
        "current_round": 1,
        "total_rounds": 5,
        "max_players": 4,
        "password_protected": false,
        "rules": rules_doc(),
        "created_at": days_ago(1),
        "last_updated": DateTime::now(),
    }
}

pub fn lobby_doc(host_id: &str) -> Document {
    doc! {
        "lobby_id": generate_id(),
        "host_id": host_id,
        "max_players": 4,
        "current_players": [host_id],
        "is_public": true,
        "created_at": DateTime::now(),
    }
}

pub fn invite_doc(game_id: &str, from: &str, to: &str) -> Document {
    doc! {
        "invite_id": generate_id(),
        "game_id": game_id,
        "from_player_id": from,
        "to_player_id": to,
        "status": "Pending",
        "created_at": DateTime::now(),
        "responded_at": Bson::Null,
    }
}

/// A valid document for any Bisca collection, referencing fresh ids.
pub fn valid_document(collection: &str) -> Option<Document> {
    let someone = generate_id();
    let other = generate_id();
    let doc = match collection {
        "users" => user_doc(),
        "user_profiles" => profile_doc(&someone),
        "user_statistics" => statistics_doc(&someone),
        "user_friends" => friend_doc(&someone, &other),
        "user_friend_requests" => friend_request_doc(&someone, &other),
        "game_infos" => game_info_doc(&someone),
        "game_states" => game_state_doc(&someone),
        "game_lobbies" => lobby_doc(&someone),
        "game_invites" => invite_doc(&generate_id(), &someone, &other),
        _ => return None,
    };
    Some(doc)
}
