// Record id generation for the application-assigned keys
// (`id`, `request_id`, `game_id`, `lobby_id`, `invite_id`).

/// Generate a unique 21-character id using nanoid.
pub fn generate_id() -> String {
    nanoid::nanoid!()
}
