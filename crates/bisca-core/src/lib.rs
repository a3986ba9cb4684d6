#![doc = include_str!("../README.md")]

pub mod db;
pub mod env;
pub mod error;
pub mod utils;

// Re-exports for convenience
pub use db::adapter::{Adapter, FindManyQuery, SchemaOptions, SchemaStatus, SortBy, SortDirection};
pub use db::collections::DATABASE_NAME;
pub use db::models::{
    Card, FriendshipStatus, GameInfo, GameInvite, GameLobby, GameResult, GameRules, GameState,
    GameStatus, InviteStatus, PlayedCard, PlayerEntry, Rank, RequestStatus, Suit, User,
    UserFriend, UserFriendRequest, UserProfile, UserStatistics,
};
pub use db::record::Record;
pub use db::schema::{BsonType, CollectionSchema, DatabaseSchema, FieldSchema, IndexSpec, ObjectSchema};
pub use db::store::Store;
pub use error::{BiscaError, Result, ValidationError, ValidationErrorKind};
