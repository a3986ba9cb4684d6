// Typed store: record <-> document conversion on top of any `Adapter`,
// plus the cross-collection helpers the schema itself cannot enforce
// (user references, paired friendship edges, listing -> state promotion).

use std::sync::Arc;

use bson::{doc, Document};
use tracing::{debug, info};

use crate::db::adapter::{Adapter, FindManyQuery, SortBy};
use crate::db::models::{
    FriendshipStatus, GameInfo, GameResult, GameState, GameStatus, PlayerEntry, User,
    UserFriend, UserProfile, UserStatistics,
};
use crate::db::record::Record;
use crate::error::{BiscaError, Result};

/// Typed access to the Bisca collections.
#[derive(Debug, Clone)]
pub struct Store {
    adapter: Arc<dyn Adapter>,
}

impl Store {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    // ─── Generic record access ───────────────────────────────────

    pub async fn insert<R: Record>(&self, record: &R) -> Result<()> {
        let doc = record.to_document()?;
        self.adapter.insert_one(R::COLLECTION, doc).await
    }

    /// Look a record up by its key values, given in `R::KEY` order.
    pub async fn find_by_key<R: Record>(&self, key: &[&str]) -> Result<Option<R>> {
        if key.len() != R::KEY.len() {
            return Err(anyhow::anyhow!(
                "`{}` is keyed by {} field(s), got {}",
                R::COLLECTION,
                R::KEY.len(),
                key.len()
            )
            .into());
        }

        let mut filter = Document::new();
        for (field, value) in R::KEY.iter().zip(key) {
            filter.insert(*field, *value);
        }

        self.adapter
            .find_one(R::COLLECTION, filter)
            .await?
            .map(R::from_document)
            .transpose()
    }

    pub async fn find_many<R: Record>(&self, query: FindManyQuery) -> Result<Vec<R>> {
        self.adapter
            .find_many(R::COLLECTION, query)
            .await?
            .into_iter()
            .map(R::from_document)
            .collect()
    }

    /// Overwrite the stored record that has `record`'s key. Fields the
    /// record leaves out are removed. Returns whether one existed.
    pub async fn save<R: Record>(&self, record: &R) -> Result<bool> {
        let doc = record.to_document()?;
        self.adapter
            .replace_one(R::COLLECTION, record.key_filter(), doc)
            .await
    }

    // ─── Users ───────────────────────────────────────────────────

    async fn require_user(&self, user_id: &str) -> Result<()> {
        let found = self
            .adapter
            .count(User::COLLECTION, doc! { "id": user_id })
            .await?;
        if found == 0 {
            return Err(BiscaError::UnknownUser(user_id.to_string()));
        }
        Ok(())
    }

    /// Insert a profile for an existing user.
    pub async fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        self.require_user(&profile.user_id).await?;
        self.insert(profile).await
    }

    /// Insert zeroed statistics for an existing user.
    pub async fn create_statistics(&self, user_id: &str) -> Result<UserStatistics> {
        self.require_user(user_id).await?;
        let stats = UserStatistics::new(user_id);
        self.insert(&stats).await?;
        Ok(stats)
    }

    /// Fold one game outcome into a user's statistics, creating them on
    /// first use.
    pub async fn record_game_result(
        &self,
        user_id: &str,
        result: GameResult,
    ) -> Result<UserStatistics> {
        let mut stats = match self.find_by_key::<UserStatistics>(&[user_id]).await? {
            Some(stats) => stats,
            None => self.create_statistics(user_id).await?,
        };

        stats.record(result);
        self.save(&stats).await?;
        debug!(user_id, total_games = stats.total_games, "Recorded game result");
        Ok(stats)
    }

    /// Top players by win rate.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<UserStatistics>> {
        self.find_many(
            FindManyQuery::default()
                .sort(SortBy::desc("win_rate"))
                .limit(limit),
        )
        .await
    }

    // ─── Friends ─────────────────────────────────────────────────

    /// The edge between two users, looked up in both directions.
    pub async fn friendship_between(&self, a: &str, b: &str) -> Result<Option<UserFriend>> {
        if let Some(edge) = self.find_by_key::<UserFriend>(&[a, b]).await? {
            return Ok(Some(edge));
        }
        self.find_by_key::<UserFriend>(&[b, a]).await
    }

    /// Ids of every accepted friend of `user_id`, from either side of the edge.
    pub async fn friends_of(&self, user_id: &str) -> Result<Vec<String>> {
        let accepted = FriendshipStatus::Accepted.as_str();

        let outgoing: Vec<UserFriend> = self
            .find_many(FindManyQuery::filter(
                doc! { "user_id": user_id, "status": accepted },
            ))
            .await?;
        let incoming: Vec<UserFriend> = self
            .find_many(FindManyQuery::filter(
                doc! { "friend_id": user_id, "status": accepted },
            ))
            .await?;

        let mut friends: Vec<String> = outgoing
            .into_iter()
            .map(|e| e.friend_id)
            .chain(incoming.into_iter().map(|e| e.user_id))
            .collect();
        friends.sort();
        friends.dedup();
        Ok(friends)
    }

    // ─── Games ───────────────────────────────────────────────────

    /// Listings in one phase, newest first.
    pub async fn games_by_status(&self, status: GameStatus, limit: i64) -> Result<Vec<GameInfo>> {
        self.find_many(
            FindManyQuery::filter(doc! { "game_status": status.as_str() })
                .sort(SortBy::desc("created_at"))
                .limit(limit),
        )
        .await
    }

    /// Move a game from the join phase to the game phase.
    ///
    /// The state is inserted first; the listing is removed only once the
    /// state has been accepted, so a rejected state leaves the listing intact.
    pub async fn promote_to_game_state(
        &self,
        game_id: &str,
        players: Vec<PlayerEntry>,
    ) -> Result<GameState> {
        let info = self
            .find_by_key::<GameInfo>(&[game_id])
            .await?
            .ok_or_else(|| BiscaError::UnknownGame(game_id.to_string()))?;

        let state = GameState::from_info(&info, players);
        self.insert(&state).await?;
        self.adapter
            .delete_many(GameInfo::COLLECTION, info.key_filter())
            .await?;

        info!(game_id, players = state.players.len(), "Promoted game to play");
        Ok(state)
    }
}
