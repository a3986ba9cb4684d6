// Adapter conformance suites: the schema's observable guarantees, checked
// against any `Adapter` created with the Bisca schema.

use bson::{doc, Bson};

use bisca_core::db::adapter::SchemaOptions;
use bisca_core::db::models::{
    Card, FriendshipStatus, GameInfo, GameResult, GameRules, GameState, GameStatus, PlayedCard,
    PlayerEntry, Rank, Suit, User, UserFriend, UserProfile, UserStatistics,
};
use bisca_core::db::record::Record;
use bisca_core::error::BiscaError;

use crate::fixtures::{
    friend_doc, game_info_doc, game_state_doc, player_doc, profile_doc, statistics_doc,
    user_doc, valid_document,
};
use crate::test_suite::{
    ensure, expect_duplicate, expect_validation, TestEntry, TestFuture, TestHelpers, TestResult,
    TestSuite,
};

/// Every suite, in the order the runner executes them.
pub fn all_suites() -> Vec<TestSuite> {
    vec![validator_suite(), index_suite(), bootstrap_suite(), store_suite()]
}

pub fn validator_suite() -> TestSuite {
    TestSuite::new("validators")
        .test(TestEntry::new("valid fixtures are accepted", valid_fixtures_accepted))
        .test(TestEntry::new("missing required field is rejected", missing_required_rejected))
        .test(TestEntry::new("missing nested required field is rejected", missing_nested_required_rejected))
        .test(TestEntry::new("value outside enum is rejected", enum_violation_rejected))
        .test(TestEntry::new("players need is_guest", players_need_is_guest))
        .test(TestEntry::new("victory_conditions shape is free", victory_conditions_unconstrained))
        .test(TestEntry::new("long in int field is rejected", long_in_int_rejected))
        .test(TestEntry::new("null only where admitted", null_only_where_admitted))
        .test(TestEntry::new("invalid update is rejected", invalid_update_rejected))
}

pub fn index_suite() -> TestSuite {
    TestSuite::new("unique indexes")
        .test(TestEntry::new("duplicate user id is rejected", duplicate_user_rejected))
        .test(TestEntry::new("duplicate friendship pair is rejected", duplicate_friendship_rejected))
        .test(TestEntry::new("every unique key is enforced", every_unique_key_enforced))
        .test(TestEntry::new("update into a taken key is rejected", update_into_taken_key_rejected))
}

pub fn bootstrap_suite() -> TestSuite {
    TestSuite::new("bootstrap")
        .test(TestEntry::new("second bootstrap fails", second_bootstrap_fails))
        .test(TestEntry::new("if_not_exists skips existing", if_not_exists_skips))
}

pub fn store_suite() -> TestSuite {
    TestSuite::new("typed store")
        .test(TestEntry::new("records round-trip", records_round_trip))
        .test(TestEntry::new("profile requires user", profile_requires_user))
        .test(TestEntry::new("save clears omitted fields", save_clears_omitted_fields))
        .test(TestEntry::new("game results accumulate", game_results_accumulate))
        .test(TestEntry::new("friendships are looked up both ways", friendships_both_ways))
        .test(TestEntry::new("listing promotes to state", listing_promotes_to_state))
        .test(TestEntry::new("rejected promotion keeps listing", rejected_promotion_keeps_listing))
        .test(TestEntry::new("queries sort and limit", queries_sort_and_limit))
}

// ─── Validators ─────────────────────────────────────────────────────

fn valid_fixtures_accepted(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        for collection in h.schema.collection_names() {
            let doc = valid_document(collection).ok_or("no fixture")?;
            h.adapter.insert_one(collection, doc).await?;
            ensure(
                h.adapter.count(collection, doc! {}).await? == 1,
                format!("{collection}: fixture not stored"),
            )?;
        }
        TestResult::Ok(())
    })
}

fn missing_required_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        for collection in &h.schema.collections {
            for field in &collection.validator.required {
                let mut doc = valid_document(&collection.name).ok_or("no fixture")?;
                doc.remove(field);
                let result = h.adapter.insert_one(&collection.name, doc).await;
                expect_validation(result, field)?;
            }
            ensure(
                h.adapter.count(&collection.name, doc! {}).await? == 0,
                format!("{}: rejected document was stored", collection.name),
            )?;
        }
        TestResult::Ok(())
    })
}

fn missing_nested_required_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        for collection in ["game_infos", "game_states"] {
            let rules = h
                .schema
                .get(collection)
                .and_then(|c| c.validator.property("rules"))
                .and_then(|f| f.object.clone())
                .ok_or("rules schema missing")?;

            for field in &rules.required {
                let mut doc = valid_document(collection).ok_or("no fixture")?;
                doc.get_document_mut("rules")?.remove(field);
                let result = h.adapter.insert_one(collection, doc).await;
                expect_validation(result, &format!("rules.{field}"))?;
            }
        }
        TestResult::Ok(())
    })
}

fn enum_violation_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let mut checked = 0;
        for collection in &h.schema.collections {
            for (name, field) in &collection.validator.properties {
                if field.enum_values.is_none() {
                    continue;
                }
                let mut doc = valid_document(&collection.name).ok_or("no fixture")?;
                doc.insert(name.clone(), "Abandoned");
                let result = h.adapter.insert_one(&collection.name, doc).await;
                expect_validation(result, name)?;
                checked += 1;
            }
        }
        // user_friends, user_friend_requests, game_infos, game_states, game_invites
        ensure(checked == 5, format!("expected 5 enum fields, found {checked}"))
    })
}

fn players_need_is_guest(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let accepted = game_state_doc("host");
        h.adapter.insert_one("game_states", accepted).await?;

        let mut guest = player_doc("p2", true);
        guest.remove("is_guest");
        let mut rejected = game_state_doc("host");
        rejected.insert("players", vec![Bson::from(player_doc("p1", false)), Bson::from(guest)]);
        let result = h.adapter.insert_one("game_states", rejected).await;
        expect_validation(result, "players.1.is_guest")
    })
}

fn victory_conditions_unconstrained(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let shapes = [
            doc! {},
            doc! { "mode": "target", "target": 3 },
            doc! { "rounds": [1, 2, 3], "tiebreak": { "by": ["lives", "wins"], "sudden": true } },
        ];
        for shape in shapes {
            let mut doc = game_info_doc("host");
            doc.get_document_mut("rules")?.insert("victory_conditions", shape);
            h.adapter.insert_one("game_infos", doc).await?;
        }
        ensure(
            h.adapter.count("game_infos", doc! {}).await? == 3,
            "game_infos with free-form victory_conditions were not all stored",
        )
    })
}

fn long_in_int_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let mut doc = statistics_doc("u1");
        doc.insert("victories", 3_i64);
        expect_validation(h.adapter.insert_one("user_statistics", doc).await, "victories")?;

        let mut doc = statistics_doc("u1");
        doc.insert("win_rate", 1_i32);
        expect_validation(h.adapter.insert_one("user_statistics", doc).await, "win_rate")
    })
}

fn null_only_where_admitted(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let mut profile = profile_doc("u1");
        profile.insert("profile_picture", Bson::Null);
        h.adapter.insert_one("user_profiles", profile).await?;

        let mut user = user_doc();
        user.insert("username", Bson::Null);
        expect_validation(h.adapter.insert_one("users", user).await, "username")?;

        let mut profile = profile_doc("u2");
        profile.insert("bio", Bson::Null);
        expect_validation(h.adapter.insert_one("user_profiles", profile).await, "bio")
    })
}

fn invalid_update_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        h.adapter.insert_one("user_friends", friend_doc("a", "b")).await?;

        let result = h
            .adapter
            .update_one("user_friends", doc! { "user_id": "a" }, doc! { "status": "Maybe" })
            .await;
        expect_validation(result, "status")?;

        let stored = h
            .adapter
            .find_one("user_friends", doc! { "user_id": "a" })
            .await?
            .ok_or("edge disappeared")?;
        ensure(stored.get_str("status")? == "Accepted", "rejected update was applied")
    })
}

// ─── Unique indexes ─────────────────────────────────────────────────

fn duplicate_user_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let first = user_doc();
        let mut second = user_doc();
        second.insert("id", first.get_str("id")?);

        h.adapter.insert_one("users", first).await?;
        expect_duplicate(h.adapter.insert_one("users", second).await)?;
        ensure(h.adapter.count("users", doc! {}).await? == 1, "duplicate user stored")
    })
}

fn duplicate_friendship_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        h.adapter.insert_one("user_friends", friend_doc("a", "b")).await?;
        expect_duplicate(h.adapter.insert_one("user_friends", friend_doc("a", "b")).await)?;

        // Edges are directed: the reverse pair is a different key.
        h.adapter.insert_one("user_friends", friend_doc("b", "a")).await?;
        h.adapter.insert_one("user_friends", friend_doc("a", "c")).await?;
        ensure(
            h.adapter.count("user_friends", doc! {}).await? == 3,
            "expected three distinct edges",
        )
    })
}

fn every_unique_key_enforced(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        for collection in &h.schema.collections {
            for index in collection.unique_indexes() {
                let first = valid_document(&collection.name).ok_or("no fixture")?;
                let mut second = valid_document(&collection.name).ok_or("no fixture")?;
                for field in index.fields() {
                    let value = first.get(field).cloned().unwrap_or(Bson::Null);
                    second.insert(field, value);
                }

                h.adapter.insert_one(&collection.name, first).await?;
                let result = h.adapter.insert_one(&collection.name, second).await;
                if let Err(e) = expect_duplicate(result) {
                    return Err(format!("{} {}: {e}", collection.name, index.name()).into());
                }
            }
        }
        TestResult::Ok(())
    })
}

fn update_into_taken_key_rejected(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        h.adapter.insert_one("game_infos", game_info_doc("h1")).await?;
        let taken = game_info_doc("h2");
        let taken_id = taken.get_str("game_id")?.to_string();
        h.adapter.insert_one("game_infos", taken).await?;

        let result = h
            .adapter
            .update_one("game_infos", doc! { "host_id": "h1" }, doc! { "game_id": taken_id.as_str() })
            .await;
        expect_duplicate(result)?;
        ensure(
            h.adapter.count("game_infos", doc! { "game_id": taken_id.as_str() }).await? == 1,
            "game_id became shared",
        )
    })
}

// ─── Bootstrap ──────────────────────────────────────────────────────

fn second_bootstrap_fails(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let result = h.adapter.create_schema(&h.schema, &SchemaOptions::default()).await;
        match result {
            Err(BiscaError::CollectionExists(name)) => {
                ensure(name == "users", format!("expected `users` to clash first, got `{name}`"))
            }
            other => Err(format!("expected CollectionExists, got {other:?}").into()),
        }
    })
}

fn if_not_exists_skips(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let status = h
            .adapter
            .create_schema(&h.schema, &SchemaOptions { if_not_exists: true })
            .await?;
        ensure(status.created.is_empty(), format!("created {:?}", status.created))?;
        ensure(
            status.skipped.len() == h.schema.collections.len(),
            format!("skipped {:?}", status.skipped),
        )?;
        ensure(
            status.indexes == h.schema.index_count(),
            format!("ensured {} indexes", status.indexes),
        )
    })
}

// ─── Typed store ────────────────────────────────────────────────────

fn records_round_trip(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();

        let user = User::new("alice", "Alice@Example.com", "hash");
        store.insert(&user).await?;
        let found = store.find_by_key::<User>(&[user.id.as_str()]).await?;
        ensure(found.as_ref() == Some(&user), format!("user: {found:?}"))?;

        let host = PlayerEntry::registered(&user);
        let rules = GameRules {
            cards_per_player: Some(5),
            ..GameRules::default()
        };
        let info = GameInfo::new("table", &user.id, &user.username, rules).with_password_hash("h");
        let mut state = GameState::from_info(&info, vec![host.clone(), PlayerEntry::guest("bob")]);
        state.trump_card = Some(Card::new(Suit::Denari, Rank::Asso));
        state.player_hands.insert(host.player_id.clone(), vec![Card::new(Suit::Coppe, Rank::Tre)]);
        state.cards_played.push(PlayedCard {
            player_id: host.player_id.clone(),
            card: Card::new(Suit::Spade, Rank::Re),
        });
        state.current_turn = Some(host.player_id.clone());

        store.insert(&info).await?;
        store.insert(&state).await?;

        let found = store.find_by_key::<GameInfo>(&[info.game_id.as_str()]).await?;
        ensure(found.as_ref() == Some(&info), format!("game info: {found:?}"))?;
        let found = store.find_by_key::<GameState>(&[state.game_id.as_str()]).await?;
        ensure(found.as_ref() == Some(&state), format!("game state: {found:?}"))
    })
}

fn profile_requires_user(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();

        match store.create_profile(&UserProfile::new("ghost", "No", "One")).await {
            Err(BiscaError::UnknownUser(id)) => ensure(id == "ghost", id)?,
            other => return Err(format!("expected UnknownUser, got {other:?}").into()),
        }
        match store.create_statistics("ghost").await {
            Err(BiscaError::UnknownUser(_)) => {}
            other => return Err(format!("expected UnknownUser, got {other:?}").into()),
        }

        let user = User::new("carol", "carol@example.com", "hash");
        store.insert(&user).await?;
        store.create_profile(&UserProfile::new(&user.id, "Carol", "Bianchi")).await?;
        store.create_statistics(&user.id).await?;
        expect_duplicate(store.create_statistics(&user.id).await)
    })
}

fn save_clears_omitted_fields(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();
        let info = GameInfo::new("table", "h1", "host", GameRules::default());
        let mut state = GameState::from_info(&info, vec![PlayerEntry::guest("p1")]);
        state.current_turn = Some("p1".to_string());
        store.insert(&state).await?;

        state.current_turn = None;
        ensure(store.save(&state).await?, "save found no stored state")?;

        let stored = store
            .find_by_key::<GameState>(&[state.game_id.as_str()])
            .await?
            .ok_or("state missing after save")?;
        ensure(
            stored.current_turn.is_none(),
            format!("current_turn = {:?}", stored.current_turn),
        )?;
        let copies = h
            .adapter
            .count(GameState::COLLECTION, doc! { "game_id": state.game_id.as_str() })
            .await?;
        ensure(copies == 1, format!("{copies} stored copies"))?;

        let mut other = GameState::from_info(&info, Vec::new());
        other.game_id = "never-stored".to_string();
        ensure(!store.save(&other).await?, "save matched a missing state")
    })
}

fn game_results_accumulate(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();
        let user = User::new("dan", "dan@example.com", "hash");
        store.insert(&user).await?;

        store.record_game_result(&user.id, GameResult::Victory).await?;
        store.record_game_result(&user.id, GameResult::Defeat).await?;
        let stats = store.record_game_result(&user.id, GameResult::Victory).await?;

        let stored = store
            .find_by_key::<UserStatistics>(&[user.id.as_str()])
            .await?
            .ok_or("statistics missing")?;
        ensure(stored.total_games == 3, format!("total_games = {}", stored.total_games))?;
        ensure(stored.victories == 2, format!("victories = {}", stored.victories))?;
        ensure(stored == stats, "stored statistics differ from returned")?;

        match store.record_game_result("ghost", GameResult::Draw).await {
            Err(BiscaError::UnknownUser(_)) => TestResult::Ok(()),
            other => Err(format!("expected UnknownUser, got {other:?}").into()),
        }
    })
}

fn friendships_both_ways(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();
        store.insert(&UserFriend::new("a", "b", FriendshipStatus::Accepted)).await?;
        store.insert(&UserFriend::new("c", "a", FriendshipStatus::Accepted)).await?;
        store.insert(&UserFriend::new("a", "d", FriendshipStatus::Pending)).await?;
        store.insert(&UserFriend::new("e", "a", FriendshipStatus::Blocked)).await?;

        let edge = store.friendship_between("b", "a").await?.ok_or("edge b-a missing")?;
        ensure(edge.user_id == "a" && edge.friend_id == "b", "wrong edge returned")?;
        ensure(store.friendship_between("b", "c").await?.is_none(), "phantom edge b-c")?;

        let friends = store.friends_of("a").await?;
        ensure(friends == vec!["b", "c"], format!("friends of a: {friends:?}"))
    })
}

fn listing_promotes_to_state(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();
        let info = GameInfo::new("table", "h1", "host", GameRules::default());
        store.insert(&info).await?;

        let players = vec![PlayerEntry::guest("x"), PlayerEntry::guest("y")];
        let state = store.promote_to_game_state(&info.game_id, players).await?;
        ensure(state.game_id == info.game_id, "state has a new id")?;

        ensure(
            store.find_by_key::<GameInfo>(&[info.game_id.as_str()]).await?.is_none(),
            "listing still present",
        )?;
        let stored = store
            .find_by_key::<GameState>(&[info.game_id.as_str()])
            .await?
            .ok_or("state missing")?;
        ensure(stored.players.len() == 2, "players not stored")?;

        match store.promote_to_game_state(&info.game_id, Vec::new()).await {
            Err(BiscaError::UnknownGame(_)) => TestResult::Ok(()),
            other => Err(format!("expected UnknownGame, got {other:?}").into()),
        }
    })
}

fn rejected_promotion_keeps_listing(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();
        let info = GameInfo::new("table", "h1", "host", GameRules::default());
        store.insert(&info).await?;

        let mut squatter = game_state_doc("h9");
        squatter.insert("game_id", info.game_id.clone());
        h.adapter.insert_one(GameState::COLLECTION, squatter).await?;

        expect_duplicate(store.promote_to_game_state(&info.game_id, Vec::new()).await)?;
        ensure(
            store.find_by_key::<GameInfo>(&[info.game_id.as_str()]).await?.is_some(),
            "listing removed after a rejected promotion",
        )
    })
}

fn queries_sort_and_limit(h: &TestHelpers) -> TestFuture<'_> {
    Box::pin(async move {
        let store = h.store();

        for (name, wins, losses) in [("p", 1, 3), ("q", 3, 0), ("r", 2, 2)] {
            let mut stats = UserStatistics::new(name);
            for _ in 0..wins {
                stats.record(GameResult::Victory);
            }
            for _ in 0..losses {
                stats.record(GameResult::Defeat);
            }
            store.insert(&stats).await?;
        }
        let top: Vec<String> = store
            .leaderboard(2)
            .await?
            .into_iter()
            .map(|s| s.user_id)
            .collect();
        ensure(top == vec!["q", "r"], format!("leaderboard: {top:?}"))?;

        for name in ["one", "two", "three"] {
            store.insert(&GameInfo::new(name, "h", "host", GameRules::default())).await?;
        }
        let mut finished = GameInfo::new("done", "h", "host", GameRules::default());
        finished.game_status = GameStatus::Finished;
        store.insert(&finished).await?;

        let waiting = store.games_by_status(GameStatus::Waiting, 10).await?;
        ensure(waiting.len() == 3, format!("{} waiting games", waiting.len()))?;
        let done = store.games_by_status(GameStatus::Finished, 10).await?;
        ensure(
            done.len() == 1 && done[0].game_name == "done",
            format!("finished games: {done:?}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suites_are_populated() {
        let suites = all_suites();
        assert_eq!(suites.len(), 4);
        assert!(suites.iter().all(|s| s.test_count() > 0));
        let total: usize = suites.iter().map(|s| s.test_count()).sum();
        assert_eq!(total, 23);
    }
}
