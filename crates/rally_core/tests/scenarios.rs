//! End-to-end game flows against the in-memory stores.

use chrono::{Duration, Utc};
use rally_core::{
    distance_meters, Clock, Coordinates, GameRules, GeoError, ManualClock,
    MemoryIdentityResolver, MemoryPositionStore, MemoryPostStore, PositionStore,
    PositionUpdate, Post, PostStore, ProximityEngine, Task,
};
use std::sync::Arc;

const INSIDE_METERS: f64 = 99.0;
const OUTSIDE_METERS: f64 = 100.5;

struct Game {
    engine: ProximityEngine,
    clock: Arc<ManualClock>,
    positions: Arc<MemoryPositionStore>,
    posts: Arc<MemoryPostStore>,
}

fn origin() -> Coordinates {
    Coordinates::new(12.48, 55.77).unwrap()
}

fn game() -> Game {
    let identities = MemoryIdentityResolver::new();
    for i in 1..=3 {
        identities.add_user(format!("team{i}"), format!("Team{i}"), format!("pw{i}"));
    }

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let positions = Arc::new(MemoryPositionStore::default());
    let posts = Arc::new(MemoryPostStore::new());
    let engine = ProximityEngine::new(
        positions.clone(),
        posts.clone(),
        Arc::new(identities),
        clock.clone(),
        GameRules::default(),
    );

    Game {
        engine,
        clock,
        positions,
        posts,
    }
}

/// Places team2 just inside and team3 just outside 100m north of team1.
async fn three_teams() -> Game {
    let game = game();
    game.engine
        .report_and_find_nearby("team2", "pw2", origin().offset_north(INSIDE_METERS), 1.0)
        .await
        .unwrap();
    game.engine
        .report_and_find_nearby("team3", "pw3", origin().offset_north(OUTSIDE_METERS), 1.0)
        .await
        .unwrap();
    game
}

fn identities(players: &[rally_core::NearbyPlayer]) -> Vec<&str> {
    players.iter().map(|p| p.identity.as_str()).collect()
}

#[tokio::test]
async fn scenario_a_radius_100_finds_only_inside_team() {
    let game = three_teams().await;
    let players = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 100.0)
        .await
        .unwrap();

    assert_eq!(identities(&players), vec!["team2"]);
    assert_eq!(players[0].display_name.as_deref(), Some("Team2"));
    assert_eq!(players[0].longitude, 12.48);
}

#[tokio::test]
async fn scenario_b_radius_101_orders_nearest_first() {
    let game = three_teams().await;
    let players = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 101.0)
        .await
        .unwrap();

    assert_eq!(identities(&players), vec!["team2", "team3"]);
}

#[tokio::test]
async fn scenario_c_radius_98_finds_nobody() {
    let game = three_teams().await;
    let players = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 98.0)
        .await
        .unwrap();

    assert!(players.is_empty());
}

#[tokio::test]
async fn scenario_d_wrong_credential_is_unauthorized() {
    let game = three_teams().await;
    let result = game
        .engine
        .report_and_find_nearby("team1", "pw2", origin(), 1000.0)
        .await;

    assert_eq!(result.unwrap_err(), GeoError::Unauthorized);
    assert!(game.positions.get("team1", game.clock.now()).await.unwrap().is_none());
}

#[tokio::test]
async fn scenario_e_post_reached_only_up_close() {
    let game = game();
    game.engine
        .create_post(Post {
            id: "post1".to_string(),
            coordinates: origin(),
            task: Task {
                text: "2+5".to_string(),
                is_url: false,
            },
            solution: "7".to_string(),
        })
        .await
        .unwrap();

    let task = game
        .engine
        .check_post_reachability("post1", origin())
        .await
        .unwrap();
    assert_eq!(task.task_text, "2+5");

    let far = Coordinates::new(12.0, 55.0).unwrap();
    match game.engine.check_post_reachability("post1", far).await {
        Err(GeoError::NotReached { distance_meters, .. }) => {
            assert!(distance_meters > 10_000.0);
        }
        other => panic!("expected NotReached, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicate_post_is_already_exists() {
    let game = game();
    let post = Post {
        id: "post1".to_string(),
        coordinates: origin(),
        task: Task {
            text: "riddle".to_string(),
            is_url: false,
        },
        solution: "answer".to_string(),
    };

    game.engine.create_post(post.clone()).await.unwrap();
    let err = game.engine.create_post(post).await.unwrap_err();
    assert_eq!(err.kind(), "already_exists");
    assert_eq!(game.posts.len().await.unwrap(), 1);
}

#[tokio::test]
async fn repeated_reports_keep_one_record_with_last_values() {
    let game = game();
    for step in 0..10 {
        game.clock.advance(Duration::seconds(1));
        game.engine
            .report_and_find_nearby("team1", "pw1", origin().offset_north(step as f64 * 7.0), 10.0)
            .await
            .unwrap();
    }
    let last = origin().offset_north(63.0);

    assert_eq!(game.positions.len().await.unwrap(), 1);
    let stored = game
        .positions
        .get("team1", game.clock.now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.coordinates, last);
    assert_eq!(stored.last_updated, game.clock.now());
    assert_eq!(stored.display_name.as_deref(), Some("Team1"));
}

#[tokio::test]
async fn stale_positions_disappear_after_thirty_seconds() {
    let game = three_teams().await;

    game.clock.advance(Duration::seconds(29));
    let players = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 101.0)
        .await
        .unwrap();
    assert_eq!(players.len(), 2);

    game.clock.advance(Duration::seconds(1));
    let players = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 101.0)
        .await
        .unwrap();
    assert!(players.is_empty());
}

#[tokio::test]
async fn position_only_report_after_expiry_starts_a_fresh_record() {
    let game = game();
    game.engine
        .report_and_find_nearby("team1", "pw1", origin(), 10.0)
        .await
        .unwrap();

    game.clock.advance(Duration::seconds(120));
    assert!(game
        .positions
        .get("team1", game.clock.now())
        .await
        .unwrap()
        .is_none());

    // Same answer whether or not the sweeper already removed the record
    let unswept = game
        .engine
        .report_position_only("team1", origin())
        .await
        .unwrap();
    assert_eq!(unswept.display_name, None);

    game.clock.advance(Duration::seconds(120));
    game.positions.evict_stale(game.clock.now()).await.unwrap();
    let swept = game
        .engine
        .report_position_only("team1", origin())
        .await
        .unwrap();
    assert_eq!(swept.display_name, unswept.display_name);
}

#[tokio::test]
async fn radius_queries_are_idempotent_and_complete() {
    let game = game();
    let now = game.clock.now();
    let center = origin();

    for i in 0..40 {
        let coordinates = Coordinates::new(12.48 + (i as f64) * 0.0004, 55.77 - (i as f64) * 0.0003)
            .unwrap();
        game.positions
            .upsert(
                PositionUpdate {
                    identity: format!("p{i}"),
                    display_name: None,
                    coordinates,
                },
                now,
            )
            .await
            .unwrap();
    }

    let first = game
        .positions
        .find_within_radius(&center, 500.0, "p0", now)
        .await
        .unwrap();
    let second = game
        .positions
        .find_within_radius(&center, 500.0, "p0", now)
        .await
        .unwrap();
    assert_eq!(first, second);

    for i in 1..40 {
        let identity = format!("p{i}");
        let stored = game.positions.get(&identity, now).await.unwrap().unwrap();
        let inside = distance_meters(&center, &stored.coordinates) <= 500.0;
        let listed = first.iter().any(|p| p.identity == identity);
        assert_eq!(inside, listed, "{identity} listed={listed} inside={inside}");
    }
    assert!(first.iter().all(|p| p.identity != "p0"));
}

#[tokio::test]
async fn closed_store_surfaces_unavailable() {
    let game = game();
    game.positions.close().await;

    let err = game
        .engine
        .report_and_find_nearby("team1", "pw1", origin(), 10.0)
        .await
        .unwrap_err();
    assert!(matches!(err, GeoError::Unavailable(_)));

    let err = game
        .engine
        .report_position_only("team1", origin())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 503);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reports_for_one_identity_leave_one_record() {
    let game = Arc::new(game());
    let mut handles = Vec::new();

    for i in 0..16 {
        let game = Arc::clone(&game);
        handles.push(tokio::spawn(async move {
            game.engine
                .report_position_only("team1", origin().offset_north(i as f64))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(game.positions.len().await.unwrap(), 1);
}
