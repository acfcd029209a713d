//! Postgres-backed integration tests.
//!
//! Require DATABASE_URL pointing at a database with `migrations/` applied:
//! `cargo test -- --ignored`

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use chrono::Duration;
use serde_json::json;
use tokio::sync::Mutex;

use game_platform::aggregate::{Aggregate, User, UserPurse};
use game_platform::api::{build_router, AppState, Ledgers};
use game_platform::bank::{Bank, BankError, PgBank};
use game_platform::clock::FixedClock;
use game_platform::domain::password::MIN_COST;
use game_platform::domain::{DomainError, GameId, PasswordHash, UserId};
use game_platform::entry_fee::{EntryFeeError, EntryFeeStore, PgEntryFeeStore};
use game_platform::orchestrator::PurseOrchestrator;
use game_platform::store::{PgStore, PurseReader, PurseWriter, StoreError, UserWriter};
use game_platform::{AppError, Currency, Money};

use common::{
    create_game, create_user, fund_user, send, setup_test_db, test_config, test_now,
};

/// Every test truncates the same tables
static DB_LOCK: Mutex<()> = Mutex::const_new(());

async fn pg_app() -> (Router, sqlx::PgPool) {
    let pool = setup_test_db().await;
    let clock = Arc::new(FixedClock::new(test_now()));
    let state = AppState::with_store(
        Arc::new(PgStore::new(pool.clone())),
        Ledgers {
            bank: Arc::new(PgBank::new(pool.clone(), Currency::new("FAKE").unwrap())),
            fees: Arc::new(PgEntryFeeStore::new(pool.clone())),
        },
        clock,
        &test_config(),
    );
    (build_router(state), pool)
}

#[tokio::test]
#[ignore]
async fn test_pg_user_lifecycle() {
    let _guard = DB_LOCK.lock().await;
    let (app, _pool) = pg_app().await;

    let user_id = create_user(&app, "ada@example.com", "ada").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/users/{}/purse", user_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], json!({ "amount": 0, "currency": "GBP" }));

    // Unique constraint on email surfaces as a creation conflict
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/users",
        None,
        Some(json!({
            "email": "ada@example.com",
            "username": "other",
            "password": "hunter22"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "user_creation");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/users/{}", user_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/users/{}/purse", user_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_pg_entries_keep_insertion_order() {
    let _guard = DB_LOCK.lock().await;
    let (app, _pool) = pg_app().await;
    let game_id = create_game(&app, test_now() + Duration::days(1), 3).await;
    let entries = format!("/api/v1/games/{}/entries", game_id);

    let mut expected = Vec::new();
    for name in ["carol", "alice", "bob"] {
        let user_id = create_user(&app, &format!("{}@example.com", name), name).await;
        fund_user(&app, &user_id, 500).await;
        let (status, _) = send(&app, "POST", &entries, Some(&user_id), None).await;
        assert_eq!(status, StatusCode::CREATED);
        expected.push(user_id);
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/games/{}/users", game_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
#[ignore]
async fn test_pg_concurrent_entries_respect_capacity() {
    let _guard = DB_LOCK.lock().await;
    let (app, _pool) = pg_app().await;
    let game_id = create_game(&app, test_now() + Duration::days(1), 2).await;

    let mut users = Vec::new();
    for i in 0..6 {
        let user_id =
            create_user(&app, &format!("user{}@example.com", i), &format!("user{}", i)).await;
        fund_user(&app, &user_id, 500).await;
        users.push(user_id);
    }

    let handles: Vec<_> = users
        .clone()
        .into_iter()
        .map(|user_id| {
            let app = app.clone();
            let uri = format!("/api/v1/games/{}/entries", game_id);
            tokio::spawn(async move { send(&app, "POST", &uri, Some(&user_id), None).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => accepted += 1,
            StatusCode::UNPROCESSABLE_ENTITY => {
                assert_eq!(body["error_code"], "game_full_capacity")
            }
            other => panic!("Unexpected status {other}: {body}"),
        }
    }
    assert_eq!(accepted, 2);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/games/{}/users", game_id),
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Refused players got their buy-in back
    let mut refunded = 0;
    for user_id in &users {
        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/v1/users/{}/purse", user_id),
            None,
            None,
        )
        .await;
        if body["balance"]["amount"] == 500 {
            refunded += 1;
        }
    }
    assert_eq!(refunded, 4);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/games/{}/fees", game_id),
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

async fn pg_user_with_purse(store: &PgStore, name: &str, balance: i64) -> UserId {
    let user = User::new(
        UserId::new(),
        format!("{}@example.com", name),
        name,
        PasswordHash::with_cost("hunter22", MIN_COST).unwrap(),
    );
    let user = UserWriter::insert(store, &user).await.unwrap();
    let gbp = Currency::new("GBP").unwrap();
    PurseWriter::insert(store, &UserPurse::new(user.id(), Money::new(balance, gbp)))
        .await
        .unwrap();
    user.id()
}

#[tokio::test]
#[ignore]
async fn test_pg_concurrent_balance_changes_all_land() {
    let _guard = DB_LOCK.lock().await;
    let pool = setup_test_db().await;
    let store = Arc::new(PgStore::new(pool));
    let user_id = pg_user_with_purse(&store, "ada", 1000).await;
    let gbp = Currency::new("GBP").unwrap();

    // Two orchestrators stand in for two server processes
    let purses = [
        Arc::new(PurseOrchestrator::new(store.clone(), store.clone())),
        Arc::new(PurseOrchestrator::new(store.clone(), store.clone())),
    ];

    let handles: Vec<_> = (0..40)
        .map(|i| {
            let purses = purses[i % 2].clone();
            let gbp = gbp.clone();
            tokio::spawn(async move {
                if i % 4 < 2 {
                    purses.credit(user_id, &Money::new(30, gbp)).await
                } else {
                    purses.debit(user_id, &Money::new(10, gbp)).await
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 1000 + 20 * 30 - 20 * 10
    let purse = PurseReader::get(store.as_ref(), user_id).await.unwrap();
    assert_eq!(purse.balance(), &Money::new(1400, gbp));
}

#[tokio::test]
#[ignore]
async fn test_pg_debits_never_overdraw() {
    let _guard = DB_LOCK.lock().await;
    let pool = setup_test_db().await;
    let store = Arc::new(PgStore::new(pool));
    let user_id = pg_user_with_purse(&store, "ada", 100).await;
    let gbp = Currency::new("GBP").unwrap();
    let purses = Arc::new(PurseOrchestrator::new(store.clone(), store.clone()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let purses = purses.clone();
            let gbp = gbp.clone();
            tokio::spawn(async move { purses.debit(user_id, &Money::new(30, gbp)).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(matches!(
                err,
                AppError::Domain(DomainError::InsufficientFunds { required: 30, .. })
            )),
        }
    }
    assert_eq!(accepted, 3);

    let purse = PurseReader::get(store.as_ref(), user_id).await.unwrap();
    assert_eq!(purse.balance(), &Money::new(10, gbp.clone()));

    let eur = Money::new(-1, Currency::new("EUR").unwrap());
    let err = store.apply_delta(user_id, &eur).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected(DomainError::Money(_))));
}

#[tokio::test]
#[ignore]
async fn test_pg_entry_fee_recorded_once() {
    let _guard = DB_LOCK.lock().await;
    let pool = setup_test_db().await;
    let fees = PgEntryFeeStore::new(pool);
    let gbp = Currency::new("GBP").unwrap();

    let game_id = GameId::new();
    let (first, second) = (UserId::new(), UserId::new());
    fees.record(game_id, first, &Money::new(500, gbp.clone()))
        .await
        .unwrap();
    fees.record(game_id, second, &Money::new(500, gbp.clone()))
        .await
        .unwrap();

    let err = fees
        .record(game_id, first, &Money::new(1, gbp.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, EntryFeeError::DuplicateRecord { .. }));

    let listed: Vec<UserId> = fees
        .fees_for_game(game_id)
        .await
        .unwrap()
        .iter()
        .map(|f| f.user_id)
        .collect();
    assert_eq!(listed, vec![first, second]);

    fees.remove(game_id, first).await.unwrap();
    assert_eq!(fees.fees_for_game(game_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_pg_bank_rejects_second_deposit() {
    let _guard = DB_LOCK.lock().await;
    let pool = setup_test_db().await;
    let fake = Currency::new("FAKE").unwrap();
    let bank = PgBank::new(pool, fake.clone());

    let game_id = GameId::new();
    bank.deposit(game_id, &Money::new(500, fake.clone()))
        .await
        .unwrap();
    bank.deposit(GameId::new(), &Money::new(250, fake.clone()))
        .await
        .unwrap();

    let err = bank
        .deposit(game_id, &Money::new(1, fake.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, BankError::DuplicateRecord(id) if id == game_id));

    let balance = bank.get_balance().await.unwrap();
    assert_eq!(balance, Money::new(750, fake));
}
