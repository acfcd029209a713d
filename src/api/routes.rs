//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Game, GameEntry, GameStatus, GameType, User, UserPurse};
use crate::domain::{GameEntryViolation, GameId, Money, OperationContext, UserId};
use crate::entry_fee::EntryFee;
use crate::error::{AppError, AppResult};
use crate::orchestrator::{
    CreateGameCommand, CreateUserCommand, UpdateGameStatusCommand, UpdateUserCommand,
};
use crate::store::{game_not_found, StoreError};

use super::middleware::REQUEST_USER_HEADER;
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_string(),
            username: user.username().to_string(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: GameId,
    pub game_type: GameType,
    pub status: GameStatus,
    pub buy_in: Money,
    pub max: Money,
    pub min: Money,
    pub start: DateTime<Utc>,
    pub players: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Game> for GameResponse {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id(),
            game_type: game.game_type(),
            status: game.status(),
            buy_in: game.buy_in().clone(),
            max: game.max().clone(),
            min: game.min().clone(),
            start: game.start(),
            players: game.players(),
            created_at: game.created_at(),
            updated_at: game.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameDetailResponse {
    #[serde(flatten)]
    pub game: GameResponse,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub game_id: GameId,
    pub user_id: UserId,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<GameEntryViolation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub game_id: GameId,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub game_id: GameId,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct BankBalanceResponse {
    pub balance: Money,
}

// =========================================================================
// Path parsing
// =========================================================================

/// An unparsable user id cannot name an existing user
fn parse_user_id(raw: &str) -> AppResult<UserId> {
    raw.parse()
        .map_err(|_| StoreError::not_found("User", "ID", raw).into())
}

/// An unparsable game id cannot name an existing game
fn parse_game_id(raw: &str) -> AppResult<GameId> {
    raw.parse().map_err(|_| game_not_found(raw).into())
}

/// The acting user named by the request context
fn request_user(context: &OperationContext) -> AppResult<UserId> {
    context
        .request_user_id
        .ok_or_else(|| AppError::MissingHeader(REQUEST_USER_HEADER.to_string()))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:user_id/purse", get(get_purse))
        .route("/users/:user_id/purse/credit", post(credit_purse))
        .route("/users/:user_id/purse/debit", post(debit_purse))
        .route("/auth/verify", post(verify_user))
        // Games
        .route("/games", post(create_game).get(list_games))
        .route("/games/:game_id", get(get_game))
        .route("/games/:game_id/status", patch(update_game_status))
        .route("/games/:game_id/eligibility", get(get_eligibility))
        .route("/games/:game_id/entries", post(enter_game))
        .route("/games/:game_id/users", get(get_game_users))
        .route("/games/:game_id/fees", get(get_game_fees))
        // Admin bank
        .route("/admin/bank/deposits", post(deposit))
        .route("/admin/bank/balance", get(get_bank_balance))
}

// =========================================================================
// Users
// =========================================================================

/// Register a user with an empty purse
async fn create_user(
    State(state): State<AppState>,
    Json(command): Json<CreateUserCommand>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state
        .users
        .register(command, &state.default_currency)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.get_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_user_by_id(parse_user_id(&user_id)?).await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(command): Json<UpdateUserCommand>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .update_user(parse_user_id(&user_id)?, command)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.delete_user(parse_user_id(&user_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_purse(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPurse>, AppError> {
    let purse = state
        .purses
        .get_user_purse(parse_user_id(&user_id)?)
        .await?;
    Ok(Json(purse))
}

async fn credit_purse(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<UserPurse>, AppError> {
    let purse = state
        .purses
        .credit(parse_user_id(&user_id)?, &request.amount)
        .await?;
    Ok(Json(purse))
}

async fn debit_purse(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<UserPurse>, AppError> {
    let purse = state
        .purses
        .debit(parse_user_id(&user_id)?, &request.amount)
        .await?;
    Ok(Json(purse))
}

/// Check an email and password pair
async fn verify_user(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .verify_user(&request.email, &request.password)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

// =========================================================================
// Games
// =========================================================================

async fn create_game(
    State(state): State<AppState>,
    Json(command): Json<CreateGameCommand>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let game = state.games.schedule(command).await?;
    Ok((StatusCode::CREATED, Json(GameResponse::from(&game))))
}

async fn list_games(State(state): State<AppState>) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = state.games.get_games().await?;
    Ok(Json(games.iter().map(GameResponse::from).collect()))
}

/// A game together with the users entered in it
async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetailResponse>, AppError> {
    let game = state.games.get_game(parse_game_id(&game_id)?).await?;
    let users = state.entries.get_users_for_game(game.id()).await?;

    Ok(Json(GameDetailResponse {
        game: GameResponse::from(&game),
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

async fn update_game_status(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(command): Json<UpdateGameStatusCommand>,
) -> Result<Json<GameResponse>, AppError> {
    let game = state
        .games
        .update_game_status(parse_game_id(&game_id)?, command.status)
        .await?;
    Ok(Json(GameResponse::from(&game)))
}

/// Whether the acting user may enter the game, without entering it
async fn get_eligibility(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<String>,
) -> Result<Json<EligibilityResponse>, AppError> {
    let user_id = request_user(&context)?;
    let game = state.games.get_game(parse_game_id(&game_id)?).await?;

    let violation = state.entries.entry_eligibility(&game, user_id).await?;

    Ok(Json(EligibilityResponse {
        game_id: game.id(),
        user_id,
        eligible: violation.is_none(),
        reason: violation,
        message: violation.map(|v| v.to_string()),
    }))
}

/// Enter the acting user into the game
async fn enter_game(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<String>,
) -> Result<(StatusCode, Json<GameEntry>), AppError> {
    let user_id = request_user(&context)?;
    let game = state.games.get_game(parse_game_id(&game_id)?).await?;
    let user = state.users.get_user_by_id(user_id).await?;

    let entry = state.entries.enter_game(&game, &user).await?;

    tracing::info!(
        game_id = %game.id(),
        user_id = %user_id,
        correlation_id = ?context.correlation_id,
        "Game entry accepted"
    );

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_game_users(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .entries
        .get_users_for_game(parse_game_id(&game_id)?)
        .await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Buy-ins charged for a game, in entry order
async fn get_game_fees(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<EntryFee>>, AppError> {
    let game = state.games.get_game(parse_game_id(&game_id)?).await?;
    let fees = state.entries.get_entry_fees(game.id()).await?;
    Ok(Json(fees))
}

// =========================================================================
// Admin bank
// =========================================================================

async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<DepositRequest>,
) -> Result<(StatusCode, Json<DepositResponse>), AppError> {
    state.bank.deposit(request.game_id, &request.amount).await?;

    Ok((
        StatusCode::CREATED,
        Json(DepositResponse {
            game_id: request.game_id,
            amount: request.amount,
        }),
    ))
}

async fn get_bank_balance(
    State(state): State<AppState>,
) -> Result<Json<BankBalanceResponse>, AppError> {
    let balance = state.bank.get_balance().await?;
    Ok(Json(BankBalanceResponse { balance }))
}
