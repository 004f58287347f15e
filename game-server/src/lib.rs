use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;
use warp::http::StatusCode;

use crate::auth::{AuthError, AuthService, require_admin};
use crate::game_manager::GameManager;
use game_core::local_date;
use game_persistence::StoreError;
use game_persistence::repositories::{ReportRepository, UserRepository, WordRepository};
use game_types::{
    ApiError, AuthenticatedUser, GameError, LoginRequest, RegisterRequest, StartGameResponse,
    SubmitGuessRequest,
};

pub mod auth;
pub mod config;
pub mod game_manager;
pub mod locks;

type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn create_routes(
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    word_repository: Arc<WordRepository>,
    report_repository: Arc<ReportRepository>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let game_manager_filter = warp::any().map({
        let game_manager = game_manager.clone();
        move || game_manager.clone()
    });

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    let user_repository_filter = warp::any().map({
        let user_repository = user_repository.clone();
        move || user_repository.clone()
    });

    let word_repository_filter = warp::any().map({
        let word_repository = word_repository.clone();
        move || word_repository.clone()
    });

    let report_repository_filter = warp::any().map({
        let report_repository = report_repository.clone();
        move || report_repository.clone()
    });

    let auth_header = warp::header::optional::<String>("authorization");

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<RegisterRequest>())
        .and(auth_filter.clone())
        .and_then(handle_register_request);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<LoginRequest>())
        .and(auth_filter.clone())
        .and_then(handle_login_request);

    let dashboard = warp::path("dashboard")
        .and(warp::path::end())
        .and(warp::get())
        .and(auth_header.clone())
        .and(game_manager_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_dashboard_request);

    let start_game = warp::path("games")
        .and(warp::path::end())
        .and(warp::post())
        .and(auth_header.clone())
        .and(game_manager_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_start_game_request);

    let game_view = warp::path!("games" / Uuid)
        .and(warp::get())
        .and(auth_header.clone())
        .and(game_manager_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_game_view_request);

    let submit_guess = warp::path!("games" / Uuid / "guesses")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<SubmitGuessRequest>())
        .and(auth_header.clone())
        .and(game_manager_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_submit_guess_request);

    let admin_report = warp::path!("admin" / "report")
        .and(warp::get())
        .and(auth_header.clone())
        .and(report_repository_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_admin_report_request);

    let admin_users = warp::path!("admin" / "users")
        .and(warp::get())
        .and(auth_header.clone())
        .and(user_repository_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_admin_users_request);

    let admin_user_games = warp::path!("admin" / "users" / Uuid / "games")
        .and(warp::get())
        .and(auth_header.clone())
        .and(report_repository_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_admin_user_games_request);

    let admin_words = warp::path!("admin" / "words")
        .and(warp::get())
        .and(auth_header)
        .and(word_repository_filter)
        .and(auth_filter)
        .and_then(handle_admin_words_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST"]);

    health
        .or(register)
        .or(login)
        .or(dashboard)
        .or(start_game)
        .or(game_view)
        .or(submit_guess)
        .or(admin_report)
        .or(admin_users)
        .or(admin_user_games)
        .or(admin_words)
        .with(cors)
        .with(warp::log("guessword"))
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn game_error_status(err: &GameError) -> StatusCode {
    match err {
        GameError::EmptyRepository => StatusCode::SERVICE_UNAVAILABLE,
        GameError::InvalidGuessFormat { .. } => StatusCode::BAD_REQUEST,
        GameError::GameAlreadyFinished { .. } => StatusCode::CONFLICT,
        GameError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        GameError::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

fn store_error_reply(err: StoreError) -> JsonReply {
    match err {
        StoreError::Game(game_error) => {
            let status = game_error_status(&game_error);
            json_reply(&ApiError::from(game_error), status)
        }
        StoreError::Conflict { .. } | StoreError::UsernameTaken(_) => {
            json_reply(&ApiError::message(err.to_string()), StatusCode::CONFLICT)
        }
        StoreError::Corrupt(_) | StoreError::Database(_) => {
            tracing::error!("Store failure: {}", err);
            json_reply(
                &ApiError::message("Internal server error"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

fn auth_error_reply(err: AuthError) -> JsonReply {
    let status = match err {
        AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::UsernameTaken(_) => StatusCode::CONFLICT,
        AuthError::InvalidUsername | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match err {
        AuthError::Internal(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };
    json_reply(&ApiError::message(message), status)
}

fn authorize(
    auth_service: &AuthService,
    auth_header: Option<&str>,
) -> Result<AuthenticatedUser, JsonReply> {
    auth_service.authenticate(auth_header).map_err(auth_error_reply)
}

fn authorize_admin(
    auth_service: &AuthService,
    auth_header: Option<&str>,
) -> Result<AuthenticatedUser, JsonReply> {
    let user = authorize(auth_service, auth_header)?;
    require_admin(&user).map_err(auth_error_reply)?;
    Ok(user)
}

async fn handle_register_request(
    request: RegisterRequest,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    match auth_service
        .register(request.username.trim(), &request.password)
        .await
    {
        Ok(user) => Ok(json_reply(&user, StatusCode::CREATED)),
        Err(err) => Ok(auth_error_reply(err)),
    }
}

async fn handle_login_request(
    request: LoginRequest,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    match auth_service
        .login(request.username.trim(), &request.password)
        .await
    {
        Ok(response) => Ok(json_reply(&response, StatusCode::OK)),
        Err(err) => Ok(auth_error_reply(err)),
    }
}

async fn handle_dashboard_request(
    auth_header: Option<String>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    let user = match authorize(&auth_service, auth_header.as_deref()) {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    match game_manager.dashboard(&user).await {
        Ok(dashboard) => Ok(json_reply(&dashboard, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_start_game_request(
    auth_header: Option<String>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    let user = match authorize(&auth_service, auth_header.as_deref()) {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    match game_manager.start_game(&user).await {
        Ok(game_id) => Ok(json_reply(
            &StartGameResponse { game_id },
            StatusCode::CREATED,
        )),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_game_view_request(
    game_id: Uuid,
    auth_header: Option<String>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    let user = match authorize(&auth_service, auth_header.as_deref()) {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    match game_manager.game_view(&user, game_id).await {
        Ok(view) => Ok(json_reply(&view, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_submit_guess_request(
    game_id: Uuid,
    request: SubmitGuessRequest,
    auth_header: Option<String>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    let user = match authorize(&auth_service, auth_header.as_deref()) {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    match game_manager
        .submit_guess(&user, game_id, &request.guess)
        .await
    {
        Ok(outcome) => Ok(json_reply(&outcome, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_admin_report_request(
    auth_header: Option<String>,
    report_repository: Arc<ReportRepository>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    if let Err(reply) = authorize_admin(&auth_service, auth_header.as_deref()) {
        return Ok(reply);
    }

    let today = local_date(chrono::Utc::now());
    match report_repository.daily_report(today).await {
        Ok(report) => Ok(json_reply(&report, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_admin_users_request(
    auth_header: Option<String>,
    user_repository: Arc<UserRepository>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    if let Err(reply) = authorize_admin(&auth_service, auth_header.as_deref()) {
        return Ok(reply);
    }

    match user_repository.list_players().await {
        Ok(users) => Ok(json_reply(&users, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_admin_user_games_request(
    user_id: Uuid,
    auth_header: Option<String>,
    report_repository: Arc<ReportRepository>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    if let Err(reply) = authorize_admin(&auth_service, auth_header.as_deref()) {
        return Ok(reply);
    }

    match report_repository.user_report(user_id).await {
        Ok(report) => Ok(json_reply(&report, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}

async fn handle_admin_words_request(
    auth_header: Option<String>,
    word_repository: Arc<WordRepository>,
    auth_service: Arc<AuthService>,
) -> Result<JsonReply, warp::Rejection> {
    if let Err(reply) = authorize_admin(&auth_service, auth_header.as_deref()) {
        return Ok(reply);
    }

    match word_repository.list_all().await {
        Ok(words) => Ok(json_reply(&words, StatusCode::OK)),
        Err(err) => Ok(store_error_reply(err)),
    }
}
