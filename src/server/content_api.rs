//! Routes of the user-service: profiles, sets, cards, study modes and results

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ApiError, MessageBody};
use super::extract::AuthUser;
use crate::auth::TokenIssuer;
use crate::flashcards::generator::{generate_quiz, generate_test, match_pairs};
use crate::flashcards::{
    ContentStorage, Flashcard, FlashcardSet, GeneratedQuestion, MatchPair, NewFlashcard,
    NewStudySession, Profile, QuizQuestion, RandomSource, SessionHistoryEntry, StudyMode,
    StudySession, ThreadRandom,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Shared state of the user-service
#[derive(Clone)]
pub struct ContentState {
    pub storage: Arc<Mutex<ContentStorage>>,
    pub tokens: TokenIssuer,
    pub random: Arc<Mutex<Box<dyn RandomSource + Send>>>,
}

impl ContentState {
    pub fn new(storage: ContentStorage, tokens: TokenIssuer) -> Self {
        Self::with_random(storage, tokens, Box::new(ThreadRandom))
    }

    pub fn with_random(
        storage: ContentStorage,
        tokens: TokenIssuer,
        random: Box<dyn RandomSource + Send>,
    ) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            tokens,
            random: Arc::new(Mutex::new(random)),
        }
    }

    fn storage(&self) -> Result<MutexGuard<'_, ContentStorage>, ApiError> {
        self.storage
            .lock()
            .map_err(|e| ApiError::internal("Storage unavailable", e))
    }

    fn random(&self) -> Result<MutexGuard<'_, Box<dyn RandomSource + Send>>, ApiError> {
        self.random
            .lock()
            .map_err(|e| ApiError::internal("Random source unavailable", e))
    }
}

impl FromRef<ContentState> for TokenIssuer {
    fn from_ref(state: &ContentState) -> Self {
        state.tokens.clone()
    }
}

pub fn router(state: ContentState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).post(upsert_profile))
        .route("/flashcard-sets", get(list_sets))
        .route("/flashcard-set", post(create_set))
        .route("/flashcard-set/{id}", delete(delete_set))
        .route("/flashcards/bulk", post(bulk_create_cards))
        .route("/flashcards/{set_id}", get(list_cards))
        .route("/flashcard", post(create_card))
        .route("/flashcard/{id}", put(update_card).delete(delete_card))
        .route("/flashcard-mode/{set_id}", get(flashcard_mode))
        .route("/match-mode/{set_id}", get(match_mode))
        .route("/quiz/{set_id}", get(quiz))
        .route("/test-mode/{set_id}", get(test_mode))
        .route("/study-result", post(save_study_result))
        .route("/study-history", get(study_history))
        .with_state(state)
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation(format!("Invalid {} ID", what)))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ==================== Profiles ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest {
    user_id: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

async fn upsert_profile(
    State(state): State<ContentState>,
    user: AuthUser,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<Profile> {
    let Json(body) = payload?;
    let (Some(user_id), Some(email)) = (required(body.user_id), required(body.email)) else {
        return Err(ApiError::validation("Missing required fields"));
    };
    let user_id = parse_id(&user_id, "user")?;
    if user_id != user.user_id {
        return Err(ApiError::Unauthorized("Token does not match userId".to_string()));
    }

    state
        .storage()?
        .upsert_profile(user_id, body.name.as_deref(), &email)
        .map(Json)
        .map_err(|e| ApiError::content(e, "Failed to create or update profile"))
}

async fn get_profile(State(state): State<ContentState>, user: AuthUser) -> ApiResult<Profile> {
    state
        .storage()?
        .get_profile(user.user_id)
        .map_err(|e| ApiError::content(e, "Failed to fetch profile"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

// ==================== Sets ====================

async fn list_sets(State(state): State<ContentState>, user: AuthUser) -> ApiResult<Vec<FlashcardSet>> {
    state
        .storage()?
        .list_sets(user.user_id)
        .map(Json)
        .map_err(|e| ApiError::content(e, "Failed to fetch flashcard sets"))
}

#[derive(Debug, Deserialize)]
struct CreateSetRequest {
    title: Option<String>,
}

async fn create_set(
    State(state): State<ContentState>,
    user: AuthUser,
    payload: Result<Json<CreateSetRequest>, JsonRejection>,
) -> ApiResult<FlashcardSet> {
    let Json(body) = payload?;
    let title = required(body.title).ok_or_else(|| ApiError::validation("Title is required"))?;

    state
        .storage()?
        .create_set(user.user_id, title)
        .map(Json)
        .map_err(|e| ApiError::content(e, "Failed to create flashcard set"))
}

async fn delete_set(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<MessageBody> {
    let set_id = parse_id(&id, "set")?;
    state
        .storage()?
        .delete_set(user.user_id, set_id)
        .map_err(|e| ApiError::content(e, "Failed to delete flashcard set"))?;
    Ok(MessageBody::new("Flashcard set and related data deleted"))
}

// ==================== Cards ====================

/// Cards of an owned set; an empty set is reported as not found
fn pool(state: &ContentState, user: &AuthUser, raw_set_id: &str, context: &str) -> Result<Vec<Flashcard>, ApiError> {
    let set_id = parse_id(raw_set_id, "set")?;
    let cards = state
        .storage()?
        .list_cards(user.user_id, set_id)
        .map_err(|e| ApiError::content(e, context))?;
    if cards.is_empty() {
        log::info!("No flashcards found for setId: {}", set_id);
        return Err(ApiError::not_found("No flashcards found"));
    }
    Ok(cards)
}

async fn list_cards(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Vec<Flashcard>> {
    match pool(&state, &user, &set_id, "Failed to fetch flashcards") {
        Err(ApiError::NotFound(_)) => Err(ApiError::not_found("No flashcards found for this set")),
        other => other.map(Json),
    }
}

async fn create_card(
    State(state): State<ContentState>,
    user: AuthUser,
    payload: Result<Json<NewFlashcard>, JsonRejection>,
) -> ApiResult<Flashcard> {
    let Json(body) = payload?;
    let (Some(front), Some(back), Some(set_id)) =
        (required(Some(body.front)), required(Some(body.back)), body.set_id)
    else {
        return Err(ApiError::validation("Missing required fields"));
    };

    state
        .storage()?
        .create_card(user.user_id, set_id, front, back)
        .map(Json)
        .map_err(|e| ApiError::content(e, "Failed to create flashcard"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCardRequest {
    front: Option<String>,
    back: Option<String>,
    is_memorized: Option<bool>,
}

#[derive(Debug, Serialize)]
struct UpdateCardResponse {
    message: String,
    flashcard: Flashcard,
}

async fn update_card(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCardRequest>, JsonRejection>,
) -> ApiResult<UpdateCardResponse> {
    let card_id = parse_id(&id, "flashcard")?;
    let Json(body) = payload?;
    let (Some(front), Some(back)) = (required(body.front), required(body.back)) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let flashcard = state
        .storage()?
        .update_card(user.user_id, card_id, front, back, body.is_memorized)
        .map_err(|e| ApiError::content(e, "Failed to update flashcard"))?;

    Ok(Json(UpdateCardResponse {
        message: "Flashcard updated".to_string(),
        flashcard,
    }))
}

async fn delete_card(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<MessageBody> {
    let card_id = parse_id(&id, "flashcard")?;
    state
        .storage()?
        .delete_card(user.user_id, card_id)
        .map_err(|e| ApiError::content(e, "Failed to delete flashcard"))?;
    Ok(MessageBody::new("Flashcard deleted"))
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    #[serde(default)]
    flashcards: Vec<NewFlashcard>,
}

#[derive(Debug, Serialize)]
struct BulkResponse {
    message: String,
    flashcards: Vec<Flashcard>,
}

async fn bulk_create_cards(
    State(state): State<ContentState>,
    user: AuthUser,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<BulkResponse> {
    let Json(body) = payload?;
    if body.flashcards.is_empty() {
        return Err(ApiError::validation("No flashcards provided"));
    }

    let mut rows = Vec::with_capacity(body.flashcards.len());
    for card in body.flashcards {
        match (required(Some(card.front)), required(Some(card.back)), card.set_id) {
            (Some(front), Some(back), Some(set_id)) => rows.push((set_id, front, back)),
            _ => return Err(ApiError::validation("Missing required fields")),
        }
    }

    let flashcards = state
        .storage()?
        .create_cards(user.user_id, &rows)
        .map_err(|e| ApiError::content(e, "Failed to import flashcards"))?;

    Ok(Json(BulkResponse {
        message: "Flashcards imported successfully".to_string(),
        flashcards,
    }))
}

// ==================== Study Modes ====================

async fn flashcard_mode(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Vec<Flashcard>> {
    pool(&state, &user, &set_id, "Failed to fetch flashcards").map(Json)
}

async fn match_mode(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Vec<MatchPair>> {
    let cards = pool(&state, &user, &set_id, "Failed to fetch match mode data")?;
    let pairs = match_pairs(&cards, state.random()?.as_mut())?;
    Ok(Json(pairs))
}

async fn quiz(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Vec<QuizQuestion>> {
    let cards = pool(&state, &user, &set_id, "Failed to fetch quiz data")?;
    let questions = generate_quiz(&cards, state.random()?.as_mut())?;
    Ok(Json(questions))
}

async fn test_mode(
    State(state): State<ContentState>,
    user: AuthUser,
    Path(set_id): Path<String>,
) -> ApiResult<Vec<GeneratedQuestion>> {
    let cards = pool(&state, &user, &set_id, "Failed to fetch test mode data")?;
    let questions = generate_test(&cards, state.random()?.as_mut())?;
    Ok(Json(questions))
}

// ==================== Study Results ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudyResultRequest {
    set_id: Option<String>,
    mode: Option<StudyMode>,
    score: Option<u32>,
    total_questions: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StudyResultResponse {
    message: String,
    session: StudySession,
}

async fn save_study_result(
    State(state): State<ContentState>,
    user: AuthUser,
    payload: Result<Json<StudyResultRequest>, JsonRejection>,
) -> ApiResult<StudyResultResponse> {
    let Json(body) = payload?;
    let (Some(set_id), Some(mode), Some(score), Some(total_questions)) = (
        required(body.set_id),
        body.mode,
        body.score,
        body.total_questions.filter(|t| *t > 0),
    ) else {
        log::info!("Missing fields for study session from {}", user.user_id);
        return Err(ApiError::validation("Missing required fields"));
    };
    let set_id = parse_id(&set_id, "set")?;

    let session = state
        .storage()?
        .append_session(
            user.user_id,
            &NewStudySession {
                set_id,
                mode,
                score,
                total_questions,
            },
        )
        .map_err(|e| ApiError::content(e, "Failed to save study result"))?;

    Ok(Json(StudyResultResponse {
        message: "Study result saved".to_string(),
        session,
    }))
}

async fn study_history(
    State(state): State<ContentState>,
    user: AuthUser,
) -> ApiResult<Vec<SessionHistoryEntry>> {
    state
        .storage()?
        .session_history(user.user_id)
        .map(Json)
        .map_err(|e| ApiError::content(e, "Failed to fetch study history"))
}
