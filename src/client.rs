//! HTTP client for the user-service, plus login against the auth-service

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::flashcards::{
    Flashcard, FlashcardSet, GeneratedQuestion, MatchPair, NewFlashcard, NewStudySession,
    Profile, QuizQuestion, SessionHistoryEntry, StudySession,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not logged in")]
    MissingToken,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct MessageReply {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    token: String,
}

#[derive(Debug, Deserialize)]
struct CardsReply {
    flashcards: Vec<Flashcard>,
}

#[derive(Debug, Deserialize)]
struct SessionReply {
    session: StudySession,
}

#[derive(Debug, Deserialize)]
struct CardReply {
    flashcard: Flashcard,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardUpdate<'a> {
    front: &'a str,
    back: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_memorized: Option<bool>,
}

fn normalize(base_url: &str) -> Result<String> {
    let base_url = base_url.trim_end_matches('/').to_string();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ClientError::InvalidUrl(base_url));
    }
    Ok(base_url)
}

/// Turn a non-success response into an error carrying the server's `{message}`
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageReply>(&text)
        .map(|m| m.message)
        .unwrap_or(text);
    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        other => ClientError::Server {
            status: other.as_u16(),
            message,
        },
    })
}

/// Exchange email and password for a session token at the auth-service
pub async fn login(auth_url: &str, email: &str, password: &str) -> Result<String> {
    let url = format!("{}/login", normalize(auth_url)?);
    let response = Client::new()
        .post(url)
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    let reply: TokenReply = check(response).await?.json().await?;
    Ok(reply.token)
}

/// Authenticated calls to the user-service
pub struct StudyClient {
    client: Client,
    base_url: String,
    token: String,
}

impl StudyClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        if token.is_empty() {
            return Err(ClientError::MissingToken);
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize(base_url)?,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        self.get("/profile").await
    }

    pub async fn sets(&self) -> Result<Vec<FlashcardSet>> {
        self.get("/flashcard-sets").await
    }

    pub async fn create_set(&self, title: &str) -> Result<FlashcardSet> {
        self.send(
            self.request(Method::POST, "/flashcard-set")
                .json(&json!({ "title": title })),
        )
        .await
    }

    pub async fn delete_set(&self, set_id: Uuid) -> Result<String> {
        let reply: MessageReply = self
            .send(self.request(Method::DELETE, &format!("/flashcard-set/{}", set_id)))
            .await?;
        Ok(reply.message)
    }

    pub async fn cards(&self, set_id: Uuid) -> Result<Vec<Flashcard>> {
        self.get(&format!("/flashcards/{}", set_id)).await
    }

    pub async fn create_card(&self, set_id: Uuid, front: &str, back: &str) -> Result<Flashcard> {
        self.send(
            self.request(Method::POST, "/flashcard")
                .json(&json!({ "front": front, "back": back, "setId": set_id })),
        )
        .await
    }

    pub async fn update_card(
        &self,
        card_id: Uuid,
        front: &str,
        back: &str,
        is_memorized: Option<bool>,
    ) -> Result<Flashcard> {
        let reply: CardReply = self
            .send(
                self.request(Method::PUT, &format!("/flashcard/{}", card_id))
                    .json(&CardUpdate {
                        front,
                        back,
                        is_memorized,
                    }),
            )
            .await?;
        Ok(reply.flashcard)
    }

    pub async fn delete_card(&self, card_id: Uuid) -> Result<String> {
        let reply: MessageReply = self
            .send(self.request(Method::DELETE, &format!("/flashcard/{}", card_id)))
            .await?;
        Ok(reply.message)
    }

    pub async fn import_cards(&self, cards: &[NewFlashcard]) -> Result<Vec<Flashcard>> {
        let reply: CardsReply = self
            .send(
                self.request(Method::POST, "/flashcards/bulk")
                    .json(&json!({ "flashcards": cards })),
            )
            .await?;
        Ok(reply.flashcards)
    }

    pub async fn flashcard_mode(&self, set_id: Uuid) -> Result<Vec<Flashcard>> {
        self.get(&format!("/flashcard-mode/{}", set_id)).await
    }

    pub async fn match_mode(&self, set_id: Uuid) -> Result<Vec<MatchPair>> {
        self.get(&format!("/match-mode/{}", set_id)).await
    }

    pub async fn quiz(&self, set_id: Uuid) -> Result<Vec<QuizQuestion>> {
        self.get(&format!("/quiz/{}", set_id)).await
    }

    pub async fn test_mode(&self, set_id: Uuid) -> Result<Vec<GeneratedQuestion>> {
        self.get(&format!("/test-mode/{}", set_id)).await
    }

    pub async fn save_result(&self, result: &NewStudySession) -> Result<StudySession> {
        let reply: SessionReply = self
            .send(self.request(Method::POST, "/study-result").json(result))
            .await?;
        Ok(reply.session)
    }

    pub async fn history(&self) -> Result<Vec<SessionHistoryEntry>> {
        self.get("/study-history").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::flashcards::{ContentStorage, SeededRandom, StudyMode};
    use crate::server::{self, content_api, ContentState, ServiceHandle};
    use std::net::SocketAddr;

    async fn user_service(secret: &[u8]) -> ServiceHandle {
        let state = ContentState::with_random(
            ContentStorage::open_in_memory().unwrap(),
            TokenIssuer::new(secret),
            Box::new(SeededRandom::new(3)),
        );
        server::start(
            "user-service",
            SocketAddr::from(([127, 0, 0, 1], 0)),
            content_api::router(state),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            StudyClient::new("localhost:3002", "t".to_string()),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            StudyClient::new("http://localhost:3002", String::new()),
            Err(ClientError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_study_round_trip() {
        let secret = b"client-secret";
        let handle = user_service(secret).await;
        let token = TokenIssuer::new(secret)
            .issue_session(Uuid::new_v4(), "learner@example.com")
            .unwrap();
        let client = StudyClient::new(&handle.base_url(), token).unwrap();

        let set = client.create_set("Capitals").await.unwrap();
        let cards: Vec<NewFlashcard> = [("France", "Paris"), ("Italy", "Rome"), ("Spain", "Madrid")]
            .iter()
            .map(|(front, back)| NewFlashcard {
                front: front.to_string(),
                back: back.to_string(),
                set_id: Some(set.id),
            })
            .collect();
        assert_eq!(client.import_cards(&cards).await.unwrap().len(), 3);

        let quiz = client.quiz(set.id).await.unwrap();
        assert_eq!(quiz.len(), 3);
        assert_eq!(quiz[0].answer, "Paris");

        let saved = client
            .save_result(&NewStudySession {
                set_id: set.id,
                mode: StudyMode::Quiz,
                score: 2,
                total_questions: 3,
            })
            .await
            .unwrap();
        assert_eq!(saved.score, 2);

        let history = client.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].set_title, "Capitals");
    }

    #[tokio::test]
    async fn test_memorized_flag_persists() {
        let secret = b"client-secret";
        let handle = user_service(secret).await;
        let token = TokenIssuer::new(secret)
            .issue_session(Uuid::new_v4(), "learner@example.com")
            .unwrap();
        let client = StudyClient::new(&handle.base_url(), token).unwrap();

        let set = client.create_set("Verbs").await.unwrap();
        let card = client.create_card(set.id, "ăn", "eat").await.unwrap();
        assert!(!card.is_memorized);

        let updated = client
            .update_card(card.id, &card.front, &card.back, Some(true))
            .await
            .unwrap();
        assert!(updated.is_memorized);

        let cards = client.flashcard_mode(set.id).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].is_memorized);

        // Leaving the flag out keeps the stored value
        client
            .update_card(card.id, "ăn", "to eat", None)
            .await
            .unwrap();
        let cards = client.cards(set.id).await.unwrap();
        assert_eq!(cards[0].back, "to eat");
        assert!(cards[0].is_memorized);
    }

    #[tokio::test]
    async fn test_card_and_set_management() {
        let secret = b"client-secret";
        let handle = user_service(secret).await;
        let user_id = Uuid::new_v4();
        let token = TokenIssuer::new(secret)
            .issue_session(user_id, "learner@example.com")
            .unwrap();
        let client = StudyClient::new(&handle.base_url(), token).unwrap();

        assert!(matches!(client.profile().await, Err(ClientError::NotFound(_))));

        let set = client.create_set("Colors").await.unwrap();
        let red = client.create_card(set.id, "đỏ", "red").await.unwrap();
        client.create_card(set.id, "xanh", "blue").await.unwrap();

        assert_eq!(client.delete_card(red.id).await.unwrap(), "Flashcard deleted");
        let cards = client.cards(set.id).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "xanh");
        assert!(matches!(
            client.delete_card(red.id).await,
            Err(ClientError::NotFound(_))
        ));

        assert_eq!(
            client.delete_set(set.id).await.unwrap(),
            "Flashcard set and related data deleted"
        );
        assert!(client.sets().await.unwrap().is_empty());
        assert!(matches!(client.cards(set.id).await, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_server_messages_surface() {
        let handle = user_service(b"one-secret").await;
        let token = TokenIssuer::new(b"other-secret")
            .issue_session(Uuid::new_v4(), "x@example.com")
            .unwrap();
        let client = StudyClient::new(&handle.base_url(), token).unwrap();

        match client.sets().await {
            Err(ClientError::Unauthorized(message)) => assert_eq!(message, "Invalid token"),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }
}
