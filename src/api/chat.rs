use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::ApiConfig,
    domain::{ChatTurn, EmailContext, Speaker},
};

const WELCOME: &str = "Hello! I'm your security assistant. Ask me about phishing, \
email security, or online safety.";
const APOLOGY: &str = "Sorry, I'm having trouble right now. Please try again later.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_context: Option<&'a EmailContext>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryExchange>,
}

#[derive(Deserialize)]
struct HistoryExchange {
    user: String,
    assistant: String,
}

/// One chat session with the remote security assistant. Holds the ordered
/// transcript locally; the session id is a low-entropy grouping key derived
/// from the sender address or page URL, not a security boundary.
pub struct ChatSession {
    http: Client,
    config: ApiConfig,
    session_id: String,
    transcript: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(http: Client, config: ApiConfig, sender: Option<&str>, page_url: &str) -> Self {
        let seed = sender.filter(|s| !s.is_empty()).unwrap_or(page_url);
        Self {
            http,
            config,
            session_id: derive_session_id(seed),
            transcript: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Open with the canned welcome when there is nothing to show yet.
    pub fn greet(&mut self) {
        if self.transcript.is_empty() {
            self.transcript.push(ChatTurn {
                speaker: Speaker::Assistant,
                text: WELCOME.to_string(),
            });
        }
    }

    /// Send one user message, optionally grounded by a truncated email
    /// snapshot. Fails soft: any backend trouble becomes a canned apologetic
    /// assistant turn, never a raw error.
    pub async fn send(&mut self, text: &str, context: Option<&EmailContext>) -> ChatTurn {
        self.transcript.push(ChatTurn {
            speaker: Speaker::User,
            text: text.to_string(),
        });

        let reply_text = match self.exchange(text, context).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(target: "chat", error = %err, session = %self.session_id, "chat exchange failed");
                APOLOGY.to_string()
            }
        };

        let turn = ChatTurn {
            speaker: Speaker::Assistant,
            text: reply_text,
        };
        self.transcript.push(turn.clone());
        turn
    }

    async fn exchange(
        &self,
        text: &str,
        context: Option<&EmailContext>,
    ) -> Result<String, reqwest::Error> {
        let payload = ChatRequest {
            message: text,
            session_id: &self.session_id,
            email_context: context,
        };
        let response: ChatResponse = self
            .http
            .post(format!("{}/chat", self.config.base_url))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.response)
    }

    /// Pull earlier turns of this session from the backend and prepend them.
    /// History is optional; callers ignore failures.
    pub async fn load_history(&mut self) -> Result<usize, reqwest::Error> {
        let response: HistoryResponse = self
            .http
            .get(format!(
                "{}/chat/history/{}",
                self.config.base_url, self.session_id
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut turns = Vec::with_capacity(response.history.len() * 2);
        for exchange in response.history {
            turns.push(ChatTurn {
                speaker: Speaker::User,
                text: exchange.user,
            });
            turns.push(ChatTurn {
                speaker: Speaker::Assistant,
                text: exchange.assistant,
            });
        }
        let loaded = turns.len();
        turns.append(&mut self.transcript);
        self.transcript = turns;

        debug!(target: "chat", session = %self.session_id, loaded, "chat history loaded");
        Ok(loaded)
    }
}

fn derive_session_id(seed: &str) -> String {
    let encoded = BASE64.encode(seed);
    let prefix: String = encoded.chars().take(10).collect();
    format!("session-{prefix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_session(sender: Option<&str>) -> ChatSession {
        ChatSession::new(
            Client::new(),
            ApiConfig {
                base_url: "http://127.0.0.1:9/api".to_string(),
            },
            sender,
            "https://mail.google.com/mail/u/0/",
        )
    }

    #[test]
    fn session_id_is_stable_per_sender() {
        let a = offline_session(Some("alice@example.com"));
        let b = offline_session(Some("alice@example.com"));
        let c = offline_session(Some("mallory@example.com"));
        assert_eq!(a.session_id(), b.session_id());
        assert_ne!(a.session_id(), c.session_id());
        assert!(a.session_id().starts_with("session-"));
        assert_eq!(a.session_id().len(), "session-".len() + 10);
    }

    #[test]
    fn session_id_falls_back_to_page_url() {
        let no_sender = offline_session(None);
        let empty_sender = offline_session(Some(""));
        assert_eq!(no_sender.session_id(), empty_sender.session_id());
    }

    #[test]
    fn greet_only_fills_an_empty_transcript() {
        let mut session = offline_session(None);
        session.greet();
        session.greet();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].speaker, Speaker::Assistant);
    }

    #[tokio::test]
    async fn failed_exchange_appends_canned_apology() {
        let mut session = offline_session(Some("alice@example.com"));
        let turn = session.send("Is this email safe?", None).await;

        assert_eq!(turn.speaker, Speaker::Assistant);
        assert_eq!(turn.text, APOLOGY);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].speaker, Speaker::User);
        assert_eq!(transcript[0].text, "Is this email safe?");
        assert_eq!(transcript[1].speaker, Speaker::Assistant);
    }
}
