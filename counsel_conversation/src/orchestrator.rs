//! The single entry point tying history, gateway and audit log together.

use std::collections::HashMap;
use std::sync::Arc;

use counsel_core::{
    ChatError, DEFAULT_SESSION_ID, HistoryProvider, MessageStore, ModelGateway, Role, StorageError,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of one successful orchestration call.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Assistant's answer text.
    pub answer: String,
    /// The session id the turn was recorded under.
    pub session_id: String,
}

/// Conversation orchestrator.
///
/// Stateless between calls except through the shared history provider and
/// message store. Requests against one session id are fully serialized by a
/// per-session lock, so turn pairs never interleave and each request sees
/// the previous answer in its context; distinct sessions run in parallel.
pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    history: Arc<dyn HistoryProvider>,
    store: Arc<dyn MessageStore>,
    system_prompt: String,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        history: Arc<dyn HistoryProvider>,
        store: Arc<dyn MessageStore>,
        system_prompt: String,
    ) -> Self {
        Self {
            gateway,
            history,
            store,
            system_prompt,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Missing or blank session ids collapse into the shared default
    /// session. Observable behavior, kept on purpose.
    fn resolve_session_id(session_id: Option<&str>) -> String {
        match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => DEFAULT_SESSION_ID.to_string(),
        }
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks.entry(session_id.to_owned()).or_default().clone()
    }

    /// Answer `question` within the session's conversation context.
    ///
    /// On success exactly two turns (user, then assistant) have been
    /// appended to both the history provider and the message store. A
    /// generation failure commits nothing; a persistence failure after
    /// successful generation surfaces as [`ChatError::Storage`].
    pub async fn handle(
        &self,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<TurnOutcome, ChatError> {
        let session_id = Self::resolve_session_id(session_id);
        info!("Handling question for session: {session_id}");

        let lock = self.session_lock(&session_id).await;
        let _turn_guard = lock.lock().await;

        let context = self.history.get_context(&session_id).await?;
        debug!("Context for {session_id} holds {} messages", context.len());

        let answer = self
            .gateway
            .generate(&self.system_prompt, &context, question)
            .await?;

        self.commit_pair(&session_id, question, &answer).await?;

        info!("Turn committed for session: {session_id}");
        Ok(TurnOutcome { answer, session_id })
    }

    /// Append the user/assistant pair, user turn first, to both sinks.
    async fn commit_pair(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), StorageError> {
        self.history.append(session_id, Role::User, question).await?;
        self.store.append(session_id, Role::User, question).await?;

        self.history
            .append(session_id, Role::Assistant, answer)
            .await?;
        self.store
            .append(session_id, Role::Assistant, answer)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use counsel_core::{ChatMessage, GenerationError};
    use counsel_store::{MemoryHistory, MemoryMessageStore};
    use std::time::Duration;

    /// Gateway stub: canned answer, or a failure when none is configured.
    struct StubGateway {
        answer: Option<String>,
        delay: Duration,
    }

    impl StubGateway {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ModelGateway for StubGateway {
        async fn generate(
            &self,
            _system_prompt: &str,
            _context: &[ChatMessage],
            _user_text: &str,
        ) -> Result<String, GenerationError> {
            tokio::time::sleep(self.delay).await;
            self.answer
                .clone()
                .ok_or_else(|| GenerationError::new(anyhow::anyhow!("provider unavailable")))
        }
    }

    fn orchestrator_with(gateway: StubGateway) -> (Orchestrator, Arc<MemoryMessageStore>) {
        let store = Arc::new(MemoryMessageStore::new());
        let orchestrator = Orchestrator::new(
            Arc::new(gateway),
            Arc::new(MemoryHistory::new()),
            store.clone(),
            "You are a helpful legal advisor.".to_string(),
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn answers_and_records_the_turn_pair() {
        let (orchestrator, store) =
            orchestrator_with(StubGateway::answering("A tort is a civil wrong."));

        let outcome = orchestrator
            .handle("What is a tort?", Some("s1"))
            .await
            .unwrap();

        assert_eq!(outcome.answer, "A tort is a civil wrong.");
        assert_eq!(outcome.session_id, "s1");

        let turns = store.list("s1").await.unwrap();
        let formatted: Vec<String> = turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect();
        assert_eq!(
            formatted,
            vec![
                "user: What is a tort?".to_string(),
                "assistant: A tort is a civil wrong.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn n_calls_leave_2n_alternating_turns() {
        let (orchestrator, store) = orchestrator_with(StubGateway::answering("Noted."));

        for i in 0..5 {
            orchestrator
                .handle(&format!("Question {i}"), Some("s1"))
                .await
                .unwrap();
        }

        let turns = store.list("s1").await.unwrap();
        assert_eq!(turns.len(), 10);
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(turns[8].content, "Question 4");
    }

    #[tokio::test]
    async fn missing_and_blank_session_ids_share_the_default_session() {
        let (orchestrator, store) = orchestrator_with(StubGateway::answering("Yes."));

        let first = orchestrator.handle("First question", None).await.unwrap();
        let second = orchestrator.handle("Second question", Some("  ")).await.unwrap();

        assert_eq!(first.session_id, DEFAULT_SESSION_ID);
        assert_eq!(second.session_id, first.session_id);

        let turns = store.list(DEFAULT_SESSION_ID).await.unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "First question");
        assert_eq!(turns[2].content, "Second question");
    }

    #[tokio::test]
    async fn generation_failure_commits_nothing() {
        let store = Arc::new(MemoryMessageStore::new());
        let history = Arc::new(MemoryHistory::new());
        let orchestrator = Orchestrator::new(
            Arc::new(StubGateway::failing()),
            history.clone(),
            store.clone(),
            "You are a helpful legal advisor.".to_string(),
        );

        let result = orchestrator.handle("What is a tort?", Some("s1")).await;
        assert!(matches!(result, Err(ChatError::Generation(_))));

        assert!(store.list("s1").await.unwrap().is_empty());
        assert!(history.get_context("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_turns_see_earlier_answers_in_context() {
        let history = Arc::new(MemoryHistory::new());
        let orchestrator = Orchestrator::new(
            Arc::new(StubGateway::answering("It depends.")),
            history.clone(),
            Arc::new(MemoryMessageStore::new()),
            "You are a helpful legal advisor.".to_string(),
        );

        orchestrator.handle("Is this binding?", Some("s1")).await.unwrap();
        orchestrator.handle("On whom?", Some("s1")).await.unwrap();

        let context = history.get_context("s1").await.unwrap();
        assert_eq!(context.len(), 4);
        assert_eq!(context[1].content, "It depends.");
        assert_eq!(context[2].content, "On whom?");
    }

    #[tokio::test]
    async fn concurrent_requests_on_one_session_never_interleave_pairs() {
        let store = Arc::new(MemoryMessageStore::new());
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(StubGateway {
                answer: Some("Acknowledged.".to_string()),
                delay: Duration::from_millis(10),
            }),
            Arc::new(MemoryHistory::new()),
            store.clone(),
            "You are a helpful legal advisor.".to_string(),
        ));

        let mut handles = Vec::new();
        for i in 0..4 {
            let orchestrator = orchestrator.clone();
            handles.push(tokio::spawn(async move {
                orchestrator
                    .handle(&format!("Question {i}"), Some("shared"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let turns = store.list("shared").await.unwrap();
        assert_eq!(turns.len(), 8);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].content, "Acknowledged.");
        }
    }
}
