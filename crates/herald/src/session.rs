use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::agent::{Agent, ReplyEvent};
use crate::errors::ReplyError;
use crate::models::lead::{LeadLog, LeadRecord};
use crate::models::message::Message;
use crate::models::role::Role;

/// Placed between the texts of separate tool rounds of one turn
const ROUND_SEPARATOR: &str = "\n\n";

/// Result of one completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Assistant text produced during the turn
    pub reply: String,
    /// Leads captured during this turn only
    pub leads: Vec<LeadRecord>,
}

/// Progress of a streamed turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Delta(String),
    Finished(TurnOutcome),
}

/// One user's conversation: the message history and the leads captured along the way
///
/// A turn only touches the session once it has completed, so a failed or abandoned turn
/// leaves the history exactly as it was before the user's message.
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<Message>,
    leads: LeadLog,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn leads(&self) -> &LeadLog {
        &self.leads
    }

    fn history_with(&self, text: &str) -> (Message, Vec<Message>) {
        let user_message = Message::user().with_text(text);
        let mut history = self.messages.clone();
        history.push(user_message.clone());
        (user_message, history)
    }

    /// Leads are logged as soon as their tool response exists, so a turn that fails later
    /// still keeps every lead that was already forwarded
    fn log_leads(&mut self, message: &Message) {
        self.leads.extend(message.leads());
    }

    fn commit(&mut self, user_message: Message, produced: Vec<Message>) -> TurnOutcome {
        let reply = produced
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .map(Message::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(ROUND_SEPARATOR);
        let leads: Vec<LeadRecord> = produced.iter().flat_map(Message::leads).collect();

        self.messages.push(user_message);
        self.messages.extend(produced);

        TurnOutcome { reply, leads }
    }

    /// Run one turn to completion
    pub async fn respond(&mut self, agent: &Agent, text: &str) -> Result<TurnOutcome, ReplyError> {
        let (user_message, history) = self.history_with(text);
        let mut replies = agent.reply(&history);
        let mut produced = Vec::new();

        while let Some(message) = replies.try_next().await? {
            self.log_leads(&message);
            produced.push(message);
        }

        Ok(self.commit(user_message, produced))
    }

    /// Run one turn, yielding the reply text as it arrives
    ///
    /// The last item of a successful stream is [`TurnEvent::Finished`].
    pub fn respond_streaming<'a>(
        &'a mut self,
        agent: &'a Agent,
        text: &str,
    ) -> BoxStream<'a, Result<TurnEvent, ReplyError>> {
        let (user_message, history) = self.history_with(text);

        Box::pin(async_stream::try_stream! {
            let mut events = agent.reply_streaming(&history);
            let mut produced = Vec::new();
            // Text from an earlier tool round is already on screen
            let mut after_text = false;

            while let Some(event) = events.next().await {
                match event? {
                    ReplyEvent::Delta(delta) => {
                        if after_text && !delta.is_empty() {
                            after_text = false;
                            yield TurnEvent::Delta(ROUND_SEPARATOR.to_string());
                        }
                        yield TurnEvent::Delta(delta);
                    }
                    ReplyEvent::Message(message) => {
                        if message.role == Role::Assistant && !message.text().is_empty() {
                            after_text = true;
                        }
                        self.log_leads(&message);
                        produced.push(message);
                    }
                    ReplyEvent::Done => break,
                }
            }

            yield TurnEvent::Finished(self.commit(user_message, produced));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentResult;
    use crate::models::content::Content;
    use crate::models::tool::{Tool, ToolCall};
    use crate::providers::errors::ProviderError;
    use crate::providers::mock::MockProvider;
    use crate::systems::System;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    struct RecordingSystem {
        tools: Vec<Tool>,
    }

    impl RecordingSystem {
        fn new() -> Self {
            Self {
                tools: vec![Tool::new("record", "Records a lead", json!({"type": "object"}))],
            }
        }
    }

    #[async_trait]
    impl System for RecordingSystem {
        fn name(&self) -> &str {
            "crm"
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
            let lead = LeadRecord::new(
                tool_call.arguments["name"].as_str().unwrap_or_default(),
                "lead@example.com",
                "Rates?",
            )?;
            Ok(vec![Content::text(r#"{"status":"ok"}"#), Content::lead(lead)])
        }
    }

    fn lead_turn(name: &str) -> Vec<Message> {
        vec![
            Message::assistant().with_tool_request(
                "1",
                Ok(ToolCall::new("crm__record", json!({"name": name}))),
            ),
            Message::assistant().with_text("Recorded, thanks!"),
        ]
    }

    #[tokio::test]
    async fn test_respond_records_turn() -> Result<()> {
        let agent = Agent::new(
            Box::new(MockProvider::new(vec![Message::assistant().with_text("Hi there")])),
            "instructions",
        );
        let mut session = Session::new();

        let outcome = session.respond(&agent, "Hello").await?;

        assert_eq!(outcome.reply, "Hi there");
        assert!(outcome.leads.is_empty());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0].text(), "Hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_leads_are_per_turn_and_logged() -> Result<()> {
        let mut responses = lead_turn("Jane");
        responses.extend(lead_turn("Jane"));
        let mut agent = Agent::new(Box::new(MockProvider::new(responses)), "instructions");
        agent.add_system(Box::new(RecordingSystem::new()));
        let mut session = Session::new();

        let first = session.respond(&agent, "Salary?").await?;
        let second = session.respond(&agent, "Salary again?").await?;

        assert_eq!(first.reply, "Recorded, thanks!");
        assert_eq!(first.leads.len(), 1);
        assert_eq!(second.leads.len(), 1);
        assert_eq!(session.leads().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_untouched() -> Result<()> {
        let agent = Agent::new(
            Box::new(MockProvider::with_results(vec![
                Ok(Message::assistant().with_text("First answer")),
                Err(ProviderError::Timeout("slow".into())),
            ])),
            "instructions",
        );
        let mut session = Session::new();
        session.respond(&agent, "One").await?;

        let err = session.respond(&agent, "Two").await.unwrap_err();

        assert!(matches!(err, ReplyError::Provider(ProviderError::Timeout(_))));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].text(), "First answer");
        Ok(())
    }

    #[tokio::test]
    async fn test_streaming_turn() -> Result<()> {
        let mut agent = Agent::new(Box::new(MockProvider::new(lead_turn("Ann"))), "instructions");
        agent.add_system(Box::new(RecordingSystem::new()));
        let mut session = Session::new();

        let events: Vec<TurnEvent> = session
            .respond_streaming(&agent, "Can I hire Daniel?")
            .try_collect()
            .await?;

        let deltas: String = events
            .iter()
            .filter_map(|event| match event {
                TurnEvent::Delta(delta) => Some(delta.as_str()),
                TurnEvent::Finished(_) => None,
            })
            .collect();
        assert_eq!(deltas, "Recorded, thanks!");
        match events.last() {
            Some(TurnEvent::Finished(outcome)) => {
                assert_eq!(outcome.reply, deltas);
                assert_eq!(outcome.leads[0].name, "Ann");
            }
            other => panic!("Expected Finished, got {other:?}"),
        }
        // user, tool request, tool response, final answer
        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.leads().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_lead_is_kept_when_turn_fails_after_capture() -> Result<()> {
        let mut responses: Vec<_> = lead_turn("Jane").into_iter().take(1).map(Ok).collect();
        responses.push(Err(ProviderError::Connection("reset by peer".into())));
        let mut agent = Agent::new(
            Box::new(MockProvider::with_results(responses)),
            "instructions",
        );
        agent.add_system(Box::new(RecordingSystem::new()));
        let mut session = Session::new();

        let err = session.respond(&agent, "What is the salary?").await.unwrap_err();

        assert!(matches!(err, ReplyError::Provider(ProviderError::Connection(_))));
        assert!(session.messages().is_empty());
        assert_eq!(session.leads().len(), 1);
        assert_eq!(session.leads().records()[0].name, "Jane");
        Ok(())
    }

    #[tokio::test]
    async fn test_streamed_lead_is_kept_when_turn_fails_after_capture() {
        let mut responses: Vec<_> = lead_turn("Ann").into_iter().take(1).map(Ok).collect();
        responses.push(Err(ProviderError::Timeout("slow".into())));
        let mut agent = Agent::new(
            Box::new(MockProvider::with_results(responses)),
            "instructions",
        );
        agent.add_system(Box::new(RecordingSystem::new()));
        let mut session = Session::new();

        let result: Result<Vec<TurnEvent>, ReplyError> = session
            .respond_streaming(&agent, "Can I hire Daniel?")
            .try_collect()
            .await;

        assert!(result.is_err());
        assert!(session.messages().is_empty());
        assert_eq!(session.leads().len(), 1);
    }

    #[tokio::test]
    async fn test_texts_of_tool_rounds_are_separated() -> Result<()> {
        let rounds = || {
            vec![
                Message::assistant()
                    .with_text("Let me check.")
                    .with_tool_request("1", Ok(ToolCall::new("crm__record", json!({"name": "Bo"})))),
                Message::assistant().with_text("Done, Daniel will follow up."),
            ]
        };
        let mut agent = Agent::new(Box::new(MockProvider::new(rounds())), "instructions");
        agent.add_system(Box::new(RecordingSystem::new()));
        let mut session = Session::new();

        let outcome = session.respond(&agent, "Rates?").await?;
        assert_eq!(outcome.reply, "Let me check.\n\nDone, Daniel will follow up.");

        let mut agent = Agent::new(Box::new(MockProvider::new(rounds())), "instructions");
        agent.add_system(Box::new(RecordingSystem::new()));
        let events: Vec<TurnEvent> = session
            .respond_streaming(&agent, "Rates?")
            .try_collect()
            .await?;
        let deltas: String = events
            .iter()
            .filter_map(|event| match event {
                TurnEvent::Delta(delta) => Some(delta.as_str()),
                TurnEvent::Finished(_) => None,
            })
            .collect();
        assert_eq!(deltas, outcome.reply);
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_stream_leaves_history_untouched() {
        let agent = Agent::new(
            Box::new(MockProvider::new(vec![Message::assistant().with_text("a b c")])),
            "instructions",
        );
        let mut session = Session::new();

        {
            let mut stream = session.respond_streaming(&agent, "Hi");
            let first = stream.next().await;
            assert!(matches!(first, Some(Ok(TurnEvent::Delta(_)))));
        }

        assert!(session.messages().is_empty());
    }
}
