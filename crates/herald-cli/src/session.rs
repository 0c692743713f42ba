use anyhow::Result;
use futures::StreamExt;

use herald::agent::Agent;
use herald::remediation;
use herald::session::{Session as Conversation, TurnEvent};

use crate::prompt::{InputType, Prompt};

pub struct Session<'a> {
    agent: Agent,
    prompt: Box<dyn Prompt + 'a>,
    conversation: Conversation,
    person: String,
    knowledge_dir: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new<S: Into<String>>(
        agent: Agent,
        prompt: Box<dyn Prompt + 'a>,
        person: S,
        knowledge_dir: Option<String>,
    ) -> Self {
        Session {
            agent,
            prompt,
            conversation: Conversation::new(),
            person: person.into(),
            knowledge_dir,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt
            .welcome(&self.person, self.knowledge_dir.as_deref());

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.process_turn(&content).await;
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Answer a single message without the interactive prompt
    pub async fn headless_start(&mut self, text: &str) -> Result<()> {
        self.prompt.show_busy();
        let result = self.conversation.respond(&self.agent, text).await;
        self.prompt.hide_busy();

        match result {
            Ok(outcome) => {
                self.prompt.render_reply(&outcome.reply);
                self.prompt.render_leads(&outcome.leads);
            }
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                self.prompt.render_error(&remediation::describe(&e));
            }
        }
        Ok(())
    }

    async fn process_turn(&mut self, text: &str) {
        self.prompt.show_busy();
        let mut busy = true;

        let mut stream = self.conversation.respond_streaming(&self.agent, text);
        loop {
            tokio::select! {
                event = stream.next() => {
                    if busy {
                        self.prompt.hide_busy();
                        busy = false;
                    }
                    match event {
                        Some(Ok(TurnEvent::Delta(delta))) => self.prompt.render_delta(&delta),
                        Some(Ok(TurnEvent::Finished(outcome))) => {
                            self.prompt.end_reply();
                            self.prompt.render_leads(&outcome.leads);
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "turn failed");
                            self.prompt.render_error(&remediation::describe(&e));
                            break;
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    // Dropping the stream discards the turn, the history stays as it was
                    drop(stream);
                    if busy {
                        self.prompt.hide_busy();
                    }
                    self.prompt.end_reply();
                    self.prompt
                        .render_error("Interrupted: the last message was not recorded.");
                    break;
                }
            }
        }
    }
}
