use anyhow::Result;
use herald::models::lead::LeadRecord;

pub mod rustyline;

/// Words that end the conversation, compared case-insensitively
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

pub trait Prompt {
    /// `knowledge_dir` is set when the instructions were built from documents in it
    fn welcome(&self, person: &str, knowledge_dir: Option<&str>) {
        println!("Professional Representative Agent ({})", person);
        println!(
            "Ask about {}'s background and work, or leave a message for a follow-up.",
            person
        );
        if let Some(dir) = knowledge_dir {
            println!("{}", knowledge_note(dir));
        }
        println!();
    }
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    /// Print a fragment of the reply as it streams in
    fn render_delta(&mut self, delta: &str);
    /// Finish a streamed reply
    fn end_reply(&mut self);
    /// Print a complete reply at once
    fn render_reply(&mut self, reply: &str);
    fn render_leads(&mut self, leads: &[LeadRecord]);
    fn render_error(&mut self, message: &str);
    fn close(&self);
}

/// Startup line naming the directory the answers are grounded in
pub fn knowledge_note(dir: &str) -> String {
    let dir = dir.trim_end_matches(['/', '\\']);
    format!("(Using context from {}/)", dir)
}

#[derive(Debug, PartialEq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

impl Input {
    pub fn exit() -> Self {
        Input {
            input_type: InputType::Exit,
            content: None,
        }
    }

    /// Classify one line typed by the user
    pub fn from_line(line: &str) -> Self {
        let text = line.trim();
        if text.is_empty() {
            return Input {
                input_type: InputType::AskAgain,
                content: None,
            };
        }

        let command = text.strip_prefix('/').unwrap_or(text);
        if EXIT_WORDS
            .iter()
            .any(|word| command.eq_ignore_ascii_case(word))
        {
            return Input::exit();
        }

        Input {
            input_type: InputType::Message,
            content: Some(text.to_string()),
        }
    }
}
