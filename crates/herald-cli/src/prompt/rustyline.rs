use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use herald::models::lead::LeadRecord;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{Input, Prompt};

const PROMPT: &str = "You: ";
const THEME: &str = "zenburn";

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: cliclack::ProgressBar,
    replying: bool,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: spinner(),
            replying: false,
        })
    }
}

fn print_markdown(content: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

fn flush() {
    // Nothing useful can be done if the terminal is gone
    let _ = io::stdout().flush();
}

impl Prompt for RustylinePrompt {
    fn get_input(&mut self) -> Result<Input> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                let input = Input::from_line(&line);
                if input.content.is_some() {
                    let _ = self.editor.add_history_entry(line.trim());
                }
                Ok(input)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Input::exit()),
            Err(e) => {
                eprintln!("Input error: {}", e);
                Ok(Input::exit())
            }
        }
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("Thinking...");
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn render_delta(&mut self, delta: &str) {
        if !self.replying {
            print!("\n{} ", style("Rep:").bold().cyan());
            self.replying = true;
        }
        print!("{}", delta);
        flush();
    }

    fn end_reply(&mut self) {
        if self.replying {
            println!("\n");
            self.replying = false;
        }
        flush();
    }

    fn render_reply(&mut self, reply: &str) {
        print_markdown(reply);
        println!();
    }

    fn render_leads(&mut self, leads: &[LeadRecord]) {
        for lead in leads {
            println!(
                "{}",
                style(format!("(Inquiry from {} <{}> recorded)", lead.name, lead.email)).dim()
            );
        }
    }

    fn render_error(&mut self, message: &str) {
        self.end_reply();
        eprintln!("{}", style(message).red());
    }

    fn close(&self) {
        println!("Goodbye.");
    }
}
