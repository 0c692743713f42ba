pub mod agent;
pub mod config;
pub mod errors;
pub mod knowledge;
pub mod models;
pub mod notifier;
pub mod persona;
pub mod prompt_template;
pub mod providers;
pub mod remediation;
pub mod session;
pub mod systems;
