use anyhow::Result;
use std::path::PathBuf;

use super::session::build_session;

pub async fn execute(knowledge_dir: Option<PathBuf>, text: String) -> Result<()> {
    // Run is a single turn of a session, without the interactive prompt
    let mut session = build_session(knowledge_dir)?;
    session.headless_start(&text).await
}
