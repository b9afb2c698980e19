//! One-shot update command (`weditor update`).

use std::sync::Arc;

use anyhow::Result;

use weditor::config::EditorConfig;
use weditor::editor::runner::ShellRunner;
use weditor::editor::workflow::{RegenKind, Workflow};

pub async fn cmd_update(config: EditorConfig, module: Option<&str>, pdf: bool) -> Result<()> {
    let kind = if pdf { RegenKind::Pdf } else { RegenKind::Html };
    let runner = Arc::new(ShellRunner::new(&config.doc_root));
    let workflow = Workflow::new(Arc::new(config), runner);

    workflow.update_or_cleanup(module, kind).await?;
    println!("Repository updated and regenerated");
    Ok(())
}
