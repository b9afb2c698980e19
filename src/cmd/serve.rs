//! Editor web server command (`weditor serve`).

use anyhow::Result;
use tracing::warn;

use weditor::config::EditorConfig;

pub async fn cmd_serve(config: EditorConfig, open: bool) -> Result<()> {
    for warning in config.validate() {
        warn!("{}", warning);
    }
    weditor::editor::server::start_server(config, open).await
}
