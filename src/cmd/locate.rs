//! Source lookup command (`weditor locate`).

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use weditor::config::EditorConfig;
use weditor::editor::locate::SourceLocator;

#[derive(Serialize)]
struct LocateReport<'a> {
    document: &'a str,
    source: Option<String>,
}

pub fn cmd_locate(config: EditorConfig, doc_path: &str, json: bool) -> Result<()> {
    let locator = SourceLocator::new(Arc::new(config));
    let source = locator.locate_source(doc_path)?.map(|s| s.as_str());

    if json {
        let report = LocateReport {
            document: doc_path,
            source,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match source {
        Some(source) => println!("{}", source),
        None => println!("No editable source for {}", doc_path),
    }
    Ok(())
}
