use std::error::Error;
use std::path::PathBuf;

use tagmatch::{
    init_tracing, Event, JsonFileItemSource, MatchEngine, TagmatchConfig, TracingSink,
};

const USAGE: &str = "usage: tagmatch <items.json> <event.json> [config.yaml]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let (Some(items_path), Some(event_path)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let config = match args.next() {
        Some(path) => TagmatchConfig::from_file(path)?,
        None => TagmatchConfig::default(),
    };
    init_tracing(&config.logging)?;

    tracing::info!(
        items = %items_path,
        event = %event_path,
        config = config.name.as_deref().unwrap_or("default"),
        "tagmatch_start"
    );

    let event: Event = serde_json::from_slice(&tokio::fs::read(&event_path).await?)?;
    let source = JsonFileItemSource::new(PathBuf::from(items_path));
    let engine = MatchEngine::new(source, config.to_match_config())?;

    let result = engine.match_and_notify(&event, &TracingSink).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
