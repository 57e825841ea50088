use anyhow::Context;
use gosub_fetch::{FetchConfig, FetchEngine};

// Loads the identifier given on the command line and prints the body.
//
//   cargo run --example fetch -- https://example.org/
//   cargo run --example fetch -- view-source:http://example.org/
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let raw = std::env::args()
        .nth(1)
        .context("usage: fetch <identifier>")?;

    let config = FetchConfig::builder()
        .build()
        .context("Configuration is not valid")?;
    let mut engine = FetchEngine::new(config);

    let page = engine
        .navigate(&raw)
        .with_context(|| format!("cannot load {raw}"))?;

    log::info!("Loaded {} (view-source: {})", page.url, page.view_source);
    println!("{}", page.body);

    engine.close_all();
    Ok(())
}
