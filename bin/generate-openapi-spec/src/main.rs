//! Generate `OpenAPI` specification for the Whalescope API
//!
//! Prints to stdout, or writes to the path given as the first argument.

use api::ApiDoc;
use utoipa::OpenApi;

fn main() -> eyre::Result<()> {
    let openapi = ApiDoc::openapi();
    let json = serde_json::to_string_pretty(&openapi)?;
    match std::env::args().nth(1) {
        Some(path) => std::fs::write(&path, json + "\n")?,
        None => println!("{json}"),
    }
    Ok(())
}
