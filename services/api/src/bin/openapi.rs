//! services/api/src/bin/openapi.rs
//!
//! Dumps the VeriDoc OpenAPI 3.0 document to disk so it can be checked
//! in or fed to client generators without starting the server.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUT: &str = "veridoc-openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // An optional first argument overrides the output path.
    let out = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUT.to_string());
    std::fs::write(&out, ApiDoc::openapi().to_pretty_json()?)?;
    println!("OpenAPI document written to {out}");
    Ok(())
}
