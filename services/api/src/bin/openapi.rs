//! services/api/src/bin/openapi.rs
//!
//! Prints the OpenAPI specification for the Here API to stdout, for use in
//! client generation and CI artifact publishing.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(spec) => println!("{spec}"),
        Err(e) => {
            eprintln!("Failed to serialize the OpenAPI spec: {e}");
            std::process::exit(1);
        }
    }
}
