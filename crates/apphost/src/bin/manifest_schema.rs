//! Prints the JSON Schema for app manifests.
//!
//! Usage: `cargo run --bin manifest_schema > manifest.schema.json`

fn main() {
    let schema = serde_json::to_string_pretty(&manifest::manifest_json_schema())
        .expect("failed to serialize manifest schema");
    println!("{schema}");
}
