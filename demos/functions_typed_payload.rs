//! Typed request/response example for HTTPS callable Functions.
//! Shows how to map Rust structs to JSON payloads without manual serialization code at call sites.

use firebase_functions_client::functions::{ContextProvider, Functions, FunctionsOptions};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct AddRequest {
    a: i64,
    b: i64,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    sum: i64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let functions = Functions::new(
        FunctionsOptions::new("your-project-id").with_region_or_custom_domain("europe-west1"),
        ContextProvider::default(),
    );

    let add = functions.https_callable::<AddRequest, AddResponse>("addNumbers")?;

    let payload = AddRequest { a: 5, b: 7 };
    let response = add.call_async(&payload).await?;
    println!("5 + 7 = {}", response.data.sum);

    Ok(())
}
