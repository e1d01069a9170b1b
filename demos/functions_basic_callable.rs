//! Minimal example invoking a callable with a JSON payload.
//! Provide your Firebase project ID and deploy a callable named `helloWorld` (or adjust the name).

use firebase_functions_client::functions::{ContextProvider, Functions, FunctionsOptions};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Uses the default region (us-central1) just like the JS SDK.
    let functions = Functions::new(
        FunctionsOptions::new("your-project-id"),
        ContextProvider::default(),
    );

    let callable = functions.https_callable::<serde_json::Value, serde_json::Value>("helloWorld")?;

    let response = callable
        .call_async(&json!({ "message": "Hello from Rust!" }))
        .await?;
    println!("Callable response: {}", response.data);

    Ok(())
}
