#![allow(dead_code)]

use std::env;
use std::path::PathBuf;

// Helper to initialize tracing subscriber
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// Helper function to get a real engine executable or skip the test
pub fn engine_or_skip(var_name: &str, test_name: &str) -> Option<PathBuf> {
    dotenv::dotenv().ok(); // Load .env file if present

    match env::var(var_name) {
        Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => {
            println!(
                "Skipping integration test {} - {} environment variable not set.",
                test_name, var_name
            );
            None
        }
    }
}
