use oauth_token_cache::{Authorization, Config, RefreshOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional: enable basic logging for the example
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // Load configuration from a JSON file placed next to the binary
    let cfg = Config::from_file("config.json")?;
    let auth = Authorization::from_config(cfg)?;

    match auth.access_token().await {
        (RefreshOutcome::Success, Some(token)) => {
            println!("token acquired (len={})", token.len())
        }
        (outcome, _) => println!("token unavailable: {}", outcome),
    }

    let blocking = auth.clone();
    let (outcome, _) = tokio::task::spawn_blocking(move || blocking.blocking_access_token()).await?;
    println!("blocking lookup: {}", outcome);
    Ok(())
}
