use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let storage = match std::env::var("QUIZ_DB_URL") {
        Ok(url) => {
            tracing::info!(%url, "using sqlite storage");
            Storage::sqlite(&url).await?
        }
        Err(_) => {
            tracing::info!("QUIZ_DB_URL not set, using in-memory storage");
            Storage::in_memory()
        }
    };

    let addr = std::env::var("QUIZ_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, api::app(storage)).await?;
    Ok(())
}
