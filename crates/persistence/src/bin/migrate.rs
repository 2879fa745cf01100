#![deny(warnings)]

use persistence::default_sqlite_url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("ADLAB_DATABASE_URL")
        .unwrap_or_else(|_| default_sqlite_url().to_string());
    let pool = persistence::init_db(&url).await?;
    let campaigns = persistence::list_campaigns(&pool).await?;
    println!("DB migrated at {} ({} campaigns)", url, campaigns.len());
    pool.close().await;
    Ok(())
}
