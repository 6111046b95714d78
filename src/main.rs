use anyhow::Result;
use mailprint::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
