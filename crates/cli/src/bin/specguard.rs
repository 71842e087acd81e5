use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    specguard_cli::main_entry().await
}
