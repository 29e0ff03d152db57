#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voicepilot_lib::run().await
}
