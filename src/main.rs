#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quizdeck::run().await
}
