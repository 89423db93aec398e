#[tokio::main]
async fn main() -> anyhow::Result<()> {
    omnia_rust::run().await
}
