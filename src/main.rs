#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = qcms_rust::run().await {
        eprintln!("qcms-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
