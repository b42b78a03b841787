mod main_lib;

use main_lib::{build_service, init_tracing, watch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let symbols: Vec<String> = std::env::args().skip(1).collect();
    let service = build_service()?;

    watch(&service, &symbols).await?;

    service.destroy();
    Ok(())
}
