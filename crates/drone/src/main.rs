use drone::runtime::{boot, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let node = boot::boot().await?;
    serve::serve(node).await
}
