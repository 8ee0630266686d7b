//! Banner Compositor CLI Tool
//!
//! Command-line interface for composing marketing banners from product images
//! with gradient, generated or inpainted backgrounds.

#[cfg(feature = "cli")]
use banner_compositor::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
