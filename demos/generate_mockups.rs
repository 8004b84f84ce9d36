//! Generate a batch of mockups for a PNG design and save them.
//!
//! Requires a generation service at `MOCKUP_ENDPOINT` (default
//! http://127.0.0.1:8787). Settings may also come from a `.env` file.
//!
//! ```sh
//! cargo run --example generate_mockups -- logo.png --category t-shirt --prompt "dark fabric"
//! ```

use clap::Parser;
use mockup_studio::{MockupSession, SlotStatus, StudioConfig, CATEGORIES};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Generate AI mockups for a transparent PNG design")]
struct Args {
    /// PNG file with a transparent background
    design: PathBuf,

    /// Placement context id (stationery, facade, packaging, t-shirt, ...)
    #[arg(short, long)]
    category: String,

    /// Optional style guidance
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Directory to write the results into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mockup_studio=info")),
        )
        .init();

    let args = Args::parse();
    let config = StudioConfig::from_env()?;
    let session = MockupSession::from_config(config);

    let bytes = std::fs::read(&args.design)?;
    session.upload_png(&bytes, "image/png")?;
    if let Err(e) = session.select_category(&args.category) {
        let ids: Vec<&str> = CATEGORIES.iter().map(|c| c.id).collect();
        eprintln!("{} (choose one of: {})", e, ids.join(", "));
        return Ok(());
    }
    session.set_prompt(args.prompt);

    if session.generate().await.is_err() {
        if let Some(notice) = session.snapshot().error {
            eprintln!("{}", notice.message);
        }
        return Ok(());
    }

    std::fs::create_dir_all(&args.out)?;
    for slot in session.snapshot().slots {
        if slot.status != SlotStatus::Ready {
            continue;
        }
        let file = session.download(slot.index)?;
        let path = args.out.join(format!("{}-{}", slot.ordinal, file.file_name));
        std::fs::write(&path, &file.bytes)?;
        println!("Saved mockup #{}: {}", slot.ordinal, path.display());
    }

    Ok(())
}
