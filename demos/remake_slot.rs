//! Generate a batch, then remake two mockups at once while watching the
//! per-slot state change.
//!
//! ```sh
//! cargo run --example remake_slot -- logo.png billboard
//! ```

use mockup_studio::{MockupSession, StudioConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let design = args.next().ok_or("usage: remake_slot <design.png> <category>")?;
    let category = args.next().unwrap_or_else(|| "billboard".to_string());

    let session = MockupSession::from_config(StudioConfig::from_env()?);
    session.upload_png(&std::fs::read(&design)?, "image/png")?;
    session.select_category(&category)?;

    // Print every transition as a row of slot states
    let mut updates = session.subscribe();
    let watcher = async {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let row: Vec<&str> = snapshot.slots.iter().map(|s| s.status.as_str()).collect();
            match &snapshot.error {
                Some(notice) => println!("[{}] {}", row.join(", "), notice.message),
                None => println!("[{}]", row.join(", ")),
            }
        }
    };

    let work = async {
        if session.generate().await.is_err() {
            return;
        }
        // Both remakes are in flight together; each only touches its own slot
        let (first, last) = tokio::join!(session.remake(0), session.remake(3));
        println!("remake #1: {:?}, remake #4: {:?}", first.ok(), last.ok());
    };

    tokio::select! {
        _ = work => {}
        _ = watcher => {}
    }
    Ok(())
}
