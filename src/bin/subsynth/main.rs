//! subsynth - polyphonic engine demo
//!
//! Opens the default output device, plays a short chord/arpeggio session
//! from a control thread while sweeping the filter, and prints engine
//! snapshots. Run with: cargo run

mod app;
mod session;

use app::DemoApp;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    DemoApp::new().run()
}
