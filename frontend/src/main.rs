use log::{error, info, Level};

mod config;
mod error;
mod page;
mod reveal {
    pub mod profile;
    pub mod scheduler;
    pub mod state;
    pub mod timeline;
    #[cfg(test)]
    pub mod testing;
}
mod dom {
    pub mod anchors;
    pub mod element;
    pub mod nav;
    pub mod timers;
    pub mod viewport;
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(Level::Info).expect("error initializing log");

    info!("Starting landing page interactions");
    if let Err(err) = page::start() {
        error!("Landing page setup failed: {}", err);
    }
}
