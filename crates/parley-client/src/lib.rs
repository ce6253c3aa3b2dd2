// Components of the parley chat client and the glue the terminal front end
// drives them with.

pub mod banner;
pub mod chat;
pub mod commands;
pub mod config;
pub mod events;
pub mod render;
pub mod scroll;
pub mod session;
pub mod sidebar;
pub mod state;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. Logs go to stderr so they do not
/// interleave with the chat transcript on stdout.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley_client=info,parley_net=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
