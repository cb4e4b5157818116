pub mod handler;
pub mod messages;
pub mod registry;

pub use handler::handle_game_results_socket;
pub use registry::BroadcastRegistry;
