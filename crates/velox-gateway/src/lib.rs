pub mod bootstrap;
pub mod command;
pub mod dispatcher;
pub mod router;
pub mod server;
pub mod state;
pub mod webhook;

pub use dispatcher::{Dispatcher, Outcome};
pub use server::GatewayServer;
