mod handler;

pub use handler::{ws_handler, WsParams};
