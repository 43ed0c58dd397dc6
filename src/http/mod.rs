pub mod handlers;
pub mod proxy;
pub mod routes;
pub mod state;

pub use proxy::ProxyClient;
pub use routes::create_router;
pub use state::AppState;
