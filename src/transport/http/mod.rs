pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod dual_read;
    pub mod health;
    pub mod migration;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
