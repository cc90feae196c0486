//! HTTP API handlers for tmk-svc
//!
//! Each module exposes a route builder; `build_router` merges them.

pub mod accounts;
pub mod health;
pub mod missions;
pub mod packs;
pub mod questions;
pub mod reports;
pub mod vouchers;

pub use accounts::account_routes;
pub use health::health_routes;
pub use missions::mission_routes;
pub use packs::pack_routes;
pub use questions::question_routes;
pub use reports::report_routes;
pub use vouchers::voucher_routes;
