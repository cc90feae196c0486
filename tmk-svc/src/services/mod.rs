//! Business operations and external collaborators
//!
//! Each service module owns one operation family; external systems
//! (text generation, notification) sit behind traits so tests can
//! script them.

pub mod anthropic_client;
pub mod mission_service;
pub mod notifier;
pub mod pack_service;
pub mod question_service;
pub mod report_service;
pub mod summarizer;
pub mod voucher_service;
