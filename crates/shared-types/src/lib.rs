pub mod error;
pub mod feature_flags;

// Accounts and shared wrappers
pub mod common;
pub mod models;

// Case-management domain modules
pub mod acknowledgment;
pub mod alert;
pub mod audit;
pub mod check_in;
pub mod client;
pub mod company_config;
pub mod contact;
pub mod court_date;
pub mod geo;
pub mod notification;
pub mod payment;
pub mod performance;
pub mod report;

pub use error::*;
pub use feature_flags::*;

pub use common::*;
pub use models::*;

pub use acknowledgment::*;
pub use alert::*;
pub use audit::*;
pub use check_in::*;
pub use client::*;
pub use company_config::*;
pub use contact::*;
pub use court_date::*;
pub use geo::*;
pub use notification::*;
pub use payment::*;
pub use performance::*;
pub use report::*;
