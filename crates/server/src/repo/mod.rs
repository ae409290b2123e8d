pub mod acknowledgment;
pub mod alert;
pub mod audit;
pub mod check_in;
pub mod client;
pub mod company_config;
pub mod contact;
pub mod court_date;
pub mod notification;
pub mod payment;
pub mod report;
pub mod user;
