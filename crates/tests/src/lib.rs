//! Database-backed API tests. Each test truncates the database, so they run
//! one at a time. They need `TEST_DATABASE_URL` or `DATABASE_URL` to point
//! at a Postgres instance.

#[cfg(test)]
mod common;

#[cfg(test)]
mod acknowledgment_tests;
#[cfg(test)]
mod alert_tests;
#[cfg(test)]
mod audit_tests;
#[cfg(test)]
mod auth_tests;
#[cfg(test)]
mod check_in_tests;
#[cfg(test)]
mod client_tests;
#[cfg(test)]
mod company_config_tests;
#[cfg(test)]
mod contact_tests;
#[cfg(test)]
mod court_date_tests;
#[cfg(test)]
mod me_tests;
#[cfg(test)]
mod notification_tests;
#[cfg(test)]
mod payment_tests;
#[cfg(test)]
mod report_tests;
#[cfg(test)]
mod user_tests;
