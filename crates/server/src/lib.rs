pub mod config;

pub mod db;

pub mod rest;

pub mod openapi;

pub mod error_convert;

pub mod extract;

pub mod telemetry;

pub mod health;

pub mod auth;

// Bail-bond domain modules
pub mod repo;

pub mod sweeps;

pub mod perf;

pub mod rate_limit;

// Outbound integrations
pub mod geolocation;

pub mod contact_forward;
