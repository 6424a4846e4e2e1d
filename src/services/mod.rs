//! Application services: configuration resolution, view building, portal session.
pub mod config;
pub mod session;
pub mod view;
