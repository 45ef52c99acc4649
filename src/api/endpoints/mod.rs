//! HTTP endpoint handlers, one module per resource.

pub mod companies;
pub mod documents;
pub mod files;
pub mod health;
pub mod uploads;
