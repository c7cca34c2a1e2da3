#[macro_use]
extern crate diesel;

pub mod coordinator;
pub mod error;
pub mod models;
pub mod schema;
pub mod slots;
pub mod store;
pub mod waitlist;
