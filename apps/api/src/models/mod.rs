pub mod engagement;
pub mod job;
pub mod user;
