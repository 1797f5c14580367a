//! Data structures shared across the service

pub mod quota;
pub mod track;
pub mod user;

pub use quota::GuestQuota;
pub use track::{NewTrack, Track};
pub use user::User;
