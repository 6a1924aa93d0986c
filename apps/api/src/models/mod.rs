pub mod moderation;
pub mod professional;
pub mod review;
