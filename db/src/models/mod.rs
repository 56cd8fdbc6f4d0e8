pub mod admin;
pub mod comic;
pub mod kid;
pub mod submission;
