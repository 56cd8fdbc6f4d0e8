pub mod activity;
pub mod email;
pub mod ranking;
pub mod storage;
