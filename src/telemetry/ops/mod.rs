pub mod agg;
pub mod init;
pub mod feed;
pub mod follow;
pub mod user;
pub mod browse;
