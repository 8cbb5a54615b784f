pub mod cv;
pub mod user;
pub mod wallet;
