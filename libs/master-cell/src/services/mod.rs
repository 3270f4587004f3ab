pub mod master;
pub mod schedule;
