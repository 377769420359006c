pub mod account;
pub mod payment;
pub mod types;
