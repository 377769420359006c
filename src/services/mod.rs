pub mod account_service;
pub mod ipn;
pub mod memory_store;
pub mod nowpayments;
