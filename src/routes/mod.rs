pub mod analytics;
pub mod balance;
pub mod gateway;
pub mod health;
pub mod register;
