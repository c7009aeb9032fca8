pub mod account;
pub mod catalog;
pub mod class;
pub mod membership;
pub mod zone;
