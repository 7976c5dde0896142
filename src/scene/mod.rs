pub mod backend;
pub mod manager;
