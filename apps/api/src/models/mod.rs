pub mod conversation;
pub mod employee;
