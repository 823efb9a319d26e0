pub mod call;
pub mod search;
