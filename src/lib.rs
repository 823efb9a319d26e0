pub mod cli;
pub mod clv;
pub mod commands;
pub mod utils;
