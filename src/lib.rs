pub mod apis;
pub mod cache;
pub mod cart;
pub mod config;
pub mod constants;
pub mod display;
pub mod errors;
pub mod fees;
pub mod logger;
pub mod paths;
pub mod rpc;
pub mod swaps;
pub mod tokens;
pub mod wallet;

#[cfg(test)]
mod testing;
