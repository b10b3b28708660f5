// Core infrastructure modules
pub mod config;
pub mod core;

// Console front end
pub mod shell;

#[cfg(test)]
mod test_utils;
