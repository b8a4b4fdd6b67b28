pub mod app;
pub mod cli;
pub mod config;
pub mod semantic;
pub mod storage;

#[cfg(test)]
mod tests;
