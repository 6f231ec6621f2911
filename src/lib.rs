pub mod app;
pub mod cli;
pub mod config;
pub mod directory;
pub mod identity;
pub mod loader;
pub mod output;
pub mod render;
pub mod sections;

#[cfg(test)]
mod tests;
