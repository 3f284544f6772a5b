mod message;
pub mod recipe;
pub mod yaml;

// re-export for convenient use with `message`
pub use colored::Colorize;
