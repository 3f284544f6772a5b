mod collect;
mod recipe;

pub use collect::collect;
pub use recipe::recipe;
