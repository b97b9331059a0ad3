pub mod resolver;
pub mod store;

pub use resolver::{Binding, Resolver};
pub use store::{LciDatabase, LciStore};
