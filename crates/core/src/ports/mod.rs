mod block_source;
mod store;

pub use block_source::*;
pub use store::*;
