//! Operations executed against a selected node.

mod read;

pub use read::ReadOperation;
