//! Wire messages exchanged with a node on the read path.
//!
//! A read is a single [`Query`] answered by a single [`Reply`]. Both carry a
//! [`MessageHeader`] and document payloads encoded by [`crate::bson`].

mod codec;
mod header;
mod query;
mod reply;

pub use codec::WireCodec;
pub use header::{
    next_request_id, MessageHeader, HEADER_SIZE, MAX_MESSAGE_SIZE, OP_QUERY, OP_REPLY,
};
pub use query::{Query, QueryFlags, QueryOptions, COMMAND_COLLECTION};
pub use reply::{Reply, ResponseFlags};
