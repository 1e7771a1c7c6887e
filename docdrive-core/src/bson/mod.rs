//! Type-tagged binary encoding of documents and their values.
//!
//! Every element on the wire is `TAG(1) ++ KEY(cstring) ++ PAYLOAD`. The tag is
//! chosen by the value's Rust type through [`Element`] and read back through
//! [`FromElement`] or, for values of unknown kind, [`decode_element`].

mod data_input;
mod data_output;
mod document;
mod element;
mod element_type;
mod object_id;
mod value;

pub use data_input::{BsonInput, DataInput};
pub use data_output::{BsonOutput, DataOutput, Key};
pub use document::{Document, MAX_NESTING_DEPTH};
pub use element::{decode, decode_element, encode, Element, False, FromElement, True};
pub use element_type::{ElementType, FALSE, TERMINATOR, TRUE};
pub use object_id::ObjectId;
pub use value::{Binary, Bson, DateTime};
