//! tessel-delta: the rich-text change format shared by the editor core.
//!
//! A [`Delta`] is an ordered list of [`Op`]s. A document is a delta made only
//! of inserts; a change is a delta of retains, inserts and deletes applied to
//! a document with [`Delta::compose`]. Positions derived from a document are
//! carried across a change with [`Delta::transform_position`].
//!
//! All lengths are in chars (Unicode scalar values). Embeds have length 1.

mod attributes;
mod delta;
mod error;
mod iter;
mod op;

pub use attributes::{AttributeMap, compose_attributes};
pub use delta::Delta;
pub use error::DeltaError;
pub use iter::OpIterator;
pub use op::{Embed, Insert, Op, OpKind};

pub use serde_json::Value;
pub use smol_str::SmolStr;
