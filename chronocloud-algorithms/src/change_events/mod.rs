//! Change events: clusters of significant change between two epochs, described by their geometry, and the
//! collection and rule engine used to filter and label them.

mod collection;
pub use self::collection::*;

mod epochs;
pub use self::epochs::*;

mod event;
pub use self::event::*;

mod extraction;
pub use self::extraction::*;

mod features;
pub use self::features::*;

pub mod float_serde;

mod rules;
pub use self::rules::*;
