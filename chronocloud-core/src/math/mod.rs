mod bounds;
pub use self::bounds::*;

mod spherical;
pub use self::spherical::*;
