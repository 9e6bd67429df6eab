mod metadata;
pub use self::metadata::*;

mod raster_metadata;
pub use self::raster_metadata::*;

mod reference_frame;
pub use self::reference_frame::*;
