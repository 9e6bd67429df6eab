mod point_cloud;
pub use self::point_cloud::*;

mod change_points;
pub use self::change_points::*;

mod raster;
pub use self::raster::*;
