pub mod params;
pub mod raw;
pub mod result;
pub mod round;
pub mod series;
pub mod summary;
pub mod template;

pub use params::*;
pub use raw::*;
pub use result::*;
pub use series::*;
pub use summary::*;
pub use template::*;
