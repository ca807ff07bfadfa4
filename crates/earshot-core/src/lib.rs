pub mod attenuation;
pub mod constants;
pub mod directory;
pub mod error;
pub mod ids;
pub mod ignore;
pub mod index;
pub mod overrides;
pub mod params;
pub mod pose;
pub mod privacy;
pub mod registry;

pub use attenuation::*;
pub use constants::*;
pub use directory::*;
pub use error::*;
pub use ids::*;
pub use ignore::*;
pub use index::*;
pub use overrides::*;
pub use params::*;
pub use pose::*;
pub use privacy::*;
pub use registry::*;
