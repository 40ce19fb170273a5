//! Upstream POS access: API trait, wire formats, and the two client
//! implementations.

pub mod api;
pub mod error;
#[cfg(feature = "live-pos")]
pub mod live;
pub mod local;
pub mod wire;

pub use api::{PosApi, ProductKind};
pub use error::{PosError, PosResult};
#[cfg(feature = "live-pos")]
pub use live::PosterClient;
pub use local::{CallCounts, LocalPos};
