//! # locar_core - Locar Core
//!
//! Zero-dependency primitives shared by every Locar crate:
//! - **Ids**: counter ids for records, anchors and planes
//! - **Recovery**: panic containment for callbacks owned by the host app
//!
//! Nothing in here knows about geography or AR sessions.

pub mod id;
pub mod recovery;

pub use id::*;
pub use recovery::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{Id, IdGenerator};
    pub use crate::recovery::catch_panic_mut;
}
