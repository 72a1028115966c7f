mod resolved;
mod sidecar;

pub use self::resolved::ResolvedMetadata;
pub use self::sidecar::{SidecarRecord, is_sidecar};
