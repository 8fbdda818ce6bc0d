mod error;
mod ni;
mod vm;

pub use error::{PoolError, Result};
pub use ni::{MAX_NI_SLOTS, NetworkInterface, NiPool};
pub use vm::{VmHandle, VmPool};
