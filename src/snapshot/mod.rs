pub mod compare;
pub mod recorder;
pub mod store;
pub mod types;

pub use compare::{DEFAULT_TOLERANCE, similarity};
pub use recorder::{ScreenshotRecorder, checkpoint_filename};
pub use store::ImageStore;
pub use types::{SnapshotConfig, SnapshotError, SnapshotResult};
