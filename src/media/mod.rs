pub mod device;
pub mod simulated;

pub use device::{Artifact, MediaConstraints, MediaDevice, MediaError, MediaSource, TrackKind};
pub use simulated::SimulatedDevice;
