pub mod controller;
pub mod elapsed;
pub mod finalizer;
pub mod recorder;

pub use controller::{Collaborators, RecordingController};
pub use recorder::{Recorder, RecorderHandle};
