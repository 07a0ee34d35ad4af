//! Core simulation module
//!
//! Clock, event queue, scene persistence, and the headless tick harness.

mod events;
mod scene;
mod sim;
mod time;

pub use events::{Events, GameEvent, SoundCue};
pub use scene::{Scene, SceneError, SerializedEntity, StalkerRecord};
pub use sim::{SimConfig, Simulation};
pub use time::Time;
