//! Clipcast Composition Model
//!
//! Defines the data contracts shared by the composition pipeline:
//! - **Audio:** Encoded clips and their measured (or estimated) durations
//! - **Captions:** Timed caption cues
//! - **Timeline:** Transition stages and the effect graph handed to the renderer
//! - **Upload:** Publish sessions and the byte ranges sent to the remote service
//!
//! All times are seconds from the start of the composition.

pub mod audio;
pub mod caption;
pub mod timeline;
pub mod upload;

pub use audio::*;
pub use caption::*;
pub use timeline::*;
pub use upload::*;
