//! Cross-platform low-level audio device I/O core.
//!
//! This crate owns the device lifecycle and worker model, the DSP pipeline
//! that bridges an application's requested audio representation to a
//! device's native one, and the backend contract each OS driver binding
//! would implement. It does not itself bind to any OS audio API, decode
//! any file format, or mix/effect/spatialize multiple streams — see the
//! individual module docs for what's in and out of scope.

mod error;
pub use self::error::*;

mod format;
pub use self::format::*;

mod channel;
pub use self::channel::*;

mod resample;
pub use self::resample::{Algorithm as SrcAlgorithm, FrameSource, SrcConfig, SrcState};

mod mix;
pub use self::mix::*;

mod pipeline;
pub use self::pipeline::*;

mod config;
pub use self::config::*;

mod backend;
pub use self::backend::*;

mod backends;
pub use self::backends::null::NullBackend;

mod state;
pub use self::state::DeviceState;

mod sync;

mod worker;

mod device;
pub use self::device::Device;

mod context;
pub use self::context::{BackendId, Context};
