//! Concrete backend implementations.
//!
//! Real OS driver bindings (WASAPI, ALSA, CoreAudio, ...) are out of scope
//! here — each is an external collaborator that would implement
//! [`crate::backend::Backend`] the same way [`null::NullBackend`] does.

pub mod null;
