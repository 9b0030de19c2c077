//! The per-device worker (C7): runs the §4.7 loop on its own thread,
//! calling the backend's start/pump/stop operations and driving the state
//! machine through its handshakes.

use std::sync::Arc;

use crate::backend::{BackendDevice, DeviceKind, PumpSink};
use crate::device::DeviceShared;
use crate::pipeline::FrameReader;
use crate::state::DeviceState;

/// Adapts the application's `onSend` callback (app-format bytes) into a
/// [`FrameReader`] the pipeline can pull from. Per §6, `onSend` always
/// nominally supplies a full period: whatever it doesn't fill is zeroed by
/// the core, it never signals "exhausted" to the pipeline.
struct SendCallbackReader<'a> {
    cb: &'a mut (dyn FnMut(usize, &mut [u8]) -> usize + Send),
}

impl FrameReader for SendCallbackReader<'_> {
    fn read(&mut self, out: &mut [u8], max_frames: usize, frame_size: usize) -> usize {
        let want = max_frames * frame_size;
        let written_frames = (self.cb)(max_frames, &mut out[..want]).min(max_frames);
        let written = written_frames * frame_size;
        out[written..want].iter_mut().for_each(|b| *b = 0);
        max_frames
    }
}

/// Adapts an already-filled, fixed-size raw buffer (what the backend wrote
/// for a capture period) into a [`FrameReader`].
struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl FrameReader for SliceReader<'_> {
    fn read(&mut self, out: &mut [u8], max_frames: usize, frame_size: usize) -> usize {
        let remaining_frames = (self.data.len() - self.pos) / frame_size;
        let take_frames = remaining_frames.min(max_frames);
        let bytes = take_frames * frame_size;
        out[..bytes].copy_from_slice(&self.data[self.pos..self.pos + bytes]);
        self.pos += bytes;
        take_frames
    }
}

struct WorkerSink {
    shared: Arc<DeviceShared>,
}

impl PumpSink for WorkerSink {
    fn pump(&mut self, buffer: &mut [u8], frames: usize) -> Result<(), crate::error::Error> {
        match self.shared.kind {
            DeviceKind::Playback => self.pump_playback(buffer, frames),
            DeviceKind::Capture => self.pump_capture(buffer, frames),
        }
    }
}

impl WorkerSink {
    fn pump_playback(&mut self, buffer: &mut [u8], frames: usize) -> Result<(), crate::error::Error> {
        let mut send_guard = self.shared.send_cb.lock().unwrap();
        let mut pipeline = self.shared.pipeline.lock().unwrap();
        match send_guard.as_mut() {
            Some(cb) => {
                let mut reader = SendCallbackReader { cb: cb.as_mut() };
                pipeline.read_frames(&mut reader, buffer, frames, false);
            }
            None => buffer.iter_mut().for_each(|b| *b = 0),
        }
        Ok(())
    }

    fn pump_capture(&mut self, buffer: &mut [u8], frames: usize) -> Result<(), crate::error::Error> {
        let frame_size = self.shared.internal_frame_size;
        let app_frame_bytes = {
            let pipeline = self.shared.pipeline.lock().unwrap();
            let cfg = pipeline.config();
            cfg.dst_channels * cfg.dst_format.size_in_bytes()
        };
        let mut app_buf = vec![0u8; frames * app_frame_bytes];

        let produced = {
            let mut reader = SliceReader {
                data: &buffer[..frames * frame_size],
                pos: 0,
            };
            let mut pipeline = self.shared.pipeline.lock().unwrap();
            pipeline.read_frames(&mut reader, &mut app_buf, frames, false)
        };

        if let Some(cb) = self.shared.recv_cb.lock().unwrap().as_mut() {
            cb(produced, &app_buf[..produced * app_frame_bytes]);
        }
        Ok(())
    }
}

/// Runs the worker loop (§4.7) until the device transitions to
/// UNINITIALIZED. Owns `backend` for its whole lifetime.
pub(crate) fn run_worker(shared: Arc<DeviceShared>, mut backend: Box<dyn BackendDevice>) {
    let mut first_iteration = true;
    let mut sink = WorkerSink {
        shared: shared.clone(),
    };

    loop {
        // Step 1: stop_backend (no-op first iteration); onStop on later ones.
        if !first_iteration {
            let _ = backend.stop_backend();
            if let Some(cb) = shared.stop_cb.lock().unwrap().as_mut() {
                cb();
            }
        }
        first_iteration = false;

        // Step 2: transition to STOPPED, signal stopEvent.
        shared.state.store(DeviceState::Stopped);
        shared.stop_event.signal();

        // Step 3: wait on wakeupEvent.
        shared.wakeup_event.wait();

        // Step 4: exit if UNINITIALIZED.
        if shared.state.load() == DeviceState::Uninitialized {
            backend.device_uninit();
            return;
        }

        // Step 5: call start_backend; report via workResult; signal startEvent.
        let result = backend.start_backend(&mut sink);
        *shared.work_result.lock().unwrap() = Some(result.clone());
        shared.start_event.signal();

        // Step 6: on failure, loop back to (1).
        if result.is_err() {
            continue;
        }
        shared.state.store(DeviceState::Started);

        // Step 7: main_loop until break_main_loop is invoked.
        let _ = backend.main_loop(&mut sink);

        // Step 8: loop back to (1).
    }
}
