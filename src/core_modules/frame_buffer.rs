// THEORY:
// The `FrameBuffer` is the single hand-off point between the acquisition loop and
// every consumer of frames. It holds exactly one frame, the most recent one.
//
// Key architectural principles:
// 1.  **Last Write Wins**: `publish` replaces the held frame. Readers are never
//     promised every frame, only the newest one at the time they ask.
// 2.  **Copy Out**: `snapshot` hands back an independent copy. The slot is locked
//     only for the instant of the copy or the replace, never while a reader
//     processes its frame.
// 3.  **Change Notification**: streaming consumers can `subscribe` and await the
//     next publish instead of polling.

use crate::core_modules::frame::Frame;
use tokio::sync::watch;

pub struct FrameBuffer {
    slot: watch::Sender<Option<Frame>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Replaces the held frame. The previous frame is dropped outside the critical section.
    pub fn publish(&self, frame: Frame) {
        let _previous = self.slot.send_replace(Some(frame));
    }

    /// A private copy of the most recent frame, or `None` before the first publish.
    pub fn snapshot(&self) -> Option<Frame> {
        self.slot.borrow().clone()
    }

    pub fn latest_frame_id(&self) -> Option<u64> {
        self.slot.borrow().as_ref().map(|frame| frame.frame_id)
    }

    /// A receiver that is notified on every publish. Intermediate frames may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<Option<Frame>> {
        self.slot.subscribe()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
