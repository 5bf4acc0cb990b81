use crate::common::Frame;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Supplies the most recent video frame on demand. `None` means no frame
/// has been captured yet.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn current_frame(&self) -> Option<Frame>;
}

/// Single-slot frame source. Publishing overwrites the slot, so readers
/// always see the latest frame and nothing is ever queued.
#[derive(Clone)]
pub struct LatestFrameSource {
    rx: watch::Receiver<Option<Frame>>,
}

/// Producer side of [`LatestFrameSource`], held by the capture loop.
#[derive(Clone)]
pub struct FramePublisher {
    tx: Arc<watch::Sender<Option<Frame>>>,
}

impl LatestFrameSource {
    pub fn channel() -> (Self, FramePublisher) {
        let (tx, rx) = watch::channel(None);
        (Self { rx }, FramePublisher { tx: Arc::new(tx) })
    }
}

impl FramePublisher {
    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(Some(frame));
    }

    /// Drops the current frame, e.g. when the stream is interrupted.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

#[async_trait]
impl FrameSource for LatestFrameSource {
    async fn current_frame(&self) -> Option<Frame> {
        self.rx.borrow().clone()
    }
}
