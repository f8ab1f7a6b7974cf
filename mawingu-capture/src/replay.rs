//! In-memory frame source.

use std::collections::VecDeque;

use mawingu_protocols::LinkType;

use crate::capture::{CaptureEvent, FrameSource};
use crate::error::CaptureError;
use crate::packet::Frame;

/// Serves a fixed list of frames in order, then reports end of stream.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<Frame>,
    link_type: LinkType,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        let frames: VecDeque<Frame> = frames.into_iter().collect();
        let link_type = frames.front().map(|f| f.link_type).unwrap_or_default();
        Self { frames, link_type }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<CaptureEvent, CaptureError> {
        Ok(match self.frames.pop_front() {
            Some(frame) => CaptureEvent::Frame(frame),
            None => CaptureEvent::Closed,
        })
    }

    fn link_type(&self) -> LinkType {
        self.link_type
    }
}
