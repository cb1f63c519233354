// SPDX-License-Identifier: GPL-3.0-only

//! Single in-flight frame pacing

use super::SubmitQueue;

/// Tracks the fence of the last submission so the host never touches a
/// transfer buffer the GPU has not consumed yet.
#[derive(Debug)]
pub struct FramePacer<F> {
    in_flight: Option<F>,
    submitted: u64,
    completed: u64,
}

impl<F> Default for FramePacer<F> {
    fn default() -> Self {
        Self {
            in_flight: None,
            submitted: 0,
            completed: 0,
        }
    }
}

impl<F> FramePacer<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the previous frame, if any. Returns whether a wait happened.
    pub fn begin_frame<Q>(&mut self, queue: &Q) -> bool
    where
        Q: SubmitQueue<Fence = F>,
    {
        match self.in_flight.take() {
            Some(fence) => {
                queue.wait(fence);
                self.completed += 1;
                true
            }
            None => false,
        }
    }

    /// Submit a frame's commands.
    ///
    /// An outstanding fence is waited on first, so at most one frame is ever
    /// in flight even when [`begin_frame`](Self::begin_frame) was skipped.
    pub fn submit<Q>(&mut self, queue: &Q, commands: Q::Commands)
    where
        Q: SubmitQueue<Fence = F>,
    {
        self.begin_frame(queue);
        self.in_flight = Some(queue.submit(commands));
        self.submitted += 1;
    }

    /// Wait for everything submitted so far.
    pub fn drain<Q>(&mut self, queue: &Q)
    where
        Q: SubmitQueue<Fence = F>,
    {
        self.begin_frame(queue);
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn submitted_frames(&self) -> u64 {
        self.submitted
    }

    pub fn completed_frames(&self) -> u64 {
        self.completed
    }
}
