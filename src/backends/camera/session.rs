// SPDX-License-Identifier: MPL-2.0

//! Capture session: open, wait for permission, stream frames

use super::pipeline::CameraPipeline;
use super::types::*;
use crate::constants::timing;
use crate::errors::CameraError;
use futures::SinkExt;
use futures::channel::mpsc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which cameras a session may open, tried in order
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// `(index in camera list, device)` pairs
    pub candidates: Vec<(usize, CameraDevice)>,
    pub convert_to_nv12: bool,
}

/// Events produced by [`run_capture`]
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Camera opened and permitted, with its negotiated format
    Opened { index: usize, spec: CameraSpec },
    /// A new frame
    Frame(Arc<CameraFrame>),
    /// Setup failed, the session has ended
    Failed(CameraError),
}

/// Open the first candidate that starts successfully.
pub fn open_first(
    candidates: &[(usize, CameraDevice)],
    convert_to_nv12: bool,
) -> BackendResult<(usize, CameraPipeline)> {
    open_first_with(candidates, |camera| CameraPipeline::open(camera, convert_to_nv12))
}

/// Try `open` on each candidate in order and keep the first that succeeds.
///
/// Failures are logged and skipped. Returns [`CameraError::NoneOpened`] when
/// every candidate failed.
pub fn open_first_with<C, T, F>(
    candidates: &[(usize, C)],
    mut open: F,
) -> BackendResult<(usize, T)>
where
    C: fmt::Display,
    F: FnMut(&C) -> BackendResult<T>,
{
    if candidates.is_empty() {
        return Err(CameraError::NoCameraFound);
    }
    for (index, camera) in candidates {
        match open(camera) {
            Ok(opened) => return Ok((*index, opened)),
            Err(err) => warn!(camera = %camera, error = %err, "Camera failed to open"),
        }
    }
    Err(CameraError::NoneOpened(candidates.len()))
}

/// Poll `source` every `interval` until permission is granted or denied.
pub async fn wait_for_permission<P>(source: &P, interval: Duration) -> BackendResult<()>
where
    P: PermissionSource + ?Sized,
{
    loop {
        match source.permission()? {
            Permission::Granted => return Ok(()),
            Permission::Denied => return Err(CameraError::PermissionDenied),
            Permission::Undetermined => {
                debug!("Waiting for camera permission");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Run a capture session until the receiving side goes away.
///
/// Frames are offered with `try_send`. When the receiver is busy the frame is
/// dropped instead of queued.
pub async fn run_capture<T>(request: CaptureRequest, mut output: mpsc::Sender<T>)
where
    T: From<CaptureEvent>,
{
    let (index, camera) = match open_first(&request.candidates, request.convert_to_nv12) {
        Ok(opened) => opened,
        Err(err) => {
            let _ = output.send(CaptureEvent::Failed(err).into()).await;
            return;
        }
    };

    if let Err(err) = wait_for_permission(&camera, timing::PERMISSION_POLL_INTERVAL).await {
        let _ = output.send(CaptureEvent::Failed(err).into()).await;
        return;
    }

    let spec = match camera.format() {
        Ok(spec) => spec,
        Err(err) => {
            let _ = output.send(CaptureEvent::Failed(err).into()).await;
            return;
        }
    };

    info!(camera = %camera.name(), index, spec = %spec, "Camera ready");
    if output
        .send(CaptureEvent::Opened { index, spec }.into())
        .await
        .is_err()
    {
        return;
    }

    loop {
        match camera.try_acquire_frame() {
            Ok(Some(frame)) => {
                if let Err(err) = output.try_send(CaptureEvent::Frame(Arc::new(frame)).into()) {
                    if err.is_disconnected() {
                        break;
                    }
                    debug!("Receiver busy, dropping frame");
                }
            }
            Ok(None) => tokio::time::sleep(timing::FRAME_POLL_INTERVAL).await,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable frame");
                tokio::time::sleep(timing::FRAME_POLL_INTERVAL).await;
            }
        }
    }

    info!(camera = %camera.name(), "Capture session ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedPermission {
        answers: RefCell<Vec<Permission>>,
        polls: RefCell<usize>,
    }

    impl ScriptedPermission {
        fn new(mut answers: Vec<Permission>) -> Self {
            answers.reverse();
            Self {
                answers: RefCell::new(answers),
                polls: RefCell::new(0),
            }
        }
    }

    impl PermissionSource for ScriptedPermission {
        fn permission(&self) -> BackendResult<Permission> {
            *self.polls.borrow_mut() += 1;
            Ok(self
                .answers
                .borrow_mut()
                .pop()
                .unwrap_or(Permission::Undetermined))
        }
    }

    #[tokio::test]
    async fn test_polls_until_granted() {
        let source = ScriptedPermission::new(vec![
            Permission::Undetermined,
            Permission::Undetermined,
            Permission::Granted,
        ]);
        wait_for_permission(&source, timing::PERMISSION_POLL_INTERVAL)
            .await
            .expect("granted");
        assert_eq!(*source.polls.borrow(), 3);
    }

    #[tokio::test]
    async fn test_denial_is_an_error() {
        let source = ScriptedPermission::new(vec![Permission::Undetermined, Permission::Denied]);
        let result = wait_for_permission(&source, timing::PERMISSION_POLL_INTERVAL).await;
        assert!(matches!(result, Err(CameraError::PermissionDenied)));
    }

    #[test]
    fn test_open_first_without_cameras() {
        let result = open_first(&[], false);
        assert!(matches!(result, Err(CameraError::NoCameraFound)));
    }

    fn refuse(name: &str) -> CameraError {
        CameraError::OpenFailed {
            name: name.to_string(),
            reason: "device busy".to_string(),
        }
    }

    #[test]
    fn test_open_first_skips_failing_camera() {
        let candidates = [(0, "Integrated"), (1, "USB")];
        let mut attempts = Vec::new();
        let (index, opened) = open_first_with(&candidates, |name| {
            attempts.push(*name);
            if *name == "Integrated" {
                Err(refuse(name))
            } else {
                Ok(name.len())
            }
        })
        .expect("second camera opens");
        assert_eq!(index, 1);
        assert_eq!(opened, 3);
        assert_eq!(attempts, vec!["Integrated", "USB"]);
    }

    #[test]
    fn test_open_first_stops_at_first_success() {
        let candidates = [(2, "Front"), (3, "Back")];
        let mut attempts = 0;
        let (index, _) = open_first_with(&candidates, |_| {
            attempts += 1;
            Ok(())
        })
        .expect("first camera opens");
        assert_eq!(index, 2);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_open_first_all_fail() {
        let candidates = [(0, "Integrated"), (1, "USB"), (2, "Capture card")];
        let result = open_first_with(&candidates, |name| Err::<(), _>(refuse(name)));
        assert!(matches!(result, Err(CameraError::NoneOpened(3))));
    }
}
