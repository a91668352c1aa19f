use async_channel::Receiver;
use futures::StreamExt;

use super::super::error::Error;
use super::super::qr::camera::FrameStream;
use super::super::types::BackendCommand;
use super::LoopEvent;

pub struct EventStreams {
    pub cmd_rx: Receiver<BackendCommand>,
    /// Live only while a camera scan is running
    pub camera: Option<FrameStream>,
}

impl EventStreams {
    pub async fn next_event(&mut self) -> LoopEvent {
        let Self { cmd_rx, camera } = self;

        tokio::select! {
            // Camera frames
            frame = async {
                match camera.as_mut() {
                    Some(s) => s.next().await,
                    None => std::future::pending().await,
                }
            } => {
                match frame {
                    Some(Ok(frame)) => LoopEvent::CameraFrame(frame),
                    Some(Err(e)) => LoopEvent::CameraEnded(e),
                    None => LoopEvent::CameraEnded(Error::Camera("capture stopped".into())),
                }
            }

            // UI commands
            result = cmd_rx.recv() => {
                match result {
                    Ok(cmd) => LoopEvent::Command(cmd),
                    Err(_) => LoopEvent::CommandChannelClosed,
                }
            }
        }
    }
}
