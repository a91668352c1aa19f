//! Camera capture through an `ffmpeg` child process.
//!
//! ffmpeg reads the V4L2 device, scales whatever the driver delivers to
//! `FRAME_WIDTH`x`FRAME_HEIGHT` and writes raw 8-bit grey frames to stdout,
//! which are cut into `GrayImage`s here. Dropping the stream kills the child.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use futures::Stream;
use image::imageops::{self, FilterType};
use image::GrayImage;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::backend::error::{Error, Result};
use crate::backend::settings::Settings;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;
/// Frames per second requested from ffmpeg
pub const FRAME_RATE: u32 = 5;
/// Width of the preview images sent to the UI
pub const PREVIEW_WIDTH: u32 = 320;

/// Frames until capture stops; the last item is the reason it stopped.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<GrayImage>> + Send>>;

fn capture_args(settings: &Settings) -> Vec<String> {
    vec![
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "v4l2".into(),
        "-video_size".into(),
        format!("{FRAME_WIDTH}x{FRAME_HEIGHT}"),
        "-i".into(),
        settings.camera_device.display().to_string(),
        "-r".into(),
        FRAME_RATE.to_string(),
        // The driver may ignore -video_size; frames must match what we slice
        "-vf".into(),
        format!("scale={FRAME_WIDTH}:{FRAME_HEIGHT}"),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "gray".into(),
        "-".into(),
    ]
}

/// Start capturing from the configured device.
pub fn open(settings: &Settings) -> Result<FrameStream> {
    let mut child = Command::new(&settings.ffmpeg)
        .args(capture_args(settings))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            Error::Camera(format!(
                "cannot start {}: {}",
                settings.ffmpeg.display(),
                e
            ))
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Camera("capture process has no stdout".into()))?;
    let stderr = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut log = String::new();
            if let Err(e) = stderr.read_to_string(&mut log).await {
                tracing::debug!("Reading capture log failed: {}", e);
            }
            log
        })
    });

    tracing::info!(
        "Camera capture started on {}",
        settings.camera_device.display()
    );
    Ok(frames(stdout, FRAME_WIDTH, FRAME_HEIGHT, move || {
        capture_failure(child, stderr)
    }))
}

/// Wait for the capture process and turn its exit into an error.
///
/// The last non-empty line ffmpeg printed is the most useful reason; the exit
/// status is used when it printed nothing.
async fn capture_failure(mut child: Child, stderr: Option<JoinHandle<String>>) -> Error {
    let status = child.wait().await;
    let log = match stderr {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    };

    let reason = log
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match status {
            Ok(status) => format!("capture stopped ({status})"),
            Err(e) => format!("capture stopped: {e}"),
        });
    tracing::warn!("Camera capture ended: {}", reason);
    Error::Camera(reason)
}

/// Cut `reader` into `width`x`height` grey frames.
///
/// When the reader ends, `on_end` runs once and its error is the final item.
/// A short last frame is dropped.
pub(crate) fn frames<R, F, Fut>(reader: R, width: u32, height: u32, on_end: F) -> FrameStream
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Error> + Send,
{
    let frame_len = (width * height) as usize;
    Box::pin(futures::stream::unfold(
        (reader, Some(on_end)),
        move |(mut reader, on_end)| async move {
            let on_end = on_end?;
            let mut buf = vec![0u8; frame_len];
            match reader.read_exact(&mut buf).await {
                Ok(_) => {
                    let frame = GrayImage::from_raw(width, height, buf)?;
                    Some((Ok(frame), (reader, Some(on_end))))
                }
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::UnexpectedEof {
                        tracing::warn!("Camera read failed: {}", e);
                    }
                    Some((Err(on_end().await), (reader, None)))
                }
            }
        },
    ))
}

/// Downscale a frame for display while scanning.
pub fn preview(frame: &GrayImage) -> GrayImage {
    if frame.width() <= PREVIEW_WIDTH {
        return frame.clone();
    }
    let height = (frame.height() * PREVIEW_WIDTH / frame.width()).max(1);
    imageops::resize(frame, PREVIEW_WIDTH, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use image::Luma;
    use std::path::PathBuf;

    fn stopped() -> impl Future<Output = Error> + Send {
        async { Error::Camera("capture stopped".into()) }
    }

    #[tokio::test]
    async fn splits_raw_bytes_into_frames() {
        let mut raw = vec![0u8; 4 * 2];
        raw.extend(vec![255u8; 4 * 2]);
        // Trailing partial frame is dropped
        raw.extend([7u8; 3]);

        let mut stream = frames(std::io::Cursor::new(raw), 4, 2, stopped);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.dimensions(), (4, 2));
        assert_eq!(first.get_pixel(3, 1).0[0], 0);
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.get_pixel(0, 0).0[0], 255);
        assert!(matches!(
            stream.next().await,
            Some(Err(Error::Camera(m))) if m == "capture stopped"
        ));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn capture_args_name_device_and_force_frame_size() {
        let settings = Settings {
            camera_device: PathBuf::from("/dev/video2"),
            ..Settings::default()
        };
        let args = capture_args(&settings);
        let device = args.iter().position(|a| a == "-i").unwrap() + 1;
        assert_eq!(args[device], "/dev/video2");
        assert!(args.contains(&"640x480".to_string()));

        let filter = args.iter().position(|a| a == "-vf").unwrap() + 1;
        assert_eq!(args[filter], "scale=640:480");
        let output = args.iter().position(|a| a == "rawvideo").unwrap();
        assert!(filter < output);
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }

    #[tokio::test]
    async fn missing_ffmpeg_is_camera_error() {
        let settings = Settings {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ..Settings::default()
        };
        assert!(matches!(open(&settings), Err(Error::Camera(_))));
    }

    #[tokio::test]
    async fn failed_capture_reports_exit() {
        // `false` ignores its arguments and exits 1 without output
        let settings = Settings {
            ffmpeg: PathBuf::from("false"),
            ..Settings::default()
        };
        let mut stream = open(&settings).unwrap();
        match stream.next().await {
            Some(Err(Error::Camera(reason))) => assert!(reason.contains("exit"), "{reason}"),
            other => panic!("expected camera error, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn failed_capture_reports_stderr() {
        // sh rejects ffmpeg's flags and says why on stderr
        let settings = Settings {
            ffmpeg: PathBuf::from("sh"),
            ..Settings::default()
        };
        let mut stream = open(&settings).unwrap();
        match stream.next().await {
            Some(Err(Error::Camera(reason))) => {
                assert!(!reason.is_empty());
                assert!(!reason.starts_with("capture stopped"), "{reason}");
            }
            other => panic!("expected camera error, got {:?}", other.map(|r| r.is_ok())),
        }
    }

    #[test]
    fn preview_is_downscaled() {
        let frame = GrayImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Luma([128]));
        assert_eq!(preview(&frame).dimensions(), (PREVIEW_WIDTH, 240));

        let small = GrayImage::from_pixel(100, 50, Luma([0]));
        assert_eq!(preview(&small).dimensions(), (100, 50));
    }
}
