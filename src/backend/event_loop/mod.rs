mod state;
mod streams;

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use image::GrayImage;

use super::error::Error;
use super::settings::Settings;
use super::store::ProfileStore;
use super::types::{BackendCommand, BackendEvent};

pub use state::{BackendState, LoopAction};
pub use streams::EventStreams;

pub enum LoopEvent {
    CameraFrame(GrayImage),
    /// Capture process exited or its output broke off
    CameraEnded(Error),
    Command(BackendCommand),
    CommandChannelClosed,
}

/// Initialize the backend and send the initial profile list.
/// Returns (BackendState, EventStreams) ready for the event loop.
pub async fn init(
    cmd_rx: Receiver<BackendCommand>,
    evt_tx: Sender<BackendEvent>,
    settings: Settings,
    store: Arc<dyn ProfileStore>,
) -> (BackendState, EventStreams) {
    tracing::info!("Starting backend...");
    tracing::debug!("Settings: {:?}", settings);

    let state = BackendState {
        evt_tx,
        store,
        settings,
    };
    state.refresh_profiles().await;

    let streams = EventStreams {
        cmd_rx,
        camera: None,
    };

    (state, streams)
}

/// Run the backend until `Shutdown` arrives or the UI drops its sender.
pub async fn run(
    cmd_rx: Receiver<BackendCommand>,
    evt_tx: Sender<BackendEvent>,
    settings: Settings,
    store: Arc<dyn ProfileStore>,
) {
    let (mut state, mut streams) = init(cmd_rx, evt_tx, settings, store).await;

    loop {
        let event = streams.next_event().await;
        match state.handle_event(event, &mut streams).await {
            LoopAction::Continue => {}
            LoopAction::Break => break,
        }
    }

    tracing::info!("Backend loop terminated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::import::{ImportAction, ImportRequest};
    use crate::backend::payload::parse_payload;
    use crate::backend::profile::{NetworkProfile, SecurityType};
    use crate::backend::qr::{self, camera};
    use crate::backend::store::memory::MemoryStore;
    use std::io::Cursor;

    fn home() -> NetworkProfile {
        NetworkProfile::new("Home", "Home", SecurityType::WpaPersonal, Some("hunter22".into()))
    }

    /// Run the loop over `commands`, then collect everything it emitted.
    async fn events_for(
        store: Arc<MemoryStore>,
        commands: Vec<BackendCommand>,
    ) -> Vec<BackendEvent> {
        let (cmd_tx, cmd_rx) = async_channel::unbounded();
        let (evt_tx, evt_rx) = async_channel::unbounded();
        for cmd in commands {
            cmd_tx.send(cmd).await.unwrap();
        }
        cmd_tx.send(BackendCommand::Shutdown).await.unwrap();

        let settings = Settings {
            qr_scale: 3,
            ..Settings::default()
        };
        run(cmd_rx, evt_tx, settings, store).await;

        let mut events = Vec::new();
        while let Ok(event) = evt_rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn startup_lists_profiles() {
        let store = Arc::new(MemoryStore::with_profiles(vec![home()]));
        let events = events_for(store, vec![]).await;

        assert!(matches!(events[0], BackendEvent::Loading(true)));
        assert!(matches!(&events[1], BackendEvent::Profiles(p) if p.len() == 1));
        assert!(matches!(events[2], BackendEvent::Loading(false)));
    }

    #[tokio::test]
    async fn show_qr_renders_masked_caption() {
        let store = Arc::new(MemoryStore::with_profiles(vec![home()]));
        let events = events_for(
            store,
            vec![BackendCommand::ShowQr {
                name: "Home".into(),
            }],
        )
        .await;

        let qr = events
            .iter()
            .find_map(|e| match e {
                BackendEvent::QrReady(data) => Some(data),
                _ => None,
            })
            .expect("no QR rendered");
        assert_eq!(qr.payload, "WIFI:T:WPA;S:Home;P:hunter22;;");
        assert!(!qr.caption.contains("hunter22"));
        assert_eq!(&qr.png[1..4], b"PNG");
    }

    #[tokio::test]
    async fn show_qr_for_unknown_security_reports_error() {
        let corp = NetworkProfile::new("Corp", "Corp", SecurityType::Unknown("owe".into()), None);
        let store = Arc::new(MemoryStore::with_profiles(vec![corp]));
        let events = events_for(
            store,
            vec![BackendCommand::ShowQr {
                name: "Corp".into(),
            }],
        )
        .await;

        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::Error(m) if m.contains("Unsupported"))));
        assert!(!events.iter().any(|e| matches!(e, BackendEvent::QrReady(_))));
    }

    #[tokio::test]
    async fn import_refreshes_list() {
        let store = Arc::new(MemoryStore::default());
        let payload = parse_payload("WIFI:T:nopass;S:Cafe;;").unwrap();
        let events = events_for(
            store.clone(),
            vec![BackendCommand::Import(ImportRequest::new(
                payload,
                ImportAction::ConnectNow,
            ))],
        )
        .await;

        assert!(events.iter().any(|e| matches!(
            e,
            BackendEvent::Imported { name, action: ImportAction::ConnectNow } if name == "WiFi_Cafe"
        )));
        assert!(matches!(
            events.iter().rev().find(|e| matches!(e, BackendEvent::Profiles(_))),
            Some(BackendEvent::Profiles(p)) if p.len() == 1
        ));
        assert_eq!(store.activated(), ["WiFi_Cafe"]);
    }

    #[tokio::test]
    async fn scan_file_emits_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");
        std::fs::write(&path, "WIFI:T:WEP;S:Old;P:abcde;;").unwrap();

        let store = Arc::new(MemoryStore::default());
        let events = events_for(store, vec![BackendCommand::ScanFile { path }]).await;

        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::PayloadScanned(p) if p.ssid == "Old")));
    }

    #[tokio::test]
    async fn stop_camera_when_idle_reports_inactive() {
        let store = Arc::new(MemoryStore::default());
        let events = events_for(store, vec![BackendCommand::StopCamera]).await;
        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::CameraActive(false))));
    }

    /// Backend with a fake camera already streaming `raw` frames.
    async fn with_camera(
        raw: Vec<u8>,
        width: u32,
        height: u32,
    ) -> (
        BackendState,
        EventStreams,
        async_channel::Sender<BackendCommand>,
        async_channel::Receiver<BackendEvent>,
    ) {
        let (cmd_tx, cmd_rx) = async_channel::unbounded();
        let (evt_tx, evt_rx) = async_channel::unbounded();
        let store = Arc::new(MemoryStore::default());
        let (state, mut streams) = init(cmd_rx, evt_tx, Settings::default(), store).await;
        streams.camera = Some(camera::frames(Cursor::new(raw), width, height, || async {
            Error::Camera("no signal".into())
        }));
        (state, streams, cmd_tx, evt_rx)
    }

    fn drain(evt_rx: &async_channel::Receiver<BackendEvent>) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        while let Ok(event) = evt_rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn camera_stops_after_first_wifi_code() {
        let code = qr::encode("WIFI:T:WPA;S:Home;P:hunter22;;", 4).unwrap();
        let (width, height) = code.dimensions();
        let mut raw = vec![255u8; (width * height) as usize];
        raw.extend_from_slice(code.as_raw());
        raw.extend_from_slice(code.as_raw());

        let (mut state, mut streams, _cmd_tx, evt_rx) = with_camera(raw, width, height).await;

        // Blank frame, then the code
        for _ in 0..2 {
            let event = streams.next_event().await;
            state.handle_event(event, &mut streams).await;
        }
        assert!(streams.camera.is_none());

        let events = drain(&evt_rx);
        let scanned: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BackendEvent::PayloadScanned(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].ssid, "Home");
        assert_eq!(scanned[0].password, "hunter22");
        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::CameraActive(false))));
        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::CameraPreview(png) if &png[1..4] == b"PNG")));
    }

    #[tokio::test]
    async fn ended_camera_reports_reason() {
        let (mut state, mut streams, _cmd_tx, evt_rx) = with_camera(Vec::new(), 4, 4).await;

        let event = streams.next_event().await;
        assert!(matches!(event, LoopEvent::CameraEnded(Error::Camera(_))));
        state.handle_event(event, &mut streams).await;
        assert!(streams.camera.is_none());

        let events = drain(&evt_rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::CameraActive(false))));
        assert!(events
            .iter()
            .any(|e| matches!(e, BackendEvent::Error(m) if m == "Camera error: no signal")));
    }

    #[tokio::test]
    async fn closed_command_channel_stops_loop() {
        let (cmd_tx, cmd_rx) = async_channel::unbounded::<BackendCommand>();
        let (evt_tx, _evt_rx) = async_channel::unbounded();
        drop(cmd_tx);
        run(cmd_rx, evt_tx, Settings::default(), Arc::new(MemoryStore::default())).await;
    }
}
