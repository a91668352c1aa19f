//! GObject bridge between the GTK main loop and the tokio backend.

mod profile_object;

use adw::prelude::*;
use adw::subclass::prelude::*;
use async_channel::Sender;
use gtk::{gio, glib};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

use wlqr::backend::event_loop;
use wlqr::backend::{
    BackendCommand, BackendEvent, ImportAction, ImportRequest, NmcliStore, ProfileStore,
    QrCodeData, QrPayload, Settings,
};

pub use profile_object::WifiProfile;

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

mod imp {
    use super::{BackendCommand, QrCodeData, QrPayload, Sender, WifiProfile};
    use adw::prelude::*;
    use adw::subclass::prelude::*;
    use gtk::{gio, glib};
    use std::cell::{Cell, RefCell};
    use std::sync::OnceLock;

    pub struct WlqrManager {
        pub profiles: gio::ListStore,
        pub loading: Cell<bool>,
        pub camera_active: Cell<bool>,
        /// Code currently shown in the QR panel
        pub current_qr: RefCell<Option<QrCodeData>>,
        /// Last scanned payload, waiting for the import dialog
        pub scanned: RefCell<Option<QrPayload>>,
        pub cmd_tx: OnceLock<Sender<BackendCommand>>,
    }

    impl Default for WlqrManager {
        fn default() -> Self {
            Self {
                profiles: gio::ListStore::new::<WifiProfile>(),
                loading: Cell::new(false),
                camera_active: Cell::new(false),
                current_qr: RefCell::new(None),
                scanned: RefCell::new(None),
                cmd_tx: OnceLock::new(),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for WlqrManager {
        const NAME: &'static str = "WlqrManager";
        type Type = super::WlqrManager;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for WlqrManager {
        fn dispose(&self) {
            tracing::debug!("WlqrManager disposing, sending shutdown");
            if let Some(tx) = self.cmd_tx.get() {
                let _ = tx.try_send(BackendCommand::Shutdown);
            }
        }

        fn properties() -> &'static [glib::ParamSpec] {
            static PROPERTIES: OnceLock<Vec<glib::ParamSpec>> = OnceLock::new();
            PROPERTIES.get_or_init(|| {
                vec![
                    glib::ParamSpecBoolean::builder("loading").read_only().build(),
                    glib::ParamSpecBoolean::builder("camera-active")
                        .read_only()
                        .build(),
                ]
            })
        }

        fn signals() -> &'static [glib::subclass::Signal] {
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![
                    glib::subclass::Signal::builder("error")
                        .param_types([String::static_type()])
                        .build(),
                    glib::subclass::Signal::builder("notice")
                        .param_types([String::static_type()])
                        .build(),
                    glib::subclass::Signal::builder("qr-ready").build(),
                    glib::subclass::Signal::builder("payload-scanned").build(),
                    glib::subclass::Signal::builder("camera-preview")
                        .param_types([glib::Bytes::static_type()])
                        .build(),
                ]
            })
        }

        fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
            match pspec.name() {
                "loading" => self.loading.get().to_value(),
                "camera-active" => self.camera_active.get().to_value(),
                _ => unimplemented!(),
            }
        }
    }
}

glib::wrapper! {
    pub struct WlqrManager(ObjectSubclass<imp::WlqrManager>);
}

impl Default for WlqrManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WlqrManager {
    pub fn new() -> Self {
        glib::Object::new()
    }

    pub fn start(&self) {
        let (cmd_tx, cmd_rx) = async_channel::bounded::<BackendCommand>(32);
        let (evt_tx, evt_rx) = async_channel::bounded::<BackendEvent>(32);

        self.imp().cmd_tx.set(cmd_tx).unwrap();

        let settings = Settings::from_env();
        let store: Arc<dyn ProfileStore> = Arc::new(NmcliStore::new(&settings));

        // Spawn backend task
        runtime().spawn(event_loop::run(cmd_rx, evt_tx, settings, store));

        // Handle events on GTK main thread
        let manager = self.clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = evt_rx.recv().await {
                manager.handle_event(event);
            }
        });
    }

    fn handle_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::Loading(loading) => self.set_loading(loading),
            BackendEvent::Profiles(profiles) => {
                tracing::debug!("Showing {} profiles", profiles.len());
                let objects: Vec<WifiProfile> =
                    profiles.into_iter().map(WifiProfile::new).collect();
                let store = &self.imp().profiles;
                store.splice(0, store.n_items(), &objects);
            }
            BackendEvent::QrReady(data) => {
                self.imp().current_qr.replace(Some(data));
                self.emit_by_name::<()>("qr-ready", &[]);
            }
            BackendEvent::PayloadScanned(payload) => {
                tracing::info!("Scanned WiFi QR code for {}", payload.ssid);
                self.imp().scanned.replace(Some(payload));
                self.emit_by_name::<()>("payload-scanned", &[]);
            }
            BackendEvent::CameraActive(active) => self.set_camera_active(active),
            BackendEvent::CameraPreview(png) => {
                // Late frames from a capture that was just stopped
                if self.camera_active() {
                    let bytes = glib::Bytes::from_owned(png);
                    self.emit_by_name::<()>("camera-preview", &[&bytes]);
                }
            }
            BackendEvent::Imported { name, action } => {
                let message = match action {
                    ImportAction::ConnectNow => format!("Connected to {name}"),
                    ImportAction::SaveOnly => format!("Saved profile {name}"),
                };
                self.emit_by_name::<()>("notice", &[&message]);
            }
            BackendEvent::Exported { path } => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.emit_by_name::<()>("notice", &[&format!("Saved {file_name}")]);
            }
            BackendEvent::Error(msg) => {
                tracing::error!("Backend error: {}", msg);
                self.emit_by_name::<()>("error", &[&msg]);
            }
        }
    }

    fn send_command(&self, cmd: BackendCommand) {
        if let Some(tx) = self.imp().cmd_tx.get() {
            let tx = tx.clone();
            glib::spawn_future_local(async move {
                if let Err(e) = tx.send(cmd).await {
                    tracing::error!("Failed to send command: {}", e);
                }
            });
        }
    }

    pub fn profiles(&self) -> gio::ListStore {
        self.imp().profiles.clone()
    }

    fn set_loading(&self, loading: bool) {
        if self.imp().loading.get() != loading {
            self.imp().loading.set(loading);
            self.notify("loading");
        }
    }

    pub fn camera_active(&self) -> bool {
        self.imp().camera_active.get()
    }

    fn set_camera_active(&self, active: bool) {
        self.imp().camera_active.set(active);
        // Also when unchanged: a failed start has to reset the toggle
        self.notify("camera-active");
    }

    pub fn current_qr(&self) -> Option<QrCodeData> {
        self.imp().current_qr.borrow().clone()
    }

    /// Take the payload announced by the last `payload-scanned` signal.
    pub fn take_scanned(&self) -> Option<QrPayload> {
        self.imp().scanned.take()
    }

    pub fn request_refresh(&self) {
        self.send_command(BackendCommand::RefreshProfiles);
    }

    pub fn request_qr(&self, name: &str) {
        self.send_command(BackendCommand::ShowQr {
            name: name.to_string(),
        });
    }

    pub fn request_scan_file(&self, path: PathBuf) {
        self.send_command(BackendCommand::ScanFile { path });
    }

    pub fn request_camera(&self, active: bool) {
        if active {
            self.send_command(BackendCommand::StartCamera);
        } else {
            self.send_command(BackendCommand::StopCamera);
        }
    }

    pub fn request_import(&self, payload: QrPayload, action: ImportAction) {
        self.send_command(BackendCommand::Import(ImportRequest::new(payload, action)));
    }

    pub fn request_export_png(&self, path: PathBuf, payload: String) {
        self.send_command(BackendCommand::ExportPng { path, payload });
    }

    pub fn request_export_text(&self, path: PathBuf, payload: String) {
        self.send_command(BackendCommand::ExportText { path, payload });
    }

    /// Shutdown the backend gracefully
    pub fn shutdown(&self) {
        tracing::info!("Requesting backend shutdown");
        if let Some(tx) = self.imp().cmd_tx.get() {
            // Channel full means the backend stops anyway once the sender drops
            let _ = tx.try_send(BackendCommand::Shutdown);
        }
    }
}
