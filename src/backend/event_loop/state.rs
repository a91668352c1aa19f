use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_channel::Sender;
use image::GrayImage;

use super::super::error::{Error, Result};
use super::super::export;
use super::super::import::{import_payload, ImportRequest};
use super::super::payload::QrPayload;
use super::super::qr::{self, camera};
use super::super::settings::Settings;
use super::super::store::ProfileStore;
use super::super::types::{BackendCommand, BackendEvent, QrCodeData};
use super::streams::EventStreams;
use super::LoopEvent;

pub enum LoopAction {
    Continue,
    Break,
}

pub struct BackendState {
    pub evt_tx: Sender<BackendEvent>,
    pub store: Arc<dyn ProfileStore>,
    pub settings: Settings,
}

impl BackendState {
    pub async fn handle_event(
        &mut self,
        event: LoopEvent,
        streams: &mut EventStreams,
    ) -> LoopAction {
        match event {
            LoopEvent::CameraFrame(frame) => {
                let (payload, preview) = scan_frame(frame).await;
                if let Some(png) = preview {
                    // Previews are dropped rather than queued when the UI lags
                    let _ = self.evt_tx.try_send(BackendEvent::CameraPreview(png));
                }
                if let Some(payload) = payload {
                    tracing::info!("Camera found WiFi QR code for {}", payload.ssid);
                    streams.camera = None;
                    self.send(BackendEvent::CameraActive(false)).await;
                    self.send(BackendEvent::PayloadScanned(payload)).await;
                }
            }

            LoopEvent::CameraEnded(e) => {
                streams.camera = None;
                self.send(BackendEvent::CameraActive(false)).await;
                self.report("Camera stream ended", e).await;
            }

            LoopEvent::Command(cmd) => return self.handle_command(cmd, streams).await,

            LoopEvent::CommandChannelClosed => {
                tracing::info!("Command channel closed, shutting down backend");
                return LoopAction::Break;
            }
        }

        LoopAction::Continue
    }

    async fn handle_command(
        &mut self,
        cmd: BackendCommand,
        streams: &mut EventStreams,
    ) -> LoopAction {
        match cmd {
            BackendCommand::Shutdown => {
                tracing::info!("Backend shutdown requested");
                streams.camera = None;
                return LoopAction::Break;
            }

            BackendCommand::RefreshProfiles => self.refresh_profiles().await,

            BackendCommand::ShowQr { name } => {
                if let Err(e) = self.show_qr(&name).await {
                    self.report(&format!("Failed to show QR code for {name}"), e)
                        .await;
                }
            }

            BackendCommand::ScanFile { path } => match scan_file(path.clone()).await {
                Ok(payload) => {
                    tracing::info!("Found WiFi QR code for {} in {}", payload.ssid, path.display());
                    self.send(BackendEvent::PayloadScanned(payload)).await;
                }
                Err(e) => {
                    self.report(&format!("Failed to scan {}", path.display()), e)
                        .await;
                }
            },

            BackendCommand::StartCamera => {
                if streams.camera.is_some() {
                    tracing::debug!("Camera already running");
                    self.send(BackendEvent::CameraActive(true)).await;
                } else {
                    match camera::open(&self.settings) {
                        Ok(frames) => {
                            streams.camera = Some(frames);
                            self.send(BackendEvent::CameraActive(true)).await;
                        }
                        Err(e) => {
                            self.send(BackendEvent::CameraActive(false)).await;
                            self.report("Failed to start camera", e).await;
                        }
                    }
                }
            }

            BackendCommand::StopCamera => {
                if streams.camera.take().is_some() {
                    tracing::info!("Camera capture stopped");
                }
                self.send(BackendEvent::CameraActive(false)).await;
            }

            BackendCommand::Import(request) => self.import(request).await,

            BackendCommand::ExportPng { path, payload } => {
                let result = export::save_png(&path, &payload, self.settings.qr_scale).await;
                self.finish_export(path, result).await;
            }

            BackendCommand::ExportText { path, payload } => {
                let result = export::save_text(&path, &payload).await;
                self.finish_export(path, result).await;
            }
        }

        LoopAction::Continue
    }

    async fn send(&self, event: BackendEvent) {
        let _ = self.evt_tx.send(event).await;
    }

    async fn report(&self, context: &str, e: Error) {
        tracing::error!("{}: {}", context, e);
        self.send(BackendEvent::Error(e.to_string())).await;
    }

    /// Reload the profile list, bracketed by `Loading` events.
    pub async fn refresh_profiles(&self) {
        self.send(BackendEvent::Loading(true)).await;
        match self.store.list_profiles().await {
            Ok(profiles) => self.send(BackendEvent::Profiles(profiles)).await,
            Err(e) => self.report("Failed to list profiles", e).await,
        }
        self.send(BackendEvent::Loading(false)).await;
    }

    async fn show_qr(&self, name: &str) -> Result<()> {
        let profile = self.store.get_profile_detail(name).await?;
        let payload = QrPayload::from_profile(&profile)?;
        let text = payload.to_string();
        let scale = self.settings.qr_scale;

        let encoded = text.clone();
        let png = tokio::task::spawn_blocking(move || {
            let image = qr::encode(&encoded, scale)?;
            qr::render_png(&image)
        })
        .await
        .map_err(std::io::Error::other)??;

        tracing::info!("Rendered QR code for {} ({} bytes)", profile.name, png.len());
        self.send(BackendEvent::QrReady(QrCodeData {
            profile_name: profile.name,
            ssid: profile.ssid,
            caption: payload.redacted(),
            payload: text,
            png,
        }))
        .await;
        Ok(())
    }

    async fn import(&self, request: ImportRequest) {
        self.send(BackendEvent::Loading(true)).await;
        let result = import_payload(self.store.as_ref(), &request.payload, request.action).await;
        self.send(BackendEvent::Loading(false)).await;

        match result {
            Ok(name) => {
                tracing::info!("Imported {} ({:?})", name, request.action);
                self.send(BackendEvent::Imported {
                    name,
                    action: request.action,
                })
                .await;
                self.refresh_profiles().await;
            }
            Err(e) => {
                // A failed activation may still have saved the profile
                let context = format!("Failed to import {}", request.payload.ssid);
                self.report(&context, e).await;
                self.refresh_profiles().await;
            }
        }
    }

    async fn finish_export(&self, path: PathBuf, result: Result<()>) {
        match result {
            Ok(()) => self.send(BackendEvent::Exported { path }).await,
            Err(e) => {
                self.report(&format!("Failed to export to {}", path.display()), e)
                    .await
            }
        }
    }
}

async fn scan_file(path: PathBuf) -> Result<QrPayload> {
    tokio::task::spawn_blocking(move || qr::scan_file(Path::new(&path)))
        .await
        .map_err(std::io::Error::other)?
}

/// Decode a camera frame and render its preview.
async fn scan_frame(frame: GrayImage) -> (Option<QrPayload>, Option<Vec<u8>>) {
    let task = tokio::task::spawn_blocking(move || {
        let preview = match qr::render_png(&camera::preview(&frame)) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::debug!("Camera preview failed: {}", e);
                None
            }
        };
        (qr::scan_frame(&frame), preview)
    });
    match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Frame decode task failed: {}", e);
            (None, None)
        }
    }
}
