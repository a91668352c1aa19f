//! Core of wlqr: WiFi QR payloads, NetworkManager profile access and the
//! scan/import workflow. Nothing in here touches GTK, so it builds and tests
//! without the `gui` feature.

pub mod backend;
