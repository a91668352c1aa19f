mod application;
mod manager;
mod ui;

use application::WlqrApplication;
use gtk::prelude::*;
use gtk::{gio, glib};

const APP_ID: &str = "dev.neoden.wlqr";

fn main() -> glib::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = WlqrApplication::new(APP_ID, &gio::ApplicationFlags::empty());
    app.run()
}
