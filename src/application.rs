use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gio, glib};

use crate::manager::WlqrManager;
use crate::ui::WlqrWindow;

const STYLE: &str = "
.qr-code {
    background: white;
    padding: 12px;
    border-radius: 12px;
}

.camera-preview {
    border-radius: 12px;
}

.camera-active {
    color: @accent_color;
}
";

mod imp {
    use super::*;
    use std::cell::OnceCell;

    #[derive(Default)]
    pub struct WlqrApplication {
        /// Started with the first window, shared by later ones
        pub manager: OnceCell<WlqrManager>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for WlqrApplication {
        const NAME: &'static str = "WlqrApplication";
        type Type = super::WlqrApplication;
        type ParentType = adw::Application;
    }

    impl ObjectImpl for WlqrApplication {}

    impl ApplicationImpl for WlqrApplication {
        fn startup(&self) {
            self.parent_startup();
            let app = self.obj();
            app.load_style();
            app.setup_actions();
        }

        fn activate(&self) {
            let app = self.obj();
            let manager = self.manager.get_or_init(|| {
                let manager = WlqrManager::new();
                manager.start();
                manager
            });

            match app.active_window() {
                Some(window) => window.present(),
                None => WlqrWindow::new(app.upcast_ref(), manager).present(),
            }
        }

        fn shutdown(&self) {
            if let Some(manager) = self.manager.get() {
                manager.shutdown();
            }
            self.parent_shutdown();
        }
    }

    impl GtkApplicationImpl for WlqrApplication {}
    impl AdwApplicationImpl for WlqrApplication {}
}

glib::wrapper! {
    pub struct WlqrApplication(ObjectSubclass<imp::WlqrApplication>)
        @extends gio::Application, gtk::Application, adw::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl WlqrApplication {
    pub fn new(application_id: &str, flags: &gio::ApplicationFlags) -> Self {
        glib::Object::builder()
            .property("application-id", application_id)
            .property("flags", flags)
            .build()
    }

    fn load_style(&self) {
        let Some(display) = gtk::gdk::Display::default() else {
            tracing::warn!("No default display, skipping stylesheet");
            return;
        };
        let provider = gtk::CssProvider::new();
        provider.load_from_string(STYLE);
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }

    fn setup_actions(&self) {
        let about = gio::ActionEntry::builder("about")
            .activate(|app: &Self, _, _| app.show_about())
            .build();
        let quit = gio::ActionEntry::builder("quit")
            .activate(|app: &Self, _, _| app.quit())
            .build();
        self.add_action_entries([about, quit]);
        self.set_accels_for_action("app.quit", &["<primary>q"]);
    }

    fn show_about(&self) {
        let about = adw::AboutDialog::builder()
            .application_name("WiFi QR")
            .application_icon(crate::APP_ID)
            .developer_name("neoden")
            .version(env!("CARGO_PKG_VERSION"))
            .comments(env!("CARGO_PKG_DESCRIPTION"))
            .build();
        about.present(self.active_window().as_ref());
    }
}
