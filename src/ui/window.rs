use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gio, glib};
use std::cell::OnceCell;

use crate::manager::{WifiProfile, WlqrManager};
use crate::ui::{ImportDialog, ProfileRow, QrPanel};

mod imp {
    use super::*;

    #[derive(Default, gtk::CompositeTemplate)]
    #[template(string = r#"
    <interface>
      <template class="WlqrWindow" parent="AdwApplicationWindow">
        <property name="title">WiFi QR</property>
        <property name="default-width">860</property>
        <property name="default-height">560</property>
        <property name="content">
          <object class="AdwToolbarView">
            <child type="top">
              <object class="AdwHeaderBar">
                <child type="start">
                  <object class="GtkButton" id="refresh_button">
                    <property name="icon-name">view-refresh-symbolic</property>
                    <property name="tooltip-text">Reload saved networks</property>
                  </object>
                </child>
                <child type="start">
                  <object class="GtkSpinner" id="spinner"/>
                </child>
                <child type="end">
                  <object class="GtkButton">
                    <property name="icon-name">help-about-symbolic</property>
                    <property name="tooltip-text">About</property>
                    <property name="action-name">app.about</property>
                  </object>
                </child>
                <child type="end">
                  <object class="GtkToggleButton" id="camera_button">
                    <property name="icon-name">camera-photo-symbolic</property>
                    <property name="tooltip-text">Scan QR code with camera</property>
                  </object>
                </child>
                <child type="end">
                  <object class="GtkButton" id="scan_file_button">
                    <property name="icon-name">document-open-symbolic</property>
                    <property name="tooltip-text">Scan QR code from file</property>
                  </object>
                </child>
              </object>
            </child>
            <property name="content">
              <object class="AdwToastOverlay" id="toast_overlay">
                <property name="child">
                  <object class="GtkBox">
                    <child>
                      <object class="GtkScrolledWindow">
                        <property name="hscrollbar-policy">never</property>
                        <property name="hexpand">true</property>
                        <property name="child">
                          <object class="AdwClamp">
                            <property name="maximum-size">480</property>
                            <property name="margin-top">12</property>
                            <property name="margin-bottom">12</property>
                            <property name="margin-start">12</property>
                            <property name="margin-end">12</property>
                            <property name="child">
                              <object class="GtkListBox" id="profiles_listbox">
                                <property name="selection-mode">none</property>
                                <property name="valign">start</property>
                                <style>
                                  <class name="boxed-list"/>
                                </style>
                              </object>
                            </property>
                          </object>
                        </property>
                      </object>
                    </child>
                    <child>
                      <object class="GtkSeparator">
                        <property name="orientation">vertical</property>
                      </object>
                    </child>
                    <child>
                      <object class="WlqrQrPanel" id="qr_panel">
                        <property name="hexpand">true</property>
                      </object>
                    </child>
                  </object>
                </property>
              </object>
            </property>
          </object>
        </property>
      </template>
    </interface>
    "#)]
    pub struct WlqrWindow {
        #[template_child]
        pub toast_overlay: TemplateChild<adw::ToastOverlay>,
        #[template_child]
        pub refresh_button: TemplateChild<gtk::Button>,
        #[template_child]
        pub scan_file_button: TemplateChild<gtk::Button>,
        #[template_child]
        pub camera_button: TemplateChild<gtk::ToggleButton>,
        #[template_child]
        pub spinner: TemplateChild<gtk::Spinner>,
        #[template_child]
        pub profiles_listbox: TemplateChild<gtk::ListBox>,
        #[template_child]
        pub qr_panel: TemplateChild<QrPanel>,

        pub manager: OnceCell<WlqrManager>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for WlqrWindow {
        const NAME: &'static str = "WlqrWindow";
        type Type = super::WlqrWindow;
        type ParentType = adw::ApplicationWindow;

        fn class_init(klass: &mut Self::Class) {
            QrPanel::ensure_type();
            klass.bind_template();
        }

        fn instance_init(obj: &glib::subclass::InitializingObject<Self>) {
            obj.init_template();
        }
    }

    impl ObjectImpl for WlqrWindow {
        fn constructed(&self) {
            self.parent_constructed();
            self.profiles_listbox
                .set_placeholder(Some(&Self::create_placeholder("No saved WiFi networks")));
        }
    }

    impl WlqrWindow {
        fn create_placeholder(text: &str) -> gtk::Label {
            let label = gtk::Label::new(Some(text));
            label.add_css_class("dim-label");
            label.set_margin_top(24);
            label.set_margin_bottom(24);
            label
        }
    }

    impl WidgetImpl for WlqrWindow {}
    impl WindowImpl for WlqrWindow {}
    impl ApplicationWindowImpl for WlqrWindow {}
    impl AdwApplicationWindowImpl for WlqrWindow {}
}

glib::wrapper! {
    pub struct WlqrWindow(ObjectSubclass<imp::WlqrWindow>)
        @extends gtk::Widget, gtk::Window, gtk::ApplicationWindow, adw::ApplicationWindow,
        @implements gio::ActionGroup, gio::ActionMap, gtk::Accessible, gtk::Buildable,
                    gtk::ConstraintTarget, gtk::Native, gtk::Root, gtk::ShortcutManager;
}

impl WlqrWindow {
    pub fn new(app: &adw::Application, manager: &WlqrManager) -> Self {
        let window: Self = glib::Object::builder()
            .property("application", app)
            .build();

        window.imp().manager.set(manager.clone()).unwrap();
        window.imp().qr_panel.set_manager(manager);
        window.set_manager(manager);

        window
    }

    pub fn manager(&self) -> &WlqrManager {
        self.imp().manager.get().unwrap()
    }

    fn set_manager(&self, manager: &WlqrManager) {
        let imp = self.imp();

        // Spinner and refresh button follow store activity
        manager
            .bind_property("loading", &*imp.spinner, "spinning")
            .sync_create()
            .build();
        manager
            .bind_property("loading", &*imp.refresh_button, "sensitive")
            .sync_create()
            .invert_boolean()
            .build();

        imp.refresh_button.connect_clicked(glib::clone!(
            #[weak]
            manager,
            move |_| manager.request_refresh()
        ));

        imp.scan_file_button.connect_clicked(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |_| window.choose_scan_file()
        ));

        // The toggle mirrors the backend; only user clicks that disagree
        // with it turn into commands
        imp.camera_button.connect_toggled(glib::clone!(
            #[weak]
            manager,
            move |button| {
                if button.is_active() != manager.camera_active() {
                    manager.request_camera(button.is_active());
                }
            }
        ));
        let camera_button = imp.camera_button.get();
        manager.connect_notify_local(Some("camera-active"), move |manager, _| {
            let active = manager.camera_active();
            camera_button.set_active(active);
            if active {
                camera_button.add_css_class("camera-active");
            } else {
                camera_button.remove_css_class("camera-active");
            }
        });

        imp.profiles_listbox.bind_model(
            Some(&manager.profiles()),
            glib::clone!(
                #[weak(rename_to = window)]
                self,
                #[upgrade_or_panic]
                move |item| {
                    let profile = item.downcast_ref::<WifiProfile>().unwrap();
                    window.create_profile_row(profile).upcast()
                }
            ),
        );

        manager.connect_closure(
            "error",
            false,
            glib::closure_local!(
                #[weak(rename_to = window)]
                self,
                move |_manager: WlqrManager, message: String| {
                    window.show_toast(&message);
                }
            ),
        );

        manager.connect_closure(
            "notice",
            false,
            glib::closure_local!(
                #[weak(rename_to = window)]
                self,
                move |_manager: WlqrManager, message: String| {
                    window.show_toast(&message);
                }
            ),
        );

        manager.connect_closure(
            "payload-scanned",
            false,
            glib::closure_local!(
                #[weak(rename_to = window)]
                self,
                move |manager: WlqrManager| {
                    if let Some(payload) = manager.take_scanned() {
                        window.confirm_import(payload);
                    }
                }
            ),
        );
    }

    fn create_profile_row(&self, profile: &WifiProfile) -> ProfileRow {
        let manager = self.manager();
        let row = ProfileRow::new(profile);

        let show_qr = glib::clone!(
            #[weak]
            manager,
            #[weak]
            profile,
            move || manager.request_qr(&profile.name())
        );
        row.connect_activated({
            let show_qr = show_qr.clone();
            move |_| show_qr()
        });
        row.connect_closure(
            "qr-clicked",
            false,
            glib::closure_local!(move |_row: ProfileRow| show_qr()),
        );

        row.connect_closure(
            "copy-clicked",
            false,
            glib::closure_local!(
                #[weak(rename_to = window)]
                self,
                #[weak]
                profile,
                move |_row: ProfileRow| {
                    if let Some(password) = profile.password() {
                        window.clipboard().set_text(&password);
                        window.show_toast(&format!("Password for {} copied", profile.ssid()));
                    }
                }
            ),
        );

        row
    }

    fn choose_scan_file(&self) {
        let images = gtk::FileFilter::new();
        images.set_name(Some("QR code images and text"));
        for suffix in ["png", "jpg", "jpeg", "txt"] {
            images.add_suffix(suffix);
        }
        let all = gtk::FileFilter::new();
        all.set_name(Some("All files"));
        all.add_pattern("*");

        let filters = gio::ListStore::new::<gtk::FileFilter>();
        filters.append(&images);
        filters.append(&all);

        let dialog = gtk::FileDialog::builder()
            .title("Scan QR Code")
            .modal(true)
            .filters(&filters)
            .default_filter(&images)
            .build();

        let manager = self.manager().clone();
        glib::spawn_future_local(glib::clone!(
            #[weak(rename_to = window)]
            self,
            async move {
                match dialog.open_future(Some(&window)).await {
                    Ok(file) => match file.path() {
                        Some(path) => manager.request_scan_file(path),
                        None => window.show_toast("Only local files can be scanned"),
                    },
                    Err(e) if e.matches(gtk::DialogError::Dismissed) => {}
                    Err(e) => tracing::error!("Open dialog failed: {}", e),
                }
            }
        ));
    }

    fn confirm_import(&self, payload: wlqr::backend::QrPayload) {
        let manager = self.manager().clone();
        let dialog = ImportDialog::new(&payload);
        glib::spawn_future_local(glib::clone!(
            #[weak(rename_to = window)]
            self,
            async move {
                match dialog.run(&window).await {
                    Some(action) => manager.request_import(payload, action),
                    None => tracing::info!("Import of {} cancelled", payload.ssid),
                }
            }
        ));
    }

    pub fn show_toast(&self, message: &str) {
        let toast = adw::Toast::new(message);
        self.imp().toast_overlay.add_toast(toast);
    }
}
