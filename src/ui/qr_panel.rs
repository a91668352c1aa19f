use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::{gdk, glib};
use std::cell::{OnceCell, RefCell};
use std::path::PathBuf;

use crate::manager::WlqrManager;
use wlqr::backend::QrCodeData;

#[derive(Clone, Copy)]
enum ExportKind {
    Png,
    Text,
}

mod imp {
    use super::*;

    #[derive(Default, gtk::CompositeTemplate)]
    #[template(string = r#"
    <interface>
      <template class="WlqrQrPanel" parent="AdwBin">
        <property name="child">
          <object class="GtkStack" id="stack">
            <child>
              <object class="GtkStackPage">
                <property name="name">empty</property>
                <property name="child">
                  <object class="AdwStatusPage">
                    <property name="icon-name">view-grid-symbolic</property>
                    <property name="title">No QR Code</property>
                    <property name="description">Select a saved network to share it</property>
                    <style>
                      <class name="compact"/>
                    </style>
                  </object>
                </property>
              </object>
            </child>
            <child>
              <object class="GtkStackPage">
                <property name="name">code</property>
                <property name="child">
                  <object class="GtkBox">
                    <property name="orientation">vertical</property>
                    <property name="spacing">12</property>
                    <property name="valign">center</property>
                    <property name="margin-top">24</property>
                    <property name="margin-bottom">24</property>
                    <property name="margin-start">24</property>
                    <property name="margin-end">24</property>
                    <child>
                      <object class="GtkLabel" id="title">
                        <property name="wrap">true</property>
                        <style>
                          <class name="title-2"/>
                        </style>
                      </object>
                    </child>
                    <child>
                      <object class="GtkPicture" id="picture">
                        <property name="width-request">280</property>
                        <property name="height-request">280</property>
                        <property name="can-shrink">true</property>
                        <property name="content-fit">contain</property>
                        <style>
                          <class name="qr-code"/>
                        </style>
                      </object>
                    </child>
                    <child>
                      <object class="GtkLabel" id="caption">
                        <property name="wrap">true</property>
                        <property name="wrap-mode">char</property>
                        <property name="selectable">true</property>
                        <style>
                          <class name="monospace"/>
                          <class name="dim-label"/>
                        </style>
                      </object>
                    </child>
                    <child>
                      <object class="GtkBox">
                        <property name="spacing">12</property>
                        <property name="halign">center</property>
                        <child>
                          <object class="GtkButton" id="save_png_button">
                            <property name="label">Save PNG…</property>
                            <style>
                              <class name="pill"/>
                            </style>
                          </object>
                        </child>
                        <child>
                          <object class="GtkButton" id="save_text_button">
                            <property name="label">Save text…</property>
                            <style>
                              <class name="pill"/>
                            </style>
                          </object>
                        </child>
                      </object>
                    </child>
                  </object>
                </property>
              </object>
            </child>
            <child>
              <object class="GtkStackPage">
                <property name="name">camera</property>
                <property name="child">
                  <object class="GtkBox">
                    <property name="orientation">vertical</property>
                    <property name="spacing">12</property>
                    <property name="valign">center</property>
                    <property name="margin-top">24</property>
                    <property name="margin-bottom">24</property>
                    <property name="margin-start">24</property>
                    <property name="margin-end">24</property>
                    <child>
                      <object class="GtkPicture" id="preview">
                        <property name="width-request">320</property>
                        <property name="height-request">240</property>
                        <property name="can-shrink">true</property>
                        <property name="content-fit">contain</property>
                        <style>
                          <class name="camera-preview"/>
                        </style>
                      </object>
                    </child>
                    <child>
                      <object class="GtkLabel">
                        <property name="label">Point the camera at a WiFi QR code</property>
                        <property name="wrap">true</property>
                        <style>
                          <class name="dim-label"/>
                        </style>
                      </object>
                    </child>
                  </object>
                </property>
              </object>
            </child>
          </object>
        </property>
      </template>
    </interface>
    "#)]
    pub struct QrPanel {
        #[template_child]
        pub stack: TemplateChild<gtk::Stack>,
        #[template_child]
        pub picture: TemplateChild<gtk::Picture>,
        #[template_child]
        pub title: TemplateChild<gtk::Label>,
        #[template_child]
        pub caption: TemplateChild<gtk::Label>,
        #[template_child]
        pub save_png_button: TemplateChild<gtk::Button>,
        #[template_child]
        pub save_text_button: TemplateChild<gtk::Button>,
        #[template_child]
        pub preview: TemplateChild<gtk::Picture>,

        pub code: RefCell<Option<QrCodeData>>,
        pub manager: OnceCell<WlqrManager>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for QrPanel {
        const NAME: &'static str = "WlqrQrPanel";
        type Type = super::QrPanel;
        type ParentType = adw::Bin;

        fn class_init(klass: &mut Self::Class) {
            klass.bind_template();
        }

        fn instance_init(obj: &glib::subclass::InitializingObject<Self>) {
            obj.init_template();
        }
    }

    impl ObjectImpl for QrPanel {
        fn constructed(&self) {
            self.parent_constructed();

            self.save_png_button.connect_clicked(glib::clone!(
                #[weak(rename_to = panel)]
                self,
                move |_| {
                    panel.obj().export(ExportKind::Png);
                }
            ));
            self.save_text_button.connect_clicked(glib::clone!(
                #[weak(rename_to = panel)]
                self,
                move |_| {
                    panel.obj().export(ExportKind::Text);
                }
            ));
        }
    }

    impl WidgetImpl for QrPanel {}
    impl BinImpl for QrPanel {}
}

glib::wrapper! {
    pub struct QrPanel(ObjectSubclass<imp::QrPanel>)
        @extends gtk::Widget, adw::Bin,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget;
}

impl Default for QrPanel {
    fn default() -> Self {
        glib::Object::new()
    }
}

impl QrPanel {
    pub fn set_manager(&self, manager: &WlqrManager) {
        self.imp().manager.set(manager.clone()).unwrap();

        manager.connect_closure(
            "qr-ready",
            false,
            glib::closure_local!(
                #[weak(rename_to = panel)]
                self,
                move |manager: WlqrManager| {
                    if let Some(code) = manager.current_qr() {
                        panel.show_code(code);
                    }
                }
            ),
        );

        manager.connect_closure(
            "camera-preview",
            false,
            glib::closure_local!(
                #[weak(rename_to = panel)]
                self,
                move |_manager: WlqrManager, png: glib::Bytes| {
                    panel.show_preview(&png);
                }
            ),
        );

        manager.connect_notify_local(
            Some("camera-active"),
            glib::clone!(
                #[weak(rename_to = panel)]
                self,
                move |manager, _| panel.sync_page(manager.camera_active())
            ),
        );
    }

    fn sync_page(&self, camera_active: bool) {
        let imp = self.imp();
        let page = if camera_active {
            "camera"
        } else {
            imp.preview.set_paintable(gdk::Paintable::NONE);
            if imp.code.borrow().is_some() {
                "code"
            } else {
                "empty"
            }
        };
        imp.stack.set_visible_child_name(page);
    }

    fn show_preview(&self, png: &glib::Bytes) {
        match gdk::Texture::from_bytes(png) {
            Ok(texture) => self.imp().preview.set_paintable(Some(&texture)),
            Err(e) => tracing::debug!("Failed to load camera preview: {}", e),
        }
    }

    fn show_code(&self, code: QrCodeData) {
        let imp = self.imp();
        let bytes = glib::Bytes::from_owned(code.png.clone());
        match gdk::Texture::from_bytes(&bytes) {
            Ok(texture) => imp.picture.set_paintable(Some(&texture)),
            Err(e) => {
                tracing::error!("Failed to load QR image: {}", e);
                return;
            }
        }

        imp.title.set_label(&code.ssid);
        imp.caption.set_label(&code.caption);
        imp.stack.set_visible_child_name("code");
        imp.code.replace(Some(code));
    }

    fn export(&self, kind: ExportKind) {
        let Some(code) = self.imp().code.borrow().clone() else {
            return;
        };
        let Some(manager) = self.imp().manager.get().cloned() else {
            return;
        };

        let (title, extension) = match kind {
            ExportKind::Png => ("Save QR Code Image", "png"),
            ExportKind::Text => ("Save QR Code Text", "txt"),
        };
        let dialog = gtk::FileDialog::builder()
            .title(title)
            .modal(true)
            .initial_name(format!("{}.{extension}", code.profile_name))
            .build();
        let window = self.root().and_downcast::<gtk::Window>();

        glib::spawn_future_local(async move {
            let file = match dialog.save_future(window.as_ref()).await {
                Ok(file) => file,
                Err(e) if e.matches(gtk::DialogError::Dismissed) => return,
                Err(e) => {
                    tracing::error!("Save dialog failed: {}", e);
                    return;
                }
            };
            let Some(path) = file.path() else {
                tracing::warn!("Cannot save to non-local file {}", file.uri());
                return;
            };
            send_export(&manager, kind, path, code.payload);
        });
    }
}

fn send_export(manager: &WlqrManager, kind: ExportKind, path: PathBuf, payload: String) {
    match kind {
        ExportKind::Png => manager.request_export_png(path, payload),
        ExportKind::Text => manager.request_export_text(path, payload),
    }
}
