use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;

use wlqr::backend::{ImportAction, QrPayload, QrSecurity};

const RESPONSE_SAVE: &str = "save";
const RESPONSE_CONNECT: &str = "connect";

mod imp {
    use super::*;

    #[derive(Default, gtk::CompositeTemplate)]
    #[template(string = r#"
    <interface>
      <template class="WlqrImportDialog" parent="AdwAlertDialog">
        <property name="heading">Import WiFi Network</property>
        <property name="body">A WiFi QR code was found. Add this network?</property>
        <property name="default-response">connect</property>
        <property name="close-response">cancel</property>
        <responses>
          <response id="cancel">Cancel</response>
          <response id="save">Save Profile</response>
          <response id="connect" appearance="suggested">Connect Now</response>
        </responses>
        <property name="extra-child">
          <object class="GtkListBox" id="details">
            <property name="selection-mode">none</property>
            <style>
              <class name="boxed-list"/>
            </style>
          </object>
        </property>
      </template>
    </interface>
    "#)]
    pub struct ImportDialog {
        #[template_child]
        pub details: TemplateChild<gtk::ListBox>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ImportDialog {
        const NAME: &'static str = "WlqrImportDialog";
        type Type = super::ImportDialog;
        type ParentType = adw::AlertDialog;

        fn class_init(klass: &mut Self::Class) {
            klass.bind_template();
        }

        fn instance_init(obj: &glib::subclass::InitializingObject<Self>) {
            obj.init_template();
        }
    }

    impl ObjectImpl for ImportDialog {}

    impl WidgetImpl for ImportDialog {}
    impl AdwDialogImpl for ImportDialog {}
    impl AdwAlertDialogImpl for ImportDialog {}
}

glib::wrapper! {
    pub struct ImportDialog(ObjectSubclass<imp::ImportDialog>)
        @extends gtk::Widget, adw::Dialog, adw::AlertDialog,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget;
}

impl ImportDialog {
    pub fn new(payload: &QrPayload) -> Self {
        let dialog: Self = glib::Object::new();

        let details = &dialog.imp().details;
        details.append(&detail_row("Network", &payload.ssid));
        details.append(&detail_row("Security", security_label(payload.security)));
        if payload.security != QrSecurity::NoPass {
            details.append(&detail_row("Password", &payload.masked_password()));
        }
        if payload.hidden {
            details.append(&detail_row("Hidden", "Yes"));
        }

        dialog
    }

    /// Show the dialog and wait for the user's choice. `None` on cancel.
    pub async fn run(self, parent: &impl IsA<gtk::Widget>) -> Option<ImportAction> {
        let response = self.choose_future(Some(parent)).await;
        match response.as_str() {
            RESPONSE_CONNECT => Some(ImportAction::ConnectNow),
            RESPONSE_SAVE => Some(ImportAction::SaveOnly),
            _ => None,
        }
    }
}

fn security_label(security: QrSecurity) -> &'static str {
    match security {
        QrSecurity::NoPass => "Open",
        QrSecurity::Wpa => "WPA/WPA2",
        QrSecurity::Wep => "WEP",
    }
}

fn detail_row(title: &str, value: &str) -> adw::ActionRow {
    let row = adw::ActionRow::builder()
        .title(title)
        .subtitle(value)
        .use_markup(false)
        .build();
    row.add_css_class("property");
    row
}
