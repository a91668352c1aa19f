use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::OnceCell;

use crate::manager::WifiProfile;

mod imp {
    use super::*;
    use std::sync::OnceLock;

    #[derive(Default, gtk::CompositeTemplate)]
    #[template(string = r#"
    <interface>
      <template class="WlqrProfileRow" parent="AdwActionRow">
        <property name="use-markup">false</property>
        <child type="prefix">
          <object class="GtkImage" id="security_icon">
            <property name="icon-name">network-wireless-encrypted-symbolic</property>
            <style>
              <class name="dim-label"/>
            </style>
          </object>
        </child>
        <child type="suffix">
          <object class="GtkButton" id="copy_button">
            <property name="icon-name">edit-copy-symbolic</property>
            <property name="tooltip-text">Copy password</property>
            <property name="valign">center</property>
            <style>
              <class name="flat"/>
            </style>
          </object>
        </child>
        <child type="suffix">
          <object class="GtkButton" id="qr_button">
            <property name="icon-name">view-grid-symbolic</property>
            <property name="tooltip-text">Show QR code</property>
            <property name="valign">center</property>
            <style>
              <class name="flat"/>
            </style>
          </object>
        </child>
      </template>
    </interface>
    "#)]
    pub struct ProfileRow {
        #[template_child]
        pub security_icon: TemplateChild<gtk::Image>,
        #[template_child]
        pub copy_button: TemplateChild<gtk::Button>,
        #[template_child]
        pub qr_button: TemplateChild<gtk::Button>,

        pub profile: OnceCell<WifiProfile>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ProfileRow {
        const NAME: &'static str = "WlqrProfileRow";
        type Type = super::ProfileRow;
        type ParentType = adw::ActionRow;

        fn class_init(klass: &mut Self::Class) {
            klass.bind_template();
        }

        fn instance_init(obj: &glib::subclass::InitializingObject<Self>) {
            obj.init_template();
        }
    }

    impl ObjectImpl for ProfileRow {
        fn signals() -> &'static [glib::subclass::Signal] {
            static SIGNALS: OnceLock<Vec<glib::subclass::Signal>> = OnceLock::new();
            SIGNALS.get_or_init(|| {
                vec![
                    glib::subclass::Signal::builder("copy-clicked").build(),
                    glib::subclass::Signal::builder("qr-clicked").build(),
                ]
            })
        }

        fn constructed(&self) {
            self.parent_constructed();

            self.copy_button.connect_clicked(glib::clone!(
                #[weak(rename_to = row)]
                self,
                move |_| {
                    row.obj().emit_by_name::<()>("copy-clicked", &[]);
                }
            ));
            self.qr_button.connect_clicked(glib::clone!(
                #[weak(rename_to = row)]
                self,
                move |_| {
                    row.obj().emit_by_name::<()>("qr-clicked", &[]);
                }
            ));
        }
    }
    impl WidgetImpl for ProfileRow {}
    impl ListBoxRowImpl for ProfileRow {}
    impl PreferencesRowImpl for ProfileRow {}
    impl ActionRowImpl for ProfileRow {}
}

glib::wrapper! {
    pub struct ProfileRow(ObjectSubclass<imp::ProfileRow>)
        @extends gtk::Widget, gtk::ListBoxRow, adw::PreferencesRow, adw::ActionRow,
        @implements gtk::Accessible, gtk::Actionable, gtk::Buildable, gtk::ConstraintTarget;
}

impl ProfileRow {
    pub fn new(profile: &WifiProfile) -> Self {
        let row: Self = glib::Object::new();
        row.imp().profile.set(profile.clone()).unwrap();
        row.sync_ui();
        row
    }

    pub fn profile(&self) -> &WifiProfile {
        self.imp().profile.get().unwrap()
    }

    fn sync_ui(&self) {
        let profile = self.profile();
        let imp = self.imp();

        self.set_title(&profile.ssid());

        let mut subtitle = profile.security_label();
        if profile.hidden() {
            subtitle.push_str(" · hidden");
        }
        if profile.name() != profile.ssid() {
            subtitle = format!("{subtitle} · {}", profile.name());
        }
        self.set_subtitle(&subtitle);

        imp.security_icon.set_visible(profile.is_secured());
        imp.copy_button.set_visible(profile.has_password());
        imp.qr_button.set_sensitive(profile.is_shareable());
        self.set_activatable(profile.is_shareable());
    }
}
