use adw::prelude::*;
use adw::subclass::prelude::*;
use gtk::glib;
use std::cell::OnceCell;
use std::sync::OnceLock;

use wlqr::backend::{NetworkProfile, SecurityType};

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct WifiProfile {
        pub profile: OnceCell<NetworkProfile>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for WifiProfile {
        const NAME: &'static str = "WlqrWifiProfile";
        type Type = super::WifiProfile;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for WifiProfile {
        fn properties() -> &'static [glib::ParamSpec] {
            static PROPERTIES: OnceLock<Vec<glib::ParamSpec>> = OnceLock::new();
            PROPERTIES.get_or_init(|| {
                vec![
                    glib::ParamSpecString::builder("name").read_only().build(),
                    glib::ParamSpecString::builder("ssid").read_only().build(),
                    glib::ParamSpecString::builder("security").read_only().build(),
                    glib::ParamSpecBoolean::builder("hidden").read_only().build(),
                    glib::ParamSpecBoolean::builder("has-password")
                        .read_only()
                        .build(),
                ]
            })
        }

        fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
            let profile = self.profile.get().unwrap();
            match pspec.name() {
                "name" => profile.name.to_value(),
                "ssid" => profile.ssid.to_value(),
                "security" => profile.security.label().to_value(),
                "hidden" => profile.hidden.to_value(),
                "has-password" => profile.password.is_some().to_value(),
                _ => unimplemented!(),
            }
        }
    }
}

glib::wrapper! {
    pub struct WifiProfile(ObjectSubclass<imp::WifiProfile>);
}

impl WifiProfile {
    pub fn new(profile: NetworkProfile) -> Self {
        let object: Self = glib::Object::new();
        object.imp().profile.set(profile).unwrap();
        object
    }

    fn profile(&self) -> &NetworkProfile {
        self.imp().profile.get().unwrap()
    }

    pub fn name(&self) -> String {
        self.profile().name.clone()
    }

    pub fn ssid(&self) -> String {
        self.profile().ssid.clone()
    }

    pub fn security_label(&self) -> String {
        self.profile().security.label().to_string()
    }

    pub fn hidden(&self) -> bool {
        self.profile().hidden
    }

    /// Stored secret, for copying to the clipboard. Never displayed.
    pub fn password(&self) -> Option<String> {
        self.profile().password.clone()
    }

    pub fn has_password(&self) -> bool {
        self.profile().password.is_some()
    }

    /// Whether a QR code can be produced for this profile
    pub fn is_shareable(&self) -> bool {
        !matches!(self.profile().security, SecurityType::Unknown(_))
    }

    pub fn is_secured(&self) -> bool {
        !self.profile().security.is_open()
    }
}
