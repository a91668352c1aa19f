mod import_dialog;
mod profile_row;
mod qr_panel;
mod window;

pub use import_dialog::ImportDialog;
pub use profile_row::ProfileRow;
pub use qr_panel::QrPanel;
pub use window::WlqrWindow;
