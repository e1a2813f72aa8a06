//! IMAP command handlers for the fake server.
//!
//! One module per command the exporter sends: LOGIN, LIST, STATUS and
//! LOGOUT.

mod login;
mod status;

pub use list::handle_list;
pub use login::handle_login;
pub use logout::handle_logout;
pub use status::handle_status;
