//! Authorization Code + PKCE redirect flow.
//!
//! The flow spans two page loads. [`RedirectClient::get_auth_code`] prepares the request,
//! persists it, and navigates away; [`RedirectClient::handle_redirect_callback`] runs on
//! the callback page, validates the response against the persisted record, and exchanges
//! the code.

pub mod callback;
pub mod exchange;
pub mod pkce;
pub mod redirect;
pub mod request;
pub mod response;
pub mod session;
pub mod state;

pub use callback::*;
pub use exchange::*;
pub use pkce::*;
pub use redirect::*;
pub use request::*;
pub use response::*;
pub use session::*;
pub use state::*;
