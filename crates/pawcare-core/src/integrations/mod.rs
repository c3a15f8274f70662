//! Third-party service plumbing. Currently only the calendar
//! provider's OAuth flow lives here.

pub mod oauth;

pub use oauth::{authorize, OAuthConfig, OAuthTokens};
