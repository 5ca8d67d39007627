//! # lingua-client
//!
//! Client-side session handling for the Lingua API.
//!
//! [`RefreshCoordinator`] sends authenticated requests and, when the access
//! credential is rejected, runs at most one refresh at a time. Requests that
//! fail while a refresh is in flight wait for it and are replayed with the new
//! credential; if the refresh fails, every waiter fails and the local session
//! is cleared.

pub mod authority;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod transport;

pub use authority::{CredentialExchange, HttpAuthority};
pub use config::ClientConfig;
pub use coordinator::{RefreshCoordinator, SessionEvent};
pub use error::{ClientError, ConfigError, ExchangeError, SessionError, TransportError};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession, SubjectSnapshot};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
