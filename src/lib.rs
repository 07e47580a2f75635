//! Veridian SDK
//!
//! A Rust client library for the Veridian Identity Cloud API.
//!
//! This SDK provides:
//! - Bearer-token lifecycle management (acquire, transparent refresh, revoke)
//! - Lazy cursor-based pagination over list endpoints
//! - Typed operations for user, role, group, event, session, and
//!   SAML-assertion resources
//! - Parsing for the legacy XML embedded-apps endpoint
//!
//! # Example
//!
//! ```no_run
//! use veridian_sdk::VeridianClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = VeridianClient::new(
//!     "https://api.us.veridian.example",
//!     "client-id",
//!     "client-secret",
//! );
//!
//! // Token acquisition happens lazily before the first authenticated call
//! let mut users = client.get_users(Vec::new()).await?;
//! while let Some(user) = users.next_record().await? {
//!     println!("{}: {:?}", user.id, user.email);
//! }
//!
//! // Fixed-limit lists are capped client-side across pages
//! let roles = client.get_roles(Some(25)).await?.collect_all().await?;
//! println!("{} roles", roles.len());
//! # Ok(())
//! # }
//! ```

pub mod veridian_api;

// Re-export commonly used types and functions
pub use veridian_api::{
    client::VeridianClient,
    cursor::{Cursor, DEFAULT_LIST_LIMIT, MAX_PAGE_SIZE},
    resources::{EmbedApp, Event, EventType, Group, Role, User},
    token::{TokenGrant, TokenSet},
    types::{
        ApiError, MfaChallenge, MfaDevice, PageInfo, ResponseStatus, SamlAssertionRequest,
        SamlResponse, SessionLoginRequest, SessionResponse, SessionToken, SessionUser,
        VerifyFactorRequest,
    },
};
