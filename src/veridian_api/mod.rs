/// Veridian Identity Cloud API integration module
///
/// This module provides the API client, bearer-token lifecycle handling,
/// the pagination cursor, and type definitions for requests, responses,
/// and error handling.
///
/// ## Call flow
///
/// 1. Caller invokes a resource operation on `VeridianClient`
/// 2. The client ensures an unexpired access token is held (acquiring or
///    refreshing one as needed)
/// 3. The request is issued with the bearer Authorization header
/// 4. The response envelope is decoded into a typed record, a boolean
///    success flag, or a lazy `Cursor` over a paginated list
pub mod client;
pub mod cursor;
pub mod embed;
pub mod resources;
pub mod token;
pub mod types;

pub use client::VeridianClient;
pub use cursor::{Cursor, DEFAULT_LIST_LIMIT, MAX_PAGE_SIZE};
pub use resources::*;
pub use token::{TokenGrant, TokenSet};
pub use types::{
    ApiError, MfaChallenge, MfaDevice, PageInfo, ResponseStatus, SamlAssertionRequest,
    SamlResponse, SessionLoginRequest, SessionResponse, SessionToken, SessionUser,
    VerifyFactorRequest,
};
