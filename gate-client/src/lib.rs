//! # gate-client
//!
//! A crate for talking to a remote API authorization service.
//!
//! ## Components
//!
//! - **Authorizer:** Trait for obtaining an authorization verdict for an
//!   application id / key / referrer triple.
//! - **HttpAuthorizer:** reqwest-based client for the hosted service.
//! - **MockAuthorizer:** Scripted implementation used in tests.

pub mod error;
pub mod http_authorizer;
pub mod mock_authorizer;
pub mod verdict;

use async_trait::async_trait;

pub use crate::error::AuthorizeError;
pub use crate::http_authorizer::HttpAuthorizer;
pub use crate::mock_authorizer::MockAuthorizer;
pub use crate::verdict::Verdict;

/// Trait defining the core functionality for querying the authorization service.
///
/// A negative verdict is not an error: `authorize` returns `Ok` with
/// `Verdict::authorized == false` when the service denies the caller, and
/// `Err` only when the call itself could not be completed.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Ask the service for a verdict on the given credentials
    async fn authorize(
        &self,
        app_id: &str,
        app_key: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<Verdict, AuthorizeError>;
}

/// Concrete authorizer handle held by the hosting application.
///
/// Enum dispatch avoids a trait object in application state while keeping
/// the implementation swappable for tests.
#[derive(Clone, Debug)]
pub enum AuthorizerType {
    Http(HttpAuthorizer),
    Mock(MockAuthorizer),
}

#[async_trait]
impl Authorizer for AuthorizerType {
    async fn authorize(
        &self,
        app_id: &str,
        app_key: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<Verdict, AuthorizeError> {
        match self {
            Self::Http(authorizer) => authorizer.authorize(app_id, app_key, referrer).await,
            Self::Mock(authorizer) => authorizer.authorize(app_id, app_key, referrer).await,
        }
    }
}
