pub mod duckdb;
pub mod render;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::base::types::{QueryResponse, QueryResult, Res};

// Traits.

/// Generic query backend trait that clients must implement.
///
/// This trait defines the single call the relay makes to the backend.
/// Implementing this trait allows different query services to be used
/// with the relay.
#[async_trait]
pub trait GenericQueryClient: Send + Sync + 'static {
    /// Submit a free-text prompt and return the tabular result.
    ///
    /// Any failure (connection, setup, or the query itself) is returned as an error.
    async fn query(&self, prompt: &str) -> Res<QueryResult>;
}

// Structs.

/// Query client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<dyn GenericQueryClient>,
}

impl Deref for QueryClient {
    type Target = dyn GenericQueryClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl QueryClient {
    pub fn new(inner: Arc<dyn GenericQueryClient>) -> Self {
        Self { inner }
    }

    /// Run a prompt and render the outcome.
    ///
    /// Never fails: backend errors become an error summary with no artifact.
    #[instrument(name = "QueryClient::execute", skip_all)]
    pub async fn execute(&self, prompt: &str) -> QueryResponse {
        let result = self.inner.query(prompt).await;

        if let Err(err) = &result {
            warn!("Query backend failed: {:#}", err);
        }

        render::render_response(result)
    }
}
