use std::fmt::Formatter;

use uuid::Uuid;

use crate::Environment;

/// Per-request information shared with every collaborator involved in serving
/// that request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    environment: Environment,
    request_id: RequestId,
}

impl RequestContext {
    /// Create a context for a new request, with a freshly generated [`RequestId`].
    pub fn create(environment: Environment) -> Self {
        Self::new(RequestId::generate(), environment)
    }

    pub fn new(request_id: RequestId, environment: Environment) -> Self {
        Self {
            environment,
            request_id,
        }
    }

    /// The environment the request is targeting.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

/// A unique identifier generated for each incoming request.
#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new request id using a UUID v7, i.e. a random number
    /// combined with the current (UNIX) timestamp.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Access the underlying UUID.
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for RequestId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
