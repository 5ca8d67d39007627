//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use chrono::{DateTime, Utc};
use lingua_core::{Role, SubjectId};
use serde::{Deserialize, Serialize};

/// The authenticated subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectResponse {
    pub id: SubjectId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health of each configured backend; unconfigured ones are omitted
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,
}

fn label(healthy: bool) -> String {
    if healthy { "healthy" } else { "unhealthy" }.to_string()
}

impl ReadinessResponse {
    pub fn ready(database_healthy: Option<bool>, redis_healthy: Option<bool>) -> Self {
        Self {
            status: if Self::all_ok(database_healthy, redis_healthy) {
                "ready"
            } else {
                "not_ready"
            }
            .to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: database_healthy.map(label),
                redis: redis_healthy.map(label),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }

    fn all_ok(database_healthy: Option<bool>, redis_healthy: Option<bool>) -> bool {
        database_healthy.unwrap_or(true) && redis_healthy.unwrap_or(true)
    }
}
