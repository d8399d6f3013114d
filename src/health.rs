use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::utils::CircuitState;

// ============================================================================
// Health Reporting
// ============================================================================
//
// Component health as served on /health. The database is required; the
// broker is optional, so losing it only degrades the service.
//
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "status": self.status.as_str(),
            "reason": self.status.reason(),
            "last_check": self.last_check.to_rfc3339(),
        })
    }
}

pub fn database_health(ping: Result<(), String>) -> ComponentHealth {
    let status = match ping {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => HealthStatus::Unhealthy(e),
    };
    ComponentHealth::new("database", status)
}

/// `None` means the service runs without a broker.
pub fn broker_health(circuit: Option<CircuitState>) -> ComponentHealth {
    let status = match circuit {
        None => HealthStatus::Degraded("broker disabled, order events are not published".into()),
        Some(CircuitState::Closed) => HealthStatus::Healthy,
        Some(CircuitState::HalfOpen) => HealthStatus::Degraded("circuit breaker half-open".into()),
        Some(CircuitState::Open) => HealthStatus::Degraded("circuit breaker open".into()),
    };
    ComponentHealth::new("broker", status)
}

/// Worst status across components.
pub fn overall_status(components: &[ComponentHealth]) -> HealthStatus {
    if let Some(c) = components.iter().find(|c| c.status.is_unhealthy()) {
        return HealthStatus::Unhealthy(format!("{} unhealthy", c.name));
    }
    if let Some(c) = components.iter().find(|c| !c.status.is_healthy()) {
        return HealthStatus::Degraded(format!("{} degraded", c.name));
    }
    HealthStatus::Healthy
}

pub fn health_report(components: &[ComponentHealth]) -> Value {
    let overall = overall_status(components);
    json!({
        "status": overall.as_str(),
        "service": "shop-checkout",
        "components": components.iter().map(ComponentHealth::to_json).collect::<Vec<_>>(),
    })
}
