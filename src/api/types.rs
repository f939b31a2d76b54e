//! Wire types for the vStats Cloud REST API
//!
//! Field names follow the JSON the cloud sends. Optional fields are
//! `Option` because agents report metrics incrementally and the cloud
//! omits what it does not know yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account owner as returned by `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub plan: String,
    #[serde(default)]
    pub server_limit: i64,
    pub status: String,
}

/// Monitored server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub agent_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ServerMetrics>,
}

/// Point-in-time metrics snapshot reported by an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_avg_1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_avg_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_avg_15: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_free: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_free: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_count: Option<i64>,
}

impl ServerMetrics {
    /// Memory usage as a percentage, when both totals are known
    pub fn memory_percent(&self) -> Option<f64> {
        match (self.memory_used, self.memory_total) {
            (Some(used), Some(total)) if total > 0 => Some(used as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Historical metrics for one server over a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsHistory {
    pub server_id: String,
    pub range: String,
    /// Points in the order the cloud returned them
    #[serde(default)]
    pub data: Vec<MetricsPoint>,
}

/// Single timestamped history point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPoint {
    pub collected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_used: Option<i64>,
}

/// Response of `/api/auth/verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub plan: String,
}

/// Response of `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: User,
    #[serde(default)]
    pub server_count: i64,
    #[serde(default)]
    pub server_limit: i64,
}

/// Response of `/api/servers/{id}/regenerate-key`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentKey {
    pub agent_key: String,
}

/// Response of `/api/servers/{id}/install-command`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallCommand {
    pub command: String,
    pub agent_key: String,
}

/// Response of `/api/servers/{id}/metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub metrics: Option<ServerMetrics>,
}

/// Deployed web dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebInstance {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub cloud_mode: bool,
    #[serde(default)]
    pub ssl_enabled: bool,
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_at: Option<DateTime<Utc>>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Web instance status values driven by this client
pub mod web_status {
    /// Registered, installation not yet confirmed
    pub const PENDING: &str = "pending";
    /// Installation succeeded
    pub const ONLINE: &str = "online";
}

/// Registration payload for `POST /api/web/instances`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebInstanceRegistration {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub url: String,
    pub status: String,
    pub cloud_mode: bool,
    pub ssl_enabled: bool,
}

/// Subscription plan limits for web dashboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPlan {
    pub plan: String,
    /// Negative means unlimited
    pub max_web_apps: i64,
    pub current_count: i64,
    pub is_pro: bool,
}

impl UserPlan {
    /// Whether another web instance may be registered
    pub fn allows_another_web_instance(&self) -> bool {
        self.is_pro || self.max_web_apps < 0 || self.current_count < self.max_web_apps
    }
}

/// Health check result for a web instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebInstanceHealth {
    pub status: String,
    #[serde(default)]
    pub response_time: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub cloud_connected: bool,
    #[serde(default)]
    pub checked_at: Option<DateTime<Utc>>,
}

/// Time range accepted by the history endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum HistoryRange {
    /// Last hour
    #[serde(rename = "1h")]
    #[value(name = "1h")]
    OneHour,
    /// Last 24 hours
    #[serde(rename = "24h")]
    #[value(name = "24h")]
    OneDay,
    /// Last 7 days
    #[serde(rename = "7d")]
    #[value(name = "7d")]
    SevenDays,
    /// Last 30 days
    #[serde(rename = "30d")]
    #[value(name = "30d")]
    ThirtyDays,
}

impl HistoryRange {
    /// Query string value
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRange::OneHour => "1h",
            HistoryRange::OneDay => "24h",
            HistoryRange::SevenDays => "7d",
            HistoryRange::ThirtyDays => "30d",
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_decodes_with_missing_optionals() {
        let server: Server = serde_json::from_value(json!({
            "id": "srv-1",
            "name": "web-01",
            "agent_key": "key",
            "status": "pending",
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(server.name, "web-01");
        assert!(server.metrics.is_none());
        assert!(server.last_seen_at.is_none());
    }

    #[test]
    fn test_memory_percent() {
        let metrics = ServerMetrics {
            memory_total: Some(200),
            memory_used: Some(50),
            ..Default::default()
        };
        assert_eq!(metrics.memory_percent(), Some(25.0));

        let zero_total = ServerMetrics {
            memory_total: Some(0),
            memory_used: Some(50),
            ..Default::default()
        };
        assert_eq!(zero_total.memory_percent(), None);
    }

    #[test]
    fn test_history_keeps_backend_order() {
        let history: MetricsHistory = serde_json::from_value(json!({
            "server_id": "srv-1",
            "range": "1h",
            "data": [
                {"collected_at": "2024-05-01T10:05:00Z", "cpu_usage": 2.0},
                {"collected_at": "2024-05-01T10:00:00Z", "cpu_usage": 1.0}
            ]
        }))
        .unwrap();
        assert_eq!(history.data[0].cpu_usage, Some(2.0));
        assert_eq!(history.data[1].cpu_usage, Some(1.0));
    }

    #[test]
    fn test_plan_capacity() {
        let mut plan = UserPlan {
            plan: "free".to_string(),
            max_web_apps: 1,
            current_count: 1,
            is_pro: false,
        };
        assert!(!plan.allows_another_web_instance());

        plan.current_count = 0;
        assert!(plan.allows_another_web_instance());

        plan.current_count = 10;
        plan.max_web_apps = -1;
        assert!(plan.allows_another_web_instance());

        plan.max_web_apps = 1;
        plan.is_pro = true;
        assert!(plan.allows_another_web_instance());
    }

    #[test]
    fn test_history_range_strings() {
        assert_eq!(HistoryRange::OneHour.as_str(), "1h");
        assert_eq!(HistoryRange::OneDay.to_string(), "24h");
        assert_eq!(
            serde_json::to_string(&HistoryRange::ThirtyDays).unwrap(),
            "\"30d\""
        );
    }
}
