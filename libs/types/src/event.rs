//! Events published on the push channel

use crate::alert::ClassifiedAlert;
use crate::report::CycleReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Alert,
    CycleReport,
    Test,
}

/// `{type, data, timestamp}` envelope for the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastEvent {
    pub fn alert(alert: &ClassifiedAlert) -> Self {
        Self {
            event_type: EventType::Alert,
            data: serde_json::to_value(alert).unwrap_or(Value::Null),
            timestamp: Utc::now(),
        }
    }

    pub fn cycle_report(report: &CycleReport) -> Self {
        Self {
            event_type: EventType::CycleReport,
            data: serde_json::to_value(report).unwrap_or(Value::Null),
            timestamp: Utc::now(),
        }
    }

    pub fn test(message: &str) -> Self {
        Self {
            event_type: EventType::Test,
            data: json!({ "message": message }),
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
