//! Subscription plans and the limits they impose.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::types::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

/// What a plan allows. `None` limits mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanFeatures {
    pub max_daily_events: Option<usize>,
    pub history_days: Option<i64>,
    pub analytics: bool,
    pub export_data: bool,
}

impl Plan {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    #[must_use]
    pub const fn features(self) -> PlanFeatures {
        match self {
            Self::Free => PlanFeatures {
                max_daily_events: Some(10),
                history_days: Some(7),
                analytics: false,
                export_data: false,
            },
            Self::Premium => PlanFeatures {
                max_daily_events: None,
                history_days: None,
                analytics: true,
                export_data: true,
            },
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            _ => Err(ValidationError::InvalidPlan {
                value: s.to_string(),
            }),
        }
    }
}

/// A plan together with its optional expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<FixedOffset>>,
}

impl Subscription {
    /// The plan in force at `now`. An expired subscription falls back to free.
    #[must_use]
    pub fn effective_plan(&self, now: DateTime<FixedOffset>) -> Plan {
        match self.expires_at {
            Some(expiry) if expiry < now => Plan::Free,
            _ => self.plan,
        }
    }
}

/// Whether another event may be logged today.
pub fn can_add_event(plan: Plan, events_today: usize) -> bool {
    plan.features()
        .max_daily_events
        .is_none_or(|max| events_today < max)
}

/// Events the plan lets the user see, oldest first.
pub fn visible_history<'a>(events: &'a [Event], plan: Plan, now: DateTime<FixedOffset>) -> Vec<&'a Event> {
    match plan.features().history_days {
        Some(days) => {
            let cutoff = now - Duration::days(days);
            events.iter().filter(|e| e.timestamp >= cutoff).collect()
        }
        None => events.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_type::EventType;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn free_plan_caps_daily_events() {
        assert!(can_add_event(Plan::Free, 9));
        assert!(!can_add_event(Plan::Free, 10));
        assert!(can_add_event(Plan::Premium, 10_000));
    }

    #[test]
    fn expired_premium_is_free() {
        let sub = Subscription {
            plan: Plan::Premium,
            expires_at: Some(at("2025-03-01T00:00:00Z")),
        };
        assert_eq!(sub.effective_plan(at("2025-02-01T00:00:00Z")), Plan::Premium);
        assert_eq!(sub.effective_plan(at("2025-03-02T00:00:00Z")), Plan::Free);

        let open_ended = Subscription {
            plan: Plan::Premium,
            expires_at: None,
        };
        assert_eq!(open_ended.effective_plan(at("2099-01-01T00:00:00Z")), Plan::Premium);
    }

    #[test]
    fn free_history_is_seven_days() {
        let now = at("2025-03-08T12:00:00Z");
        let events = vec![
            Event::new(EventType::Fed, at("2025-02-28T12:00:00Z")),
            Event::new(EventType::Fed, at("2025-03-01T12:00:00Z")),
            Event::new(EventType::Fed, at("2025-03-08T11:00:00Z")),
        ];
        assert_eq!(visible_history(&events, Plan::Free, now).len(), 2);
        assert_eq!(visible_history(&events, Plan::Premium, now).len(), 3);
    }

    #[test]
    fn parse_plan() {
        assert_eq!("Premium".parse::<Plan>().unwrap(), Plan::Premium);
        assert_eq!(
            "gold".parse::<Plan>().unwrap_err(),
            ValidationError::InvalidPlan {
                value: "gold".into()
            }
        );
    }
}
