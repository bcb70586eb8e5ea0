//! Preheat policy model.
//!
//! Policies carry their filters and trigger both as structured values
//! and as the serialized JSON text persisted by the policy store. The
//! two forms are kept in sync through [`Policy::decode`] and
//! [`Policy::encode`]; round-trip correctness between them is an
//! invariant (see tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Artifact selection filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Repository,
    Tag,
    Label,
    Signature,
    Vulnerability,
}

/// A single artifact selection filter.
///
/// Filters form an ordered conjunction; evaluation order is the declared
/// order. Pattern semantics belong to the external matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub kind: FilterType,
    pub value: String,
}

/// Trigger activation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[default]
    Manual,
    Scheduled,
    EventBased,
}

/// Trigger settings.
///
/// `job_id` is the opaque scheduler handle. It is meaningful only while
/// the trigger type is [`TriggerType::Scheduled`] and a live scheduler
/// registration exists; for any other type it must be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
}

/// Policy activation trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerType,
    #[serde(rename = "trigger_setting", default)]
    pub settings: TriggerSettings,
}

impl Trigger {
    pub fn is_scheduled(&self) -> bool {
        self.kind == TriggerType::Scheduled
    }

    /// The cron expression, or "" when unset.
    pub fn cron(&self) -> &str {
        self.settings.cron.as_deref().unwrap_or("")
    }
}

/// A declarative preheat rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Numeric ID assigned by the policy store.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: i64,
    /// Structured filters; kept in sync with `filters_str`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    /// Serialized filters as persisted by the policy store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filters_str: String,
    /// Structured trigger; kept in sync with `trigger_str`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    /// Serialized trigger as persisted by the policy store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trigger_str: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_time: Option<DateTime<Utc>>,
}

impl Policy {
    /// Parse the serialized filter/trigger text into the structured form.
    ///
    /// When a serialized form is present it wins over any stale
    /// structured value; an empty serialized form leaves the structured
    /// value untouched.
    pub fn decode(&mut self) -> Result<()> {
        if !self.filters_str.is_empty() {
            self.filters = serde_json::from_str(&self.filters_str)?;
        }
        if !self.trigger_str.is_empty() {
            self.trigger = Some(serde_json::from_str(&self.trigger_str)?);
        }
        Ok(())
    }

    /// Serialize the structured filters/trigger back into text form so
    /// both representations agree before persistence.
    pub fn encode(&mut self) -> Result<()> {
        if !self.filters.is_empty() {
            self.filters_str = serde_json::to_string(&self.filters)?;
        }
        if let Some(trigger) = &self.trigger {
            self.trigger_str = serde_json::to_string(trigger)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled_trigger(cron: &str, job_id: Option<i64>) -> Trigger {
        Trigger {
            kind: TriggerType::Scheduled,
            settings: TriggerSettings {
                cron: Some(cron.to_string()),
                job_id,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Trigger helpers
    // -----------------------------------------------------------------------

    #[test]
    fn test_trigger_is_scheduled() {
        assert!(scheduled_trigger("* * * * *", None).is_scheduled());
        assert!(!Trigger::default().is_scheduled());
    }

    #[test]
    fn test_trigger_cron_defaults_to_empty() {
        assert_eq!(Trigger::default().cron(), "");
        assert_eq!(scheduled_trigger("0 0 * * *", None).cron(), "0 0 * * *");
    }

    // -----------------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------------

    #[test]
    fn test_trigger_wire_format() {
        let trigger = scheduled_trigger("* * * * */1", Some(2));
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["type"], "scheduled");
        assert_eq!(json["trigger_setting"]["cron"], "* * * * */1");
        assert_eq!(json["trigger_setting"]["job_id"], 2);
    }

    #[test]
    fn test_trigger_type_names() {
        assert_eq!(
            serde_json::to_string(&TriggerType::EventBased).unwrap(),
            "\"event_based\""
        );
        assert_eq!(serde_json::to_string(&TriggerType::Manual).unwrap(), "\"manual\"");
    }

    #[test]
    fn test_manual_trigger_omits_empty_settings_fields() {
        let trigger = Trigger::default();
        let json = serde_json::to_string(&trigger).unwrap();
        assert_eq!(json, r#"{"type":"manual","trigger_setting":{}}"#);
    }

    #[test]
    fn test_filter_wire_format() {
        let filters = vec![
            Filter {
                kind: FilterType::Repository,
                value: "library/*".to_string(),
            },
            Filter {
                kind: FilterType::Tag,
                value: "2*".to_string(),
            },
        ];
        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(
            json,
            r#"[{"type":"repository","value":"library/*"},{"type":"tag","value":"2*"}]"#
        );
    }

    // -----------------------------------------------------------------------
    // decode / encode duality
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_parses_serialized_forms() {
        let mut policy = Policy {
            name: "p".to_string(),
            filters_str: r#"[{"type":"repository","value":"library/*"},{"type":"tag","value":"2*"}]"#
                .to_string(),
            trigger_str: r#"{"type":"scheduled","trigger_setting":{"cron":"* * * * */1"}}"#
                .to_string(),
            ..Default::default()
        };
        policy.decode().unwrap();

        assert_eq!(policy.filters.len(), 2);
        assert_eq!(policy.filters[0].kind, FilterType::Repository);
        assert_eq!(policy.filters[1].value, "2*");
        let trigger = policy.trigger.as_ref().unwrap();
        assert!(trigger.is_scheduled());
        assert_eq!(trigger.cron(), "* * * * */1");
        assert!(trigger.settings.job_id.is_none());
    }

    #[test]
    fn test_decode_rejects_malformed_trigger() {
        let mut policy = Policy {
            trigger_str: "{not json".to_string(),
            ..Default::default()
        };
        assert!(policy.decode().is_err());
    }

    #[test]
    fn test_decode_leaves_structured_form_when_strings_empty() {
        let mut policy = Policy {
            trigger: Some(scheduled_trigger("0 0 * * *", Some(9))),
            ..Default::default()
        };
        policy.decode().unwrap();
        assert_eq!(policy.trigger.as_ref().unwrap().settings.job_id, Some(9));
    }

    #[test]
    fn test_encode_syncs_serialized_forms() {
        let mut policy = Policy {
            filters: vec![Filter {
                kind: FilterType::Label,
                value: "prod".to_string(),
            }],
            trigger: Some(scheduled_trigger("0 0 * * *", Some(3))),
            ..Default::default()
        };
        policy.encode().unwrap();

        assert_eq!(policy.filters_str, r#"[{"type":"label","value":"prod"}]"#);
        assert!(policy.trigger_str.contains("\"job_id\":3"));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        // parse(serialize(x)) == x for both filters and trigger
        let filters = vec![
            Filter {
                kind: FilterType::Repository,
                value: "library/*".to_string(),
            },
            Filter {
                kind: FilterType::Vulnerability,
                value: "critical".to_string(),
            },
        ];
        let trigger = scheduled_trigger("*/5 * * * *", Some(42));

        let mut policy = Policy {
            filters: filters.clone(),
            trigger: Some(trigger.clone()),
            ..Default::default()
        };
        policy.encode().unwrap();

        // Wipe the structured form and recover it from the text form.
        policy.filters = vec![];
        policy.trigger = None;
        policy.decode().unwrap();

        assert_eq!(policy.filters, filters);
        assert_eq!(policy.trigger, Some(trigger));
    }
}
