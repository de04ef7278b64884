use serde::{Deserialize, Serialize};

use crate::domain::lifecycle::TransitionPolicy;
use crate::domain::service::ServiceConfig;

/// Configuration for the clinic_schedule module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClinicScheduleConfig {
    #[serde(default = "default_max_slots_per_batch")]
    pub max_slots_per_batch: usize,
    #[serde(default = "default_max_patient_name_length")]
    pub max_patient_name_length: usize,
    #[serde(default)]
    pub transition_policy: TransitionPolicy,
}

impl Default for ClinicScheduleConfig {
    fn default() -> Self {
        Self {
            max_slots_per_batch: default_max_slots_per_batch(),
            max_patient_name_length: default_max_patient_name_length(),
            transition_policy: TransitionPolicy::default(),
        }
    }
}

impl From<ClinicScheduleConfig> for ServiceConfig {
    fn from(cfg: ClinicScheduleConfig) -> Self {
        Self {
            max_slots_per_batch: cfg.max_slots_per_batch,
            max_patient_name_length: cfg.max_patient_name_length,
            transition_policy: cfg.transition_policy,
        }
    }
}

// One slot per quarter hour across a full day.
fn default_max_slots_per_batch() -> usize {
    96
}

fn default_max_patient_name_length() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: ClinicScheduleConfig =
            serde_json::from_value(serde_json::json!({ "transition_policy": "strict" })).unwrap();
        assert_eq!(cfg.max_slots_per_batch, 96);
        assert_eq!(cfg.max_patient_name_length, 100);
        assert_eq!(cfg.transition_policy, TransitionPolicy::Strict);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<ClinicScheduleConfig, _> =
            serde_json::from_value(serde_json::json!({ "max_slots": 3 }));
        assert!(res.is_err());
    }
}
