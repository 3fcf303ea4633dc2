use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::assessment::PatientInfo;

/// Account profile as served by `GET /api/profiles/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
    #[serde(default)]
    pub data_sharing: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_notifications() -> bool {
    true
}

/// Anything that can hand back the signed-in user's profile.
pub trait ProfileSource {
    fn fetch_profile(&self, token: &str) -> anyhow::Result<ProfileSnapshot>;
}

impl ProfileSnapshot {
    /// Whole years between `date_of_birth` and `today`. Unparseable dates yield `None`.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let raw = self.date_of_birth.as_deref()?.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        let born = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        let mut years = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            years -= 1;
        }
        (years >= 0).then_some(years)
    }

    /// Fills gaps in `patient` from the profile. Fields already set win.
    pub fn fill_patient(&self, patient: &mut PatientInfo, today: NaiveDate) {
        if patient.age.is_none() {
            patient.age = self.age_on(today).map(|age| age.to_string());
        }
        if patient.medical_history.is_none() {
            patient.medical_history = self
                .medical_history
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string);
        }
    }
}
