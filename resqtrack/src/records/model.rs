// Typed rows for each registered collection, and the submitted inputs
// that create or change them.

use crate::error::{ResqError, Result};
use crate::schema::Collection;
use crate::store::Row;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CASE_STATUS: &str = "Reported";

/// A typed view of one row of a registered collection.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn to_row(&self) -> Result<Row> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(field, value)| (field, scalar_text(value)))
                .collect()),
            other => Err(ResqError::malformed(
                Self::COLLECTION.as_str(),
                format!("record serialized to {other}, expected an object"),
            )),
        }
    }

    /// Convert a stored row; a row that does not fit is malformed storage.
    fn from_row(row: &Row) -> Result<Self> {
        row_to_value(row)
            .map_err(|e| ResqError::malformed(Self::COLLECTION.as_str(), e.to_string()))
    }
}

/// Decode submitted form fields into an input struct.
pub fn from_fields<T: DeserializeOwned>(fields: &Row) -> Result<T> {
    row_to_value(fields).map_err(|e| ResqError::Validation(e.to_string()))
}

fn row_to_value<T: DeserializeOwned>(row: &Row) -> std::result::Result<T, serde_json::Error> {
    let map: serde_json::Map<String, serde_json::Value> = row
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(map))
}

fn scalar_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseRecord {
    pub case_id: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub location: String,
    pub animal_type: String,
    pub urgency: String,
    pub notes: String,
    pub media_url: String,
    pub status: String,
    pub assigned_hospital: String,
    pub created_at: String,
}

impl Record for CaseRecord {
    const COLLECTION: Collection = Collection::Cases;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationRecord {
    pub donor_name: String,
    pub donor_email: String,
    pub amount: String,
    pub category: String,
    pub created_at: String,
}

impl Record for DonationRecord {
    const COLLECTION: Collection = Collection::Donations;
}

impl DonationRecord {
    /// Amount as a number; blank or non-numeric amounts count as zero.
    pub fn amount_value(&self) -> f64 {
        parse_number(&self.amount).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalRecord {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub location: String,
    pub api_lat: String,
    pub api_lon: String,
    pub created_at: String,
}

impl Record for HospitalRecord {
    const COLLECTION: Collection = Collection::Hospitals;
}

/// Reserved for hospital responses to a case; only the admin surface
/// writes these today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyRecord {
    pub case_id: String,
    pub hospital_id: String,
    pub response_time: String,
    pub status: String,
    pub created_at: String,
}

impl Record for EmergencyRecord {
    const COLLECTION: Collection = Collection::Emergency;
}

/// A case report as submitted by a reporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewCase {
    pub reporter_name: String,
    pub reporter_phone: String,
    pub location: String,
    pub animal_type: String,
    pub urgency: String,
    pub notes: String,
    pub media_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseStatusUpdate {
    pub case_id: String,
    pub status: String,
    pub assigned_hospital: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewDonation {
    pub donor_name: String,
    pub donor_email: String,
    pub amount: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewHospital {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub location: String,
    pub api_lat: String,
    pub api_lon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewEmergency {
    pub case_id: String,
    pub hospital_id: String,
    pub response_time: String,
    pub status: String,
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_record_row_has_every_field() {
        let record = CaseRecord {
            case_id: "RSQ-00003".into(),
            status: DEFAULT_CASE_STATUS.into(),
            ..Default::default()
        };
        let row = record.to_row().unwrap();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        let mut expected = Collection::Cases.fields().to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(CaseRecord::from_row(&row).unwrap(), record);
    }

    #[test]
    fn test_donation_amount_value() {
        let mut donation = DonationRecord {
            amount: " 1500.25 ".into(),
            ..Default::default()
        };
        assert_eq!(donation.amount_value(), 1500.25);
        donation.amount = "five hundred".into();
        assert_eq!(donation.amount_value(), 0.0);
        donation.amount = "NaN".into();
        assert_eq!(donation.amount_value(), 0.0);
    }

    #[test]
    fn test_status_update_from_fields() {
        let fields: Row = [("case_id", "RSQ-00001"), ("status", "Rescued")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let update: CaseStatusUpdate = from_fields(&fields).unwrap();
        assert_eq!(update.case_id, "RSQ-00001");
        assert_eq!(update.assigned_hospital, None);
    }
}
