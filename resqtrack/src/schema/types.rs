use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResqError;

pub const CASE_FIELDS: &[&str] = &[
    "case_id",
    "reporter_name",
    "reporter_phone",
    "location",
    "animal_type",
    "urgency",
    "notes",
    "media_url",
    "status",
    "assigned_hospital",
    "created_at",
];

pub const DONATION_FIELDS: &[&str] = &["donor_name", "donor_email", "amount", "category", "created_at"];

pub const HOSPITAL_FIELDS: &[&str] = &[
    "name",
    "address",
    "phone",
    "location",
    "api_lat",
    "api_lon",
    "created_at",
];

pub const EMERGENCY_FIELDS: &[&str] = &["case_id", "hospital_id", "response_time", "status", "created_at"];

/// The collections with a registered schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Cases,
    Donations,
    Hospitals,
    Emergency,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Cases,
        Collection::Donations,
        Collection::Hospitals,
        Collection::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Cases => "cases",
            Collection::Donations => "donations",
            Collection::Hospitals => "hospitals",
            Collection::Emergency => "emergency",
        }
    }

    /// Ordered field list; this is also the CSV header order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Cases => CASE_FIELDS,
            Collection::Donations => DONATION_FIELDS,
            Collection::Hospitals => HOSPITAL_FIELDS,
            Collection::Emergency => EMERGENCY_FIELDS,
        }
    }

    pub fn lookup(name: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = ResqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::lookup(s).ok_or_else(|| ResqError::UnknownCollection(s.to_string()))
    }
}
