//! Record services: the operations the HTTP layer and CLI call.
//!
//! Each operation is one transaction against the [`TabularStore`]. Derived
//! fields (`created_at`, case ids, default status) are filled in here and
//! nowhere else.

mod cases;
mod donations;
mod hospitals;
pub mod model;

pub use model::{
    from_fields, CaseRecord, CaseStatusUpdate, DonationRecord, EmergencyRecord, HospitalRecord, NewCase,
    NewDonation, NewEmergency, NewHospital, Record, DEFAULT_CASE_STATUS,
};

use crate::error::{ResqError, Result};
use crate::schema::{self, Collection};
use crate::store::{Row, TabularStore};
use crate::timestamp::{self, Clock};
use serde::Serialize;

/// Values older writers left behind for "no value".
const NULL_MARKERS: &[&str] = &["nan", "NaN", "None", "NaT", "null"];

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_cases: usize,
    pub total_donations: usize,
    pub total_hospitals: usize,
    pub total_amount: String,
}

pub struct Records {
    store: TabularStore,
    clock: Clock,
}

impl Records {
    pub fn new(store: TabularStore) -> Self {
        Records {
            store,
            clock: timestamp::system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &TabularStore {
        &self.store
    }

    pub(crate) fn now(&self) -> String {
        timestamp::format_timestamp((self.clock)())
    }

    /// Every row of `collection`, with each field present and rendered as
    /// display-safe text.
    pub fn list_all(&self, collection: &str) -> Result<Vec<Row>> {
        let table = self.store.read_all(collection)?;
        Ok(table
            .rows
            .iter()
            .map(|row| {
                table
                    .fields
                    .iter()
                    .map(|field| {
                        let raw = row.get(field).map(String::as_str).unwrap_or("");
                        (field.clone(), display_value(raw))
                    })
                    .collect()
            })
            .collect())
    }

    /// Every row of a registered collection as typed records.
    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        let table = self.store.read_all(R::COLLECTION.as_str())?;
        table.rows.iter().map(R::from_row).collect()
    }

    /// Admin insert into any registered collection.
    ///
    /// Cases go through [`Records::report_case`], so ids and status are
    /// always generated; the new case id is returned. `created_at` is
    /// always stamped here, whatever was submitted.
    pub fn add_record(&self, collection: Collection, mut fields: Row) -> Result<Option<String>> {
        if let Some(extra) = fields
            .keys()
            .find(|k| !collection.fields().contains(&k.as_str()))
        {
            return Err(ResqError::Validation(format!(
                "Unexpected field '{extra}' for collection '{collection}'"
            )));
        }
        fields.remove("created_at");

        match collection {
            Collection::Cases => {
                let case: NewCase = model::from_fields(&fields)?;
                self.report_case(case).map(Some)
            }
            Collection::Donations => {
                let donation: NewDonation = model::from_fields(&fields)?;
                self.add_donation(donation).map(|_| None)
            }
            Collection::Hospitals => {
                let hospital: NewHospital = model::from_fields(&fields)?;
                self.add_hospital(hospital).map(|_| None)
            }
            Collection::Emergency => {
                let emergency: NewEmergency = model::from_fields(&fields)?;
                self.add_emergency(emergency).map(|_| None)
            }
        }
    }

    /// Admin delete. Only cases have an identifier to delete by.
    pub fn delete_record(&self, collection: Collection, id: &str) -> Result<()> {
        match collection {
            Collection::Cases => self.delete_case(id),
            other => Err(ResqError::Unsupported(format!(
                "Delete action not implemented for '{other}'"
            ))),
        }
    }

    pub fn add_emergency(&self, emergency: NewEmergency) -> Result<EmergencyRecord> {
        let record = EmergencyRecord {
            case_id: emergency.case_id.trim().to_string(),
            hospital_id: emergency.hospital_id,
            response_time: emergency.response_time,
            status: emergency.status,
            created_at: self.now(),
        };
        self.store
            .append(Collection::Emergency.as_str(), record.to_row()?)?;
        Ok(record)
    }

    pub fn stats(&self) -> Result<Stats> {
        let donations: Vec<DonationRecord> = self.list()?;
        let total: f64 = donations.iter().map(DonationRecord::amount_value).sum();

        Ok(Stats {
            total_cases: self.store.read_all(Collection::Cases.as_str())?.len(),
            total_donations: donations.len(),
            total_hospitals: self.store.read_all(Collection::Hospitals.as_str())?.len(),
            total_amount: format_rupees(total),
        })
    }

    /// Make sure every registered collection has its file.
    pub fn ensure_all(&self) -> Result<()> {
        for name in schema::collection_names() {
            self.store.ensure(name)?;
        }
        Ok(())
    }
}

/// Blank out null markers and trim surrounding whitespace.
pub fn display_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if NULL_MARKERS.contains(&trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// `₹` with thousands separators and two decimals, e.g. `₹1,234.50`.
pub fn format_rupees(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}₹{grouped}.{cents}")
}
