use super::model::{CaseRecord, CaseStatusUpdate, NewCase, Record, DEFAULT_CASE_STATUS};
use super::Records;
use crate::error::{ResqError, Result};
use crate::id;
use crate::schema::Collection;
use crate::store::Row;

const CASES: &str = "cases";

fn matches_case(id: &str) -> impl Fn(&Row) -> bool + '_ {
    move |row: &Row| row.get("case_id").map(String::as_str) == Some(id)
}

impl Records {
    /// Store a new case and return its generated id.
    ///
    /// The id is derived and the row appended under one collection lock, so
    /// concurrent reports never share an id.
    pub fn report_case(&self, case: NewCase) -> Result<String> {
        let created_at = self.now();
        let case_id = self.store.modify(CASES, |table| {
            let case_id = id::next_case_id(table)?;
            let record = CaseRecord {
                case_id: case_id.clone(),
                reporter_name: case.reporter_name,
                reporter_phone: case.reporter_phone,
                location: case.location,
                animal_type: case.animal_type,
                urgency: case.urgency,
                notes: case.notes,
                media_url: case.media_url,
                status: DEFAULT_CASE_STATUS.to_string(),
                assigned_hospital: String::new(),
                created_at,
            };
            table.insert(CASES, record.to_row()?)?;
            Ok(case_id)
        })?;

        log::info!("Reported case {case_id}");
        Ok(case_id)
    }

    /// The id the next reported case would receive.
    pub fn next_case_id(&self) -> Result<String> {
        id::next_case_id(&self.store.read_all(CASES)?)
    }

    pub fn get_case(&self, case_id: &str) -> Result<CaseRecord> {
        let table = self.store.read_all(CASES)?;
        let is_case = matches_case(case_id);
        let row = table
            .rows
            .iter()
            .find(|&row| is_case(row))
            .ok_or_else(|| not_found(case_id))?;
        CaseRecord::from_row(row)
    }

    pub fn list_cases(&self) -> Result<Vec<CaseRecord>> {
        self.list()
    }

    /// Set a case's status, and its hospital when one is given.
    pub fn update_case_status(&self, update: CaseStatusUpdate) -> Result<()> {
        let case_id = update.case_id.trim();
        if case_id.is_empty() {
            return Err(ResqError::Validation("case_id is required".into()));
        }
        let status = update.status.trim();
        if status.is_empty() {
            return Err(ResqError::Validation("status is required".into()));
        }

        let mut changes = Row::new();
        changes.insert("status".into(), status.to_string());
        if let Some(hospital) = update.assigned_hospital.as_deref().map(str::trim) {
            if !hospital.is_empty() {
                changes.insert("assigned_hospital".into(), hospital.to_string());
            }
        }

        let matched = self
            .store
            .update_where(CASES, matches_case(case_id), &changes)?;
        if matched == 0 {
            return Err(not_found(case_id));
        }

        log::info!("Case {case_id} status set to {status}");
        Ok(())
    }

    pub fn delete_case(&self, case_id: &str) -> Result<()> {
        let case_id = case_id.trim();
        if case_id.is_empty() {
            return Err(ResqError::Validation("case_id is required".into()));
        }

        let removed = self.store.delete_where(CASES, matches_case(case_id))?;
        if removed == 0 {
            return Err(not_found(case_id));
        }

        log::info!("Deleted case {case_id}");
        Ok(())
    }
}

fn not_found(case_id: &str) -> ResqError {
    ResqError::NotFound {
        collection: Collection::Cases.to_string(),
        id: case_id.to_string(),
    }
}
