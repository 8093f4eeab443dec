use super::model::{parse_number, HospitalRecord, NewHospital, Record};
use super::Records;
use crate::error::{ResqError, Result};
use crate::schema::Collection;

fn check_coordinate(field: &str, raw: &str, limit: f64) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    match parse_number(raw) {
        Some(n) if n.abs() <= limit => Ok(raw.to_string()),
        _ => Err(ResqError::Validation(format!(
            "{field} must be a number between -{limit} and {limit}, got '{raw}'"
        ))),
    }
}

impl Records {
    pub fn add_hospital(&self, hospital: NewHospital) -> Result<HospitalRecord> {
        let api_lat = check_coordinate("api_lat", &hospital.api_lat, 90.0)?;
        let api_lon = check_coordinate("api_lon", &hospital.api_lon, 180.0)?;

        let record = HospitalRecord {
            name: hospital.name,
            address: hospital.address,
            phone: hospital.phone,
            location: hospital.location,
            api_lat,
            api_lon,
            created_at: self.now(),
        };
        self.store
            .append(Collection::Hospitals.as_str(), record.to_row()?)?;
        log::info!("Added hospital {}", record.name);
        Ok(record)
    }

    pub fn list_hospitals(&self) -> Result<Vec<HospitalRecord>> {
        self.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TabularStore;

    fn hospital(lat: &str, lon: &str) -> NewHospital {
        NewHospital {
            name: "City Vet".into(),
            address: "5 Main St".into(),
            phone: String::new(),
            location: "Pune".into(),
            api_lat: lat.into(),
            api_lon: lon.into(),
        }
    }

    #[test]
    fn test_add_hospital() {
        let records = Records::new(TabularStore::in_memory());
        let added = records.add_hospital(hospital("18.5204", " 73.8567")).unwrap();
        assert_eq!(added.api_lon, "73.8567");

        let all = records.list_hospitals().unwrap();
        assert_eq!(all, vec![added]);
    }

    #[test]
    fn test_coordinates_are_optional() {
        let records = Records::new(TabularStore::in_memory());
        let added = records.add_hospital(hospital("", "")).unwrap();
        assert_eq!(added.api_lat, "");
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let records = Records::new(TabularStore::in_memory());
        assert!(records.add_hospital(hospital("91", "0")).is_err());
        assert!(records.add_hospital(hospital("0", "-180.5")).is_err());
        assert!(records.add_hospital(hospital("north", "0")).is_err());
        assert!(records.list_hospitals().unwrap().is_empty());
    }
}
