use pretty_assertions::assert_eq;
use resqtrack::records::{CaseStatusUpdate, NewCase, NewDonation, NewHospital};
use resqtrack::{Records, ResqError, TabularStore};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Records {
    Records::new(TabularStore::open(dir.path().join("database")))
}

fn report(records: &Records, name: &str) -> String {
    records
        .report_case(NewCase {
            reporter_name: name.into(),
            location: "Koregaon Park, Pune".into(),
            animal_type: "Cat".into(),
            urgency: "Medium".into(),
            notes: "stuck on a ledge, \"scared\"".into(),
            ..Default::default()
        })
        .unwrap()
}

#[test]
fn case_lifecycle_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    {
        let records = open(&tmp);
        assert_eq!(report(&records, "Asha"), "RSQ-00001");
        assert_eq!(report(&records, "Ben"), "RSQ-00002");
        assert_eq!(report(&records, "Chitra"), "RSQ-00003");

        records
            .update_case_status(CaseStatusUpdate {
                case_id: "RSQ-00002".into(),
                status: "Rescued".into(),
                assigned_hospital: Some("City Vet".into()),
            })
            .unwrap();
        records.delete_case("RSQ-00001").unwrap();
    }

    let records = open(&tmp);
    let cases = records.list_cases().unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].case_id, "RSQ-00002");
    assert_eq!(cases[0].status, "Rescued");
    assert_eq!(cases[0].assigned_hospital, "City Vet");
    assert_eq!(cases[0].notes, "stuck on a ledge, \"scared\"");
    assert_eq!(cases[1].case_id, "RSQ-00003");
    assert_eq!(cases[1].status, "Reported");

    assert_eq!(report(&records, "Dev"), "RSQ-00004");
}

#[test]
fn header_row_matches_schema_order() {
    let tmp = TempDir::new().unwrap();
    let records = open(&tmp);
    records.ensure_all().unwrap();

    let header = std::fs::read_to_string(tmp.path().join("database/cases.csv")).unwrap();
    assert_eq!(
        header.trim_end(),
        "case_id,reporter_name,reporter_phone,location,animal_type,urgency,notes,media_url,status,assigned_hospital,created_at"
    );
}

#[test]
fn not_found_update_leaves_file_bytes_unchanged() {
    let tmp = TempDir::new().unwrap();
    let records = open(&tmp);
    report(&records, "Asha");
    let path = tmp.path().join("database/cases.csv");
    let before = std::fs::read(&path).unwrap();

    let err = records
        .update_case_status(CaseStatusUpdate {
            case_id: "RSQ-00404".into(),
            status: "Resolved".into(),
            assigned_hospital: None,
        })
        .unwrap_err();
    assert!(matches!(err, ResqError::NotFound { .. }));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn malformed_legacy_id_does_not_collide() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("database");
    std::fs::create_dir_all(&db).unwrap();
    std::fs::write(
        db.join("cases.csv"),
        "case_id,reporter_name,reporter_phone,location,animal_type,urgency,notes,media_url,status,assigned_hospital,created_at\n\
         RSQ-00005,A,,,,,,,Reported,,2024-01-01 00:00:00\n\
         imported-7,B,,,,,,,Reported,,2024-01-02 00:00:00\n",
    )
    .unwrap();

    let records = open(&tmp);
    assert_eq!(report(&records, "C"), "RSQ-00006");
    assert_eq!(report(&records, "D"), "RSQ-00007");
}

#[test]
fn concurrent_reports_get_distinct_ids() {
    let tmp = TempDir::new().unwrap();
    let records = std::sync::Arc::new(open(&tmp));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let records = std::sync::Arc::clone(&records);
            std::thread::spawn(move || {
                (0..10)
                    .map(|i| report(&records, &format!("reporter-{t}-{i}")))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 40);
    assert_eq!(records.list_cases().unwrap().len(), 40);
}

#[test]
fn donations_hospitals_and_stats() {
    let tmp = TempDir::new().unwrap();
    let records = open(&tmp);
    records
        .add_donation(NewDonation {
            donor_name: "Ravi".into(),
            donor_email: "ravi@example.org".into(),
            amount: "125000".into(),
            category: "Food".into(),
        })
        .unwrap();
    records
        .add_hospital(NewHospital {
            name: "City Vet".into(),
            address: "5 Main St".into(),
            location: "Pune".into(),
            ..Default::default()
        })
        .unwrap();
    report(&records, "Asha");

    let stats = records.stats().unwrap();
    assert_eq!(stats.total_cases, 1);
    assert_eq!(stats.total_donations, 1);
    assert_eq!(stats.total_hospitals, 1);
    assert_eq!(stats.total_amount, "₹125,000.00");

    let rows = records.list_all("hospitals").unwrap();
    assert_eq!(rows[0]["name"], "City Vet");
    assert_eq!(rows[0]["api_lat"], "");
}
