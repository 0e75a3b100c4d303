use regrag_process::labels::{BOARD_RESOLUTION, SHAREHOLDER_RESOLUTION};
use regrag_process::{infer_process, Process, Requirement, RequirementTable};

const INCORPORATION: &str = "Company Incorporation (Private Company)";

#[test]
fn composite_register_needs_both_registers() {
    let table = RequirementTable::default();
    let uploaded = [
        "Articles of Association",
        "Board Resolution",
        "Incorporation Application Form",
        "UBO Declaration Form",
        "Register of Members",
    ];
    let (present, missing) = table.compute_missing(INCORPORATION, &uploaded);
    assert_eq!(missing, vec!["Register of Members and Directors"]);
    assert_eq!(
        present,
        vec!["Articles of Association", "Board Resolution", "Incorporation Application Form", "UBO Declaration Form"]
    );

    let mut complete = uploaded.to_vec();
    complete.push("Register of Directors");
    let (present, missing) = table.compute_missing(INCORPORATION, &complete);
    assert!(missing.is_empty());
    assert_eq!(present.last().map(String::as_str), Some("Register of Members and Directors"));
}

#[test]
fn duplicates_do_not_satisfy_composites() {
    let table = RequirementTable::default();
    let uploaded = ["Register of Members", "Register of Members"];
    let (_, missing) = table.compute_missing(INCORPORATION, &uploaded);
    assert!(missing.contains(&"Register of Members and Directors".to_string()));
}

#[test]
fn shareholder_resolution_never_counts_as_board_resolution() {
    let table = RequirementTable::default();
    let (present, missing) = table.compute_missing(INCORPORATION, &[SHAREHOLDER_RESOLUTION]);
    assert!(present.is_empty());
    assert!(missing.contains(&BOARD_RESOLUTION.to_string()));
}

#[test]
fn direct_comparison_ignores_composites() {
    let table = RequirementTable::default();
    let uploaded = ["Register of Members", "Register of Directors"];
    let (present, _) = table.compare_uploaded_to_required(INCORPORATION, &uploaded);
    assert!(present.is_empty());
    let (present, _) = table.compute_missing(INCORPORATION, &uploaded);
    assert_eq!(present, vec!["Register of Members and Directors"]);
}

#[test]
fn unknown_process_has_empty_checklist() {
    let table = RequirementTable::default();
    let (present, missing) = table.compute_missing("Unknown", &["Employment Contract"]);
    assert!(present.is_empty() && missing.is_empty());
}

#[test]
fn process_inference_priorities() {
    assert_eq!(infer_process(&["Employment Contract"]), Process::EmploymentCompliance);
    assert_eq!(infer_process(&["Articles of Association", "Shareholder Resolution"]), Process::AoaAmendment);
    assert_eq!(infer_process::<&str>(&[]), Process::Unknown);
    assert_eq!(infer_process(&["Incorporation Application Form"]), Process::CompanyIncorporation);
    assert_eq!(
        infer_process(&["Employment Contract", "Incorporation Application Form"]),
        Process::CompanyIncorporation
    );
    assert_eq!(infer_process(&["Shareholder Resolution"]), Process::Unknown);
}

#[test]
fn evaluate_reports_inferred_process() {
    let table = RequirementTable::default();
    let report = table.evaluate(&["Articles of Association", "Shareholder Resolution", "Shareholder Resolution"]);
    assert_eq!(report.process, Process::AoaAmendment);
    assert_eq!(report.required, 2);
    assert_eq!(report.present, vec!["Articles of Association", "Shareholder Resolution"]);
    assert!(report.missing.is_empty());

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["process"], "AoA Amendment");
}

#[test]
fn unrecognized_labels_are_reported_once() {
    let table = RequirementTable::default();
    let report = table.evaluate(&["Employment Contract", "Lease Agreement", "UBO Declaration Form", "Lease Agreement"]);
    assert_eq!(report.process, Process::EmploymentCompliance);
    assert!(report.missing.is_empty());
    assert_eq!(report.unrecognized, vec!["Lease Agreement"]);

    assert!(table.recognizes("Register of Directors"));
    assert!(table.recognizes("Register of Members and Directors"));
    assert!(table.recognizes("Other"));
    assert!(!table.recognizes("board resolution"));
}

#[test]
fn default_lists_processes_in_table_order() {
    assert_eq!(
        RequirementTable::default().list_processes(),
        vec![INCORPORATION, "Employment Compliance", "Data Protection Compliance", "AoA Amendment"]
    );
}

#[test]
fn table_loads_from_json_with_aliases() {
    let raw = r#"{
        "processes": [
            {"process": "Employment Compliance", "required": ["Employment Contract", "Staff Handbook"]}
        ],
        "composites": {
            "Staff Handbook": "Employee Handbook",
            "Register of Members and Directors": ["Register of Members", "Register of Directors"]
        }
    }"#;
    let table = RequirementTable::from_json(raw).expect("table");
    assert_eq!(table.composites["Staff Handbook"], Requirement::Single("Employee Handbook".into()));
    let (present, missing) = table.compute_missing("Employment Compliance", &["Employment Contract", "Employee Handbook"]);
    assert_eq!(present, vec!["Employment Contract", "Staff Handbook"]);
    assert!(missing.is_empty());

    let tmp = tempfile::tempdir().expect("tmp");
    let path = tmp.path().join("checklists.json");
    std::fs::write(&path, raw).expect("write");
    assert_eq!(RequirementTable::load(&path).expect("load"), table);
}

#[test]
fn invalid_tables_are_rejected() {
    let dup = r#"{"processes": [{"process": "A", "required": []}, {"process": "A", "required": []}]}"#;
    assert!(RequirementTable::from_json(dup).is_err());
    let empty = r#"{"processes": [], "composites": {"X": []}}"#;
    assert!(RequirementTable::from_json(empty).is_err());
    assert!(RequirementTable::from_json("not json").is_err());
}
