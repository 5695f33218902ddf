use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;

const NOW: &str = "2024-06-01T12:00:00Z";

struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("uof");
        cmd.env("HOME", self.tmp.path())
            .env("XDG_CONFIG_HOME", self.tmp.path().join("config"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn write(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, serde_json::to_string(value).expect("serialize")).expect("write fixture");
        path
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}

fn path_str(path: &PathBuf) -> &str {
    path.to_str().expect("utf-8 path")
}

fn complete_form() -> Value {
    json!({
        "incidentDetails": {
            "incidentDate": "2024-05-31T10:15:00+00:00",
            "locationId": 357_591,
            "plannedUseOfForce": false,
            "involvedStaff": [{"username": "MRS_JONES"}]
        },
        "useOfForceDetails": {
            "positiveCommunication": true,
            "personalProtectionTechniques": false,
            "batonDrawn": false,
            "pavaDrawn": false,
            "guidingHold": false,
            "restraint": false,
            "handcuffsApplied": false
        },
        "relocationAndInjuries": {
            "prisonerRelocation": "OWN_CELL",
            "relocationCompliancy": true,
            "f213CompletedBy": "Dr Smith",
            "prisonerInjuries": false,
            "healthcareInvolved": false,
            "prisonerHospitalisation": false,
            "staffMedicalAttention": false
        },
        "evidence": {
            "baggedEvidence": false,
            "photographsTaken": false,
            "cctvRecording": "NO",
            "bodyWornCamera": "NO"
        }
    })
}

#[test]
fn check_empty_form_json() {
    let env = TestEnv::new();
    let form = env.write("form.json", &json!({}));

    let out = env.run_json(&["check", "--json", "--now", NOW, path_str(&form)]);
    assert_eq!(out["complete"], json!(false));
    assert_eq!(out["sections"][0], json!(["incidentDetails", "NOT_STARTED"]));
}

#[test]
fn check_complete_report_document() {
    let env = TestEnv::new();
    let report = env.write(
        "report.json",
        &json!({"id": 1, "status": "IN_PROGRESS", "formResponse": complete_form()}),
    );

    env.cmd()
        .args(["check", "--now", NOW, path_str(&report)])
        .assert()
        .success()
        .stdout(contains("Report is complete."));
}

#[test]
fn validate_full_reports_errors() {
    let env = TestEnv::new();
    let input = env.write("input.json", &json!({"baggedEvidence": "true"}));

    env.cmd()
        .args(["validate", "--form", "evidence", "--now", NOW, path_str(&input)])
        .assert()
        .failure()
        .stdout(contains("#evidenceTagAndDescription"))
        .stdout(contains("Select yes if any photographs were taken"))
        .stderr(contains("validation error"));
}

#[test]
fn validate_partial_allows_unanswered() {
    let env = TestEnv::new();
    let input = env.write("input.json", &json!({"baggedEvidence": "true"}));

    env.cmd()
        .args(["validate", "--form", "evidence", "--partial", path_str(&input)])
        .assert()
        .success()
        .stdout(contains("No errors."));
}

#[test]
fn validate_statement_json() {
    let env = TestEnv::new();
    let input = env.write(
        "statement.json",
        &json!({"lastTrainingMonth": "1", "lastTrainingYear": "2020", "jobStartYear": "2021", "statement": "x"}),
    );

    let out = env
        .cmd()
        .args(["validate", "-f", "statement", "--json", "--now", NOW, path_str(&input)])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let out: Value = serde_json::from_slice(&out).expect("valid json output");
    assert_eq!(out["errors"][0]["href"], json!("#jobStartYear"));
    assert_eq!(out["payload"]["lastTrainingYear"], json!(2020));
}

#[test]
fn sanitise_prints_payload() {
    let env = TestEnv::new();
    let input = env.write(
        "input.json",
        &json!({
            "incidentDate": {"date": "31/05/2024", "time": {"hour": "9", "minute": "05"}},
            "locationId": "12",
            "witnesses": [{"name": "  Tom   Jones "}, {"name": ""}],
            "unexpected": "dropped"
        }),
    );

    let out = env.run_json(&["sanitise", "--form", "incident-details", path_str(&input)]);
    assert_eq!(
        out,
        json!({
            "incidentDate": "2024-05-31T09:05:00+00:00",
            "locationId": 12,
            "witnesses": [{"name": "Tom Jones"}]
        })
    );
}

#[test]
fn merge_updates_and_detects_no_change() {
    let env = TestEnv::new();
    let form = env.write("form.json", &json!({"evidence": {"baggedEvidence": false}}));
    let same = env.write("same.json", &json!({"baggedEvidence": "false"}));
    let changed = env.write(
        "changed.json",
        &json!({"baggedEvidence": "false", "bodyWornCamera": "NO", "bodyWornCameraNumbers": [{"cameraNum": "A1"}]}),
    );

    env.cmd()
        .args(["merge", "--section", "evidence", path_str(&form), path_str(&same)])
        .assert()
        .success()
        .stdout(contains("No change."));

    let out = env.run_json(&["merge", "-s", "evidence", path_str(&form), path_str(&changed)]);
    assert_eq!(
        out,
        json!({"evidence": {"baggedEvidence": false, "bodyWornCamera": "NO"}})
    );
}

#[test]
fn diff_lists_changed_answers() {
    let env = TestEnv::new();
    let old = env.write("old.json", &complete_form());
    let mut edited = complete_form();
    edited["relocationAndInjuries"]["prisonerRelocation"] = json!("SEGREGATION_UNIT");
    let new = env.write("new.json", &edited);

    env.cmd()
        .args(["diff", path_str(&old), path_str(&new)])
        .assert()
        .success()
        .stdout(contains("Where was the prisoner relocated to?"))
        .stdout(contains("from: Own cell"))
        .stdout(contains("to:   Segregation unit"));

    let mut restaffed = complete_form();
    restaffed["incidentDetails"]["involvedStaff"] = json!([{"username": "MR_ZAGATO"}]);
    let restaffed = env.write("restaffed.json", &restaffed);
    env.cmd()
        .args(["diff", path_str(&old), path_str(&restaffed)])
        .assert()
        .success()
        .stdout(contains("from: MRS_JONES"))
        .stdout(contains("to:   MR_ZAGATO"));

    let out = env.run_json(&["diff", "--json", path_str(&old), path_str(&new)]);
    assert_eq!(out.as_array().map(Vec::len), Some(1));
    assert_eq!(out[0]["field"], json!("prisonerRelocation"));
}

#[test]
fn reminders_claimed_once_with_write() {
    let env = TestEnv::new();
    let statements = env.write(
        "statements.json",
        &json!([{
            "id": 1,
            "reportId": 7,
            "userId": "MRS_JONES",
            "name": "Jo Jones",
            "status": "PENDING",
            "overdueDate": "2024-06-04T09:00:00Z",
            "nextReminderDate": "2024-06-02T09:00:00Z"
        }]),
    );
    let now = "2024-06-02T10:00:00Z";

    let out = env.run_json(&[
        "reminders",
        "--json",
        "--write",
        "--now",
        now,
        path_str(&statements),
    ]);
    assert_eq!(out[0]["kind"], json!("REMINDER"));
    assert_eq!(out[0]["reportId"], json!(7));

    env.cmd()
        .args(["reminders", "--now", now, path_str(&statements)])
        .assert()
        .success()
        .stdout(contains("No reminders due."));

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(&statements).expect("read statements"))
            .expect("valid statements");
    assert_eq!(saved[0]["nextReminderDate"], json!("2024-06-03T09:00:00Z"));
}

#[test]
fn overview_groups_reports() {
    let env = TestEnv::new();
    let report = |id: u64, agency: &str, status: &str, date: &str| {
        json!({
            "id": id,
            "bookingId": id * 10,
            "agencyId": agency,
            "reporterUsername": "REPORTER",
            "reporterName": "Reporter",
            "incidentDate": date,
            "status": status
        })
    };
    let reports = env.write(
        "reports.json",
        &json!([
            report(1, "MDI", "SUBMITTED", "2024-05-30T10:00:00Z"),
            report(2, "MDI", "COMPLETE", "2024-05-20T10:00:00Z"),
            report(3, "MDI", "IN_PROGRESS", "2024-05-29T10:00:00Z"),
            report(4, "LEI", "SUBMITTED", "2024-05-29T10:00:00Z")
        ]),
    );
    let statements = env.write(
        "statements.json",
        &json!([{
            "id": 1,
            "reportId": 1,
            "userId": "MRS_JONES",
            "name": "Jo Jones",
            "status": "PENDING",
            "overdueDate": "2024-06-01T10:00:00Z"
        }]),
    );

    let out = env.run_json(&[
        "overview",
        "--agency",
        "MDI",
        "--json",
        "--now",
        NOW,
        path_str(&reports),
        path_str(&statements),
    ]);
    assert_eq!(out["incomplete"].as_array().map(Vec::len), Some(1));
    assert_eq!(out["incomplete"][0]["overdue"], json!(true));
    assert_eq!(out["complete"][0]["id"], json!(2));
}

#[test]
fn missing_input_file_is_reported() {
    let env = TestEnv::new();
    env.cmd()
        .args(["check", "/nonexistent/report.json"])
        .assert()
        .failure()
        .stderr(contains("failed to load /nonexistent/report.json"));
}

#[test]
fn config_show_applies_env_override() {
    let env = TestEnv::new();
    let out = env
        .cmd()
        .env("USEOFFORCE_REMINDERS__OVERDUE_AFTER_DAYS", "5")
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out: Value = serde_json::from_slice(&out).expect("valid json output");
    assert_eq!(out["reminders"]["overdue_after_days"], json!(5));
    assert_eq!(out["reminders"]["reminder_interval_hours"], json!(24));
}

#[test]
fn config_file_is_loaded() {
    let env = TestEnv::new();
    let config = env.tmp.path().join("custom.toml");
    fs::write(&config, "[output]\npretty_json = false\n").expect("write config");

    env.cmd()
        .args(["-c", path_str(&config), "config", "show"])
        .assert()
        .success()
        .stdout(contains("Pretty JSON:                  false"));
}

#[test]
fn invalid_config_is_rejected() {
    let env = TestEnv::new();
    let config = env.tmp.path().join("bad.toml");
    fs::write(&config, "[reminders]\nreminder_interval_hours = 0\n").expect("write config");

    env.cmd()
        .args(["-c", path_str(&config), "config", "path"])
        .assert()
        .failure()
        .stderr(contains("reminder_interval_hours must be greater than 0"));
}
