use nerdherd_core::error::CoreError;
use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::intake::IntakeProfile;
use nerdherd_core::models::message::{Message, Sender};
use nerdherd_core::models::problem::{ChartPoint, PossibleProblem, ProblemEntry, normalize_problems};
use nerdherd_core::models::repair_request::{ContactMethod, RepairRequest, RepairRequestForm};
use nerdherd_core::models::user::UserRecord;
use nerdherd_core::validate::is_valid_email;
use uuid::Uuid;

fn profile() -> IntakeProfile {
    IntakeProfile {
        name: "Sam".to_string(),
        email: "sam@example.com".to_string(),
        device_type: "Laptop".to_string(),
        brand: "Dell".to_string(),
        model: "XPS 13".to_string(),
        problem: "Won't turn on".to_string(),
    }
}

fn booking() -> RepairRequestForm {
    RepairRequestForm {
        name: "Sam".to_string(),
        email: "sam@example.com".to_string(),
        phone: String::new(),
        device_type: "Phone".to_string(),
        brand: String::new(),
        model: String::new(),
        problem: "Cracked screen".to_string(),
        contact_method: ContactMethod::Either,
        repair_time: String::new(),
        remote: false,
    }
}

#[test]
fn email_check() {
    assert!(is_valid_email("a@b.co"));
    assert!(is_valid_email("first.last@sub.example.org"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("a b@c.com"));
    assert!(!is_valid_email("a@b.com "));
    assert!(!is_valid_email("@b.com"));
    assert!(!is_valid_email("a@@b.com"));
}

#[test]
fn complete_intake_profile_is_valid() {
    assert!(profile().validate().is_ok());
}

#[test]
fn blank_intake_field_rejected() {
    let mut p = profile();
    p.model = "   ".to_string();
    assert!(matches!(p.validate(), Err(CoreError::MissingField(f)) if f == "model"));
}

#[test]
fn bad_intake_email_rejected() {
    let mut p = profile();
    p.email = "sam-at-example".to_string();
    assert!(matches!(p.validate(), Err(CoreError::InvalidEmail(_))));
}

#[test]
fn booking_requires_core_fields_only() {
    let request = RepairRequest::from_form(booking()).expect("valid booking");
    assert_eq!(request.form.contact_method, ContactMethod::Either);

    let mut missing = booking();
    missing.problem = String::new();
    assert!(matches!(
        RepairRequest::from_form(missing),
        Err(CoreError::MissingField(f)) if f == "problem"
    ));
}

#[test]
fn booking_checks_required_fields_before_email() {
    let mut form = booking();
    form.email = "nope".to_string();
    form.device_type = String::new();
    assert!(matches!(
        RepairRequest::from_form(form),
        Err(CoreError::MissingField(f)) if f == "device_type"
    ));
}

#[test]
fn booking_form_defaults_optional_fields() {
    let json = r#"{"name":"Sam","email":"sam@example.com","device_type":"Laptop","problem":"Slow"}"#;
    let form: RepairRequestForm = serde_json::from_str(json).expect("parses");
    assert_eq!(form.contact_method, ContactMethod::Either);
    assert!(!form.remote);
    assert!(form.phone.is_empty());
}

#[test]
fn stored_repair_request_is_flat() {
    let request = RepairRequest::from_form(booking()).expect("valid booking");
    let value = serde_json::to_value(&request).expect("serializes");
    assert_eq!(value["name"], "Sam");
    assert_eq!(value["contact_method"], "either");
    assert!(value.get("form").is_none());
}

#[test]
fn sender_serializes_snake_case() {
    let json = serde_json::to_string(&Message::assistant("hi")).expect("serializes");
    assert_eq!(json, r#"{"sender":"assistant","text":"hi"}"#);
    let back: Message = serde_json::from_str(r#"{"sender":"user","text":"yo"}"#).expect("parses");
    assert_eq!(back.sender, Sender::User);
}

#[test]
fn bare_text_entries_normalize_to_empty_details() {
    let structured = PossibleProblem {
        title: "Power".to_string(),
        description: "Loose cable".to_string(),
        chart_data: vec![ChartPoint {
            label: "Power Issue".to_string(),
            value: 70.0,
        }],
    };
    let problems = normalize_problems(vec![
        ProblemEntry::Text("Software glitch".to_string()),
        ProblemEntry::Structured(structured.clone()),
    ]);
    assert_eq!(problems[0].title, "Software glitch");
    assert!(problems[0].description.is_empty());
    assert!(problems[0].chart_data.is_empty());
    assert_eq!(problems[1], structured);
}

#[test]
fn user_record_appends_each_diagnosis_once() {
    let mut user = UserRecord::new(profile());
    let record = DiagnosisRecord {
        id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        conversation: vec![Message::user("hello")],
        possible_problems: Vec::new(),
        created_at: jiff::Timestamp::now(),
    };
    assert!(user.add_diagnosis(record.clone()));
    assert!(!user.add_diagnosis(record));
    assert_eq!(user.diagnoses.len(), 1);
}
