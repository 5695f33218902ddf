//! Schemas of the four report sections.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::SectionName;
use crate::schema::{ErrorCode, Sanitiser, Schema};
use crate::validation::patterns;

const NAME_PATTERN_MESSAGE: &str =
    "Names may only contain letters, spaces, full stops, hyphens and apostrophes";

macro_rules! answer_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All answers, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored answer value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn values() -> impl Iterator<Item = &'static str> {
                Self::ALL.iter().map(|v| v.as_str())
            }
        }
    };
}

answer_enum! {
    /// Control and restraint positions.
    RestraintPosition {
        /// Standing.
        Standing => "STANDING",
        /// Face down on the floor.
        FaceDown => "FACE_DOWN",
        /// On the back.
        OnBack => "ON_BACK",
        /// Kneeling.
        Kneeling => "KNEELING",
    }
}

answer_enum! {
    /// Types of handcuffs.
    HandcuffsType {
        /// Fixed-bar handcuffs.
        Fixed => "FIXED",
        /// Ratchet handcuffs.
        Ratchet => "RATCHET",
    }
}

answer_enum! {
    /// Where the prisoner was relocated to.
    PrisonerRelocation {
        /// Their own cell.
        OwnCell => "OWN_CELL",
        /// A gated cell.
        GatedCell => "GATED_CELL",
        /// The segregation unit.
        SegregationUnit => "SEGREGATION_UNIT",
        /// Special accommodation.
        SpecialAccommodation => "SPECIAL_ACCOMMODATION",
        /// A cellular vehicle.
        CellularVehicle => "CELLULAR_VEHICLE",
        /// Somewhere else.
        Other => "OTHER",
    }
}

answer_enum! {
    /// Whether the incident was recorded on CCTV.
    CctvRecording {
        /// Recorded.
        Yes => "YES",
        /// Not recorded.
        No => "NO",
        /// Unknown.
        NotKnown => "NOT_KNOWN",
    }
}

answer_enum! {
    /// Whether the incident was recorded on a body-worn camera.
    BodyWornCamera {
        /// Recorded.
        Yes => "YES",
        /// Not recorded.
        No => "NO",
        /// Unknown.
        NotKnown => "NOT_KNOWN",
    }
}

fn required_boolean(question: &str, message: &str) -> Schema {
    Schema::boolean()
        .required()
        .label(question)
        .message_all(message)
}

fn required_one_of<I>(values: I, question: &str, message: &str) -> Schema
where
    I: IntoIterator<Item = &'static str>,
{
    Schema::string()
        .required()
        .valid(values)
        .label(question)
        .message_all(message)
}

fn required_name(question: &str, message: &str) -> Schema {
    Schema::string()
        .required()
        .pattern(patterns::person_name())
        .sanitiser(Sanitiser::CollapseWhitespace)
        .label(question)
        .message_all(message)
        .message(ErrorCode::Pattern, NAME_PATTERN_MESSAGE)
}

fn array_of_objects<const N: usize>(fields: [(&str, Schema); N]) -> Schema {
    Schema::array(Schema::object(fields)).sanitiser(Sanitiser::RemoveEmptyObjects)
}

pub(super) fn section_schema(name: SectionName) -> Schema {
    match name {
        SectionName::IncidentDetails => incident_details(),
        SectionName::UseOfForceDetails => use_of_force_details(),
        SectionName::RelocationAndInjuries => relocation_and_injuries(),
        SectionName::Evidence => evidence(),
    }
}

fn incident_details() -> Schema {
    Schema::object([
        (
            "incidentDate",
            Schema::date()
                .required()
                .not_in_future()
                .label("When did the incident happen?")
                .message(ErrorCode::Required, "Enter the date and time of the incident")
                .message(ErrorCode::Base, "Enter a valid date and time for the incident")
                .message(
                    ErrorCode::Future,
                    "Enter a date and time for the incident that is not in the future",
                ),
        ),
        (
            "locationId",
            Schema::number()
                .integer()
                .required()
                .label("Where did the incident happen?")
                .message_all("Select the location of the incident"),
        ),
        (
            "plannedUseOfForce",
            required_boolean(
                "Was use of force planned?",
                "Select yes if the use of force was planned",
            ),
        ),
        (
            "authorisedBy",
            Schema::when(
                "plannedUseOfForce",
                json!(true),
                required_name(
                    "Who authorised use of force?",
                    "Enter the name of the person who authorised the use of force",
                ),
            ),
        ),
        (
            "witnesses",
            array_of_objects([(
                "name",
                required_name("Witness name", "Enter the name of the witness"),
            )])
            .unique_by("name")
            .label("Witnesses to the incident")
            .message(ErrorCode::Unique, "Each witness must only be added once"),
        ),
        (
            "involvedStaff",
            array_of_objects([(
                "username",
                Schema::string()
                    .required()
                    .pattern(patterns::username())
                    .sanitiser(Sanitiser::UpperCase)
                    .label("Staff username")
                    .message_all("Enter the username of the staff member")
                    .message(
                        ErrorCode::Pattern,
                        "Usernames may only contain letters, numbers and underscores",
                    ),
            )])
            .unique_by("username")
            .label("Staff involved in use of force")
            .message(ErrorCode::Unique, "Each staff member must only be added once"),
        ),
    ])
}

fn use_of_force_details() -> Schema {
    Schema::object([
        (
            "positiveCommunication",
            required_boolean(
                "Was positive communication used to de-escalate the situation?",
                "Select yes if positive communication was used",
            ),
        ),
        (
            "personalProtectionTechniques",
            required_boolean(
                "Were any personal protection techniques used?",
                "Select yes if any personal protection techniques were used",
            ),
        ),
        (
            "batonDrawn",
            required_boolean("Was a baton drawn?", "Select yes if a baton was drawn"),
        ),
        (
            "batonUsed",
            Schema::when(
                "batonDrawn",
                json!(true),
                required_boolean("Was a baton used?", "Select yes if a baton was used"),
            ),
        ),
        (
            "pavaDrawn",
            required_boolean("Was PAVA drawn?", "Select yes if PAVA was drawn"),
        ),
        (
            "pavaUsed",
            Schema::when(
                "pavaDrawn",
                json!(true),
                required_boolean("Was PAVA used?", "Select yes if PAVA was used"),
            ),
        ),
        (
            "guidingHold",
            required_boolean(
                "Was a guiding hold used?",
                "Select yes if a guiding hold was used",
            ),
        ),
        (
            "guidingHoldOfficersInvolved",
            Schema::when(
                "guidingHold",
                json!(true),
                Schema::number()
                    .integer()
                    .required()
                    .valid([1, 2])
                    .label("How many officers were involved in the guiding hold?")
                    .message_all("Select how many officers were involved in the guiding hold"),
            ),
        ),
        (
            "restraint",
            required_boolean(
                "Was control and restraint used?",
                "Select yes if control and restraint was used",
            ),
        ),
        (
            "restraintPositions",
            Schema::when(
                "restraint",
                json!(true),
                Schema::array(
                    Schema::string()
                        .valid(RestraintPosition::values())
                        .message_all("Select a valid control and restraint position"),
                )
                .required()
                .min_items(1)
                .label("What control and restraint positions were used?")
                .message_all("Select the control and restraint positions used"),
            ),
        ),
        (
            "handcuffsApplied",
            required_boolean(
                "Were handcuffs applied?",
                "Select yes if handcuffs were applied",
            ),
        ),
        (
            "handcuffsType",
            Schema::when(
                "handcuffsApplied",
                json!(true),
                required_one_of(
                    HandcuffsType::values(),
                    "What type of handcuffs were used?",
                    "Select the type of handcuffs used",
                ),
            ),
        ),
    ])
}

fn relocation_and_injuries() -> Schema {
    Schema::object([
        (
            "prisonerRelocation",
            required_one_of(
                PrisonerRelocation::values(),
                "Where was the prisoner relocated to?",
                "Select where the prisoner was relocated to",
            ),
        ),
        (
            "relocationCompliancy",
            required_boolean(
                "Was the prisoner compliant?",
                "Select yes if the prisoner was compliant",
            ),
        ),
        (
            "f213CompletedBy",
            required_name(
                "Who completed the F213 form?",
                "Enter the name of the person who completed the F213 form",
            ),
        ),
        (
            "prisonerInjuries",
            required_boolean(
                "Did the prisoner sustain any injuries at the time?",
                "Select yes if the prisoner sustained any injuries",
            ),
        ),
        (
            "healthcareInvolved",
            required_boolean(
                "Was a member of healthcare present during the incident?",
                "Select yes if a member of healthcare was present during the incident",
            ),
        ),
        (
            "healthcarePractionerName",
            Schema::when(
                "healthcareInvolved",
                json!(true),
                required_name(
                    "Name of the member of healthcare",
                    "Enter the name of the member of healthcare",
                ),
            ),
        ),
        (
            "prisonerHospitalisation",
            required_boolean(
                "Did the prisoner need outside hospitalisation at the time?",
                "Select yes if the prisoner needed outside hospitalisation",
            ),
        ),
        (
            "staffMedicalAttention",
            required_boolean(
                "Did a member of staff need medical attention at the time?",
                "Select yes if a staff member needed medical attention",
            ),
        ),
        (
            "staffNeedingMedicalAttention",
            Schema::when(
                "staffMedicalAttention",
                json!(true),
                array_of_objects([
                    (
                        "name",
                        required_name(
                            "Staff member name",
                            "Enter the name of the member of staff who needed medical attention",
                        ),
                    ),
                    (
                        "hospitalisation",
                        required_boolean(
                            "Did they go to hospital?",
                            "Select yes if the staff member had to go to hospital",
                        ),
                    ),
                ])
                .required()
                .min_items(1)
                .unique_by("name")
                .label("Who needed medical attention?")
                .message_all("Enter the name of the member of staff who needed medical attention")
                .message(ErrorCode::Unique, "Each staff member must only be added once"),
            ),
        ),
    ])
}

fn evidence() -> Schema {
    Schema::object([
        (
            "baggedEvidence",
            required_boolean(
                "Was any evidence bagged and tagged?",
                "Select yes if any evidence was bagged and tagged",
            ),
        ),
        (
            "evidenceTagAndDescription",
            Schema::when(
                "baggedEvidence",
                json!(true),
                array_of_objects([
                    (
                        "evidenceTagReference",
                        Schema::string()
                            .required()
                            .pattern(patterns::evidence_tag())
                            .sanitiser(Sanitiser::UpperCase)
                            .label("Evidence tag number")
                            .message_all("Enter the evidence tag number")
                            .message(
                                ErrorCode::Pattern,
                                "Evidence tag numbers may only contain letters, numbers, hyphens and slashes",
                            ),
                    ),
                    (
                        "description",
                        Schema::string()
                            .required()
                            .max(500)
                            .sanitiser(Sanitiser::CollapseWhitespace)
                            .label("Description of evidence")
                            .message_all("Enter a description of the evidence")
                            .message(
                                ErrorCode::Max,
                                "Descriptions of evidence must be 500 characters or fewer",
                            ),
                    ),
                ])
                .required()
                .min_items(1)
                .unique_by("evidenceTagReference")
                .label("Evidence tag numbers and descriptions")
                .message_all("Enter the evidence tag number and a description of the evidence")
                .message(ErrorCode::Unique, "Each evidence tag must only be added once"),
            ),
        ),
        (
            "photographsTaken",
            required_boolean(
                "Were any photographs taken?",
                "Select yes if any photographs were taken",
            ),
        ),
        (
            "cctvRecording",
            required_one_of(
                CctvRecording::values(),
                "Was any part of the incident captured on CCTV?",
                "Select yes if any part of the incident was captured on CCTV",
            ),
        ),
        (
            "bodyWornCamera",
            required_one_of(
                BodyWornCamera::values(),
                "Was any part of the incident captured on a body-worn camera?",
                "Select yes if any part of the incident was captured on a body-worn camera",
            ),
        ),
        (
            "bodyWornCameraNumbers",
            Schema::when(
                "bodyWornCamera",
                json!(BodyWornCamera::Yes.as_str()),
                array_of_objects([(
                    "cameraNum",
                    Schema::string()
                        .required()
                        .pattern(patterns::camera_number())
                        .sanitiser(Sanitiser::UpperCase)
                        .label("Body-worn camera number")
                        .message_all("Enter the body-worn camera number")
                        .message(
                            ErrorCode::Pattern,
                            "Camera numbers may only contain letters, numbers and hyphens",
                        ),
                )])
                .required()
                .min_items(1)
                .unique_by("cameraNum")
                .label("Body-worn camera numbers")
                .message_all("Enter the body-worn camera number")
                .message(ErrorCode::Unique, "Each camera number must only be added once"),
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitiser::sanitise;
    use crate::validation::{is_valid, process_input, validate, ValidationContext};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn full() -> ValidationContext {
        ValidationContext::full(now())
    }

    fn texts(schema: &Schema, input: &Value) -> Vec<String> {
        process_input(schema, input, &full())
            .errors
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn test_answer_enums() {
        assert_eq!(RestraintPosition::ALL.len(), 4);
        assert_eq!(PrisonerRelocation::SegregationUnit.as_str(), "SEGREGATION_UNIT");
        assert_eq!(
            serde_json::to_value(HandcuffsType::Ratchet).unwrap(),
            json!("RATCHET")
        );
        let parsed: CctvRecording = serde_json::from_value(json!("NOT_KNOWN")).unwrap();
        assert_eq!(parsed, CctvRecording::NotKnown);
    }

    #[test]
    fn test_incident_details_complete() {
        let schema = incident_details();
        let input = json!({
            "incidentDate": {"date": "31/05/2024", "time": {"hour": "10", "minute": "15"}},
            "locationId": "357591",
            "plannedUseOfForce": "true",
            "authorisedBy": "Eric Bloggs",
            "witnesses": [{"name": "Tom Jones"}, {"name": ""}],
            "involvedStaff": [{"username": "mr_zagato"}]
        });
        let processed = process_input(&schema, &input, &full());
        assert!(processed.is_valid(), "{:?}", processed.errors);
        assert_eq!(
            processed.payload,
            json!({
                "incidentDate": "2024-05-31T10:15:00+00:00",
                "locationId": 357_591,
                "plannedUseOfForce": true,
                "authorisedBy": "Eric Bloggs",
                "witnesses": [{"name": "Tom Jones"}],
                "involvedStaff": [{"username": "MR_ZAGATO"}]
            })
        );
    }

    #[test]
    fn test_incident_details_messages() {
        let schema = incident_details();
        let errors = texts(&schema, &json!({"plannedUseOfForce": "true"}));
        assert_eq!(
            errors,
            vec![
                "Enter the date and time of the incident",
                "Select the location of the incident",
                "Enter the name of the person who authorised the use of force",
            ]
        );
    }

    #[test]
    fn test_incident_date_in_future() {
        let schema = incident_details();
        let errors = texts(
            &schema,
            &json!({"incidentDate": "02/06/2024 09:00", "locationId": 1, "plannedUseOfForce": false}),
        );
        assert_eq!(
            errors,
            vec!["Enter a date and time for the incident that is not in the future"]
        );
    }

    #[test]
    fn test_duplicate_witness_names() {
        let schema = incident_details();
        let errors = validate(
            &schema,
            &sanitise(
                &schema,
                &json!({"witnesses": [{"name": "Tom Jones"}, {"name": "tom jones"}]}),
            ),
            &ValidationContext::partial(now()),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "Each witness must only be added once");
        assert_eq!(errors[0].href, "#witnesses[1][name]");
    }

    #[test]
    fn test_use_of_force_details_dependent_answers() {
        let schema = use_of_force_details();
        let errors = texts(
            &schema,
            &json!({
                "positiveCommunication": "false",
                "personalProtectionTechniques": "false",
                "batonDrawn": "true",
                "pavaDrawn": "false",
                "guidingHold": "true",
                "guidingHoldOfficersInvolved": "3",
                "restraint": "true",
                "restraintPositions": "",
                "handcuffsApplied": "true",
                "handcuffsType": "ROPE"
            }),
        );
        assert_eq!(
            errors,
            vec![
                "Select yes if a baton was used",
                "Select how many officers were involved in the guiding hold",
                "Select the control and restraint positions used",
                "Select the type of handcuffs used",
            ]
        );
    }

    #[test]
    fn test_use_of_force_details_valid() {
        let schema = use_of_force_details();
        let input = json!({
            "positiveCommunication": true,
            "personalProtectionTechniques": true,
            "batonDrawn": false,
            "pavaDrawn": false,
            "guidingHold": true,
            "guidingHoldOfficersInvolved": 2,
            "restraint": true,
            "restraintPositions": ["STANDING", "KNEELING"],
            "handcuffsApplied": false
        });
        assert!(is_valid(&schema, &input, &full()));
    }

    #[test]
    fn test_invalid_restraint_position() {
        let schema = use_of_force_details();
        let processed = process_input(
            &schema,
            &json!({"restraint": "true", "restraintPositions": ["STANDING", "UPSIDE_DOWN"]}),
            &ValidationContext::partial(now()),
        );
        assert_eq!(processed.errors.len(), 1);
        assert_eq!(processed.errors[0].href, "#restraintPositions[1]");
        assert_eq!(
            processed.errors[0].text,
            "Select a valid control and restraint position"
        );
    }

    #[test]
    fn test_relocation_and_injuries_staff_list() {
        let schema = relocation_and_injuries();
        let errors = texts(
            &schema,
            &json!({
                "prisonerRelocation": "OWN_CELL",
                "relocationCompliancy": "true",
                "f213CompletedBy": "Dr  Who",
                "prisonerInjuries": "false",
                "healthcareInvolved": "false",
                "prisonerHospitalisation": "false",
                "staffMedicalAttention": "true",
                "staffNeedingMedicalAttention": [{"name": "", "hospitalisation": ""}]
            }),
        );
        assert_eq!(
            errors,
            vec!["Enter the name of the member of staff who needed medical attention"]
        );
    }

    #[test]
    fn test_f213_name_pattern() {
        let schema = relocation_and_injuries();
        let processed = process_input(
            &schema,
            &json!({"f213CompletedBy": "R2-D2"}),
            &ValidationContext::partial(now()),
        );
        assert_eq!(processed.errors[0].text, NAME_PATTERN_MESSAGE);
        assert_eq!(processed.errors[0].href, "#f213CompletedBy");
    }

    #[test]
    fn test_evidence_cameras_required_when_yes() {
        let schema = evidence();
        let base = json!({
            "baggedEvidence": "false",
            "photographsTaken": "false",
            "cctvRecording": "NOT_KNOWN",
            "bodyWornCamera": "YES",
        });
        let errors = texts(&schema, &base);
        assert_eq!(errors, vec!["Enter the body-worn camera number"]);

        let mut with_cameras = base.clone();
        with_cameras["bodyWornCameraNumbers"] = json!([{"cameraNum": "bwc-1"}, {"cameraNum": " "}]);
        let processed = process_input(&schema, &with_cameras, &full());
        assert!(processed.is_valid(), "{:?}", processed.errors);
        assert_eq!(
            processed.payload["bodyWornCameraNumbers"],
            json!([{"cameraNum": "BWC-1"}])
        );
    }

    #[test]
    fn test_evidence_tags() {
        let schema = evidence();
        let errors = texts(
            &schema,
            &json!({
                "baggedEvidence": "true",
                "evidenceTagAndDescription": [
                    {"evidenceTagReference": "t-1", "description": "A  knife"},
                    {"evidenceTagReference": "T-1", "description": "Another knife"}
                ],
                "photographsTaken": "true",
                "cctvRecording": "YES",
                "bodyWornCamera": "NO"
            }),
        );
        assert_eq!(errors, vec!["Each evidence tag must only be added once"]);
    }
}
