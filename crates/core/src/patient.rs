//! Patient profile and the inbound request shape it is read from

use serde_json::{Map, Value as JsonValue};

use crate::DiagnosticError;

/// Patient payload exactly as received, key order preserved
pub type PatientObject = Map<String, JsonValue>;

/// Inbound request body.
///
/// Callers may either wrap the patient (`{"patient": {...}}`) or send the
/// patient object at the top level. Both shapes are resolved here, once,
/// into a single [`PatientObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticRequest {
    Wrapped { patient: JsonValue },
    Bare(PatientObject),
}

impl DiagnosticRequest {
    /// Parse a raw HTTP body
    pub fn from_slice(body: &[u8]) -> Result<Self, DiagnosticError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(DiagnosticError::MissingPatient);
        }

        let value: JsonValue = serde_json::from_slice(body)
            .map_err(|e| DiagnosticError::InvalidBody(e.to_string()))?;
        Self::from_value(value)
    }

    /// Classify an already-parsed JSON body
    pub fn from_value(value: JsonValue) -> Result<Self, DiagnosticError> {
        let JsonValue::Object(mut body) = value else {
            return Err(DiagnosticError::NotAnObject);
        };

        // `"patient": null` falls back to the top-level object
        match body.get("patient") {
            Some(JsonValue::Null) | None => Ok(Self::Bare(body)),
            Some(_) => {
                let patient = body.remove("patient").unwrap_or(JsonValue::Null);
                Ok(Self::Wrapped { patient })
            }
        }
    }

    /// Resolve into the canonical patient object
    pub fn into_patient(self) -> Result<PatientObject, DiagnosticError> {
        match self {
            Self::Wrapped {
                patient: JsonValue::Object(patient),
            } => Ok(patient),
            Self::Wrapped { .. } => Err(DiagnosticError::MissingPatient),
            Self::Bare(patient) => Ok(patient),
        }
    }
}

const SEX: &[&str] = &["patient_sex", "sex"];
const AGE_RANGE: &[&str] = &["patient_age_range", "age_range"];
const PREGNANCY: &[&str] = &["patient_pregnancy_status_or_project", "pregnancy"];
const CONDITIONS: &[&str] = &["patient_chronic_conditions", "conditions"];
const TREATMENTS: &[&str] = &["patient_current_treatments", "treatments"];
const ALLERGIES: &[&str] = &["patient_allergy_history", "allergies"];
const PROFESSION: &[&str] = &["patient_profession_or_exposure", "profession"];
const TRAVEL: &[&str] = &["patient_travel_plan", "travel"];
const CHECK_PREGNANCY: &[&str] = &["contraindications_check_pregnancy_or_postpartum"];
const CHECK_IMMUNOSUPPRESSION: &[&str] = &["contraindications_check_immunosuppression"];
const CHECK_ANTICOAGULANTS: &[&str] = &["contraindications_check_anticoagulants"];
const CHECK_SEVERE_ALLERGY: &[&str] = &["contraindications_check_severe_allergy"];

/// Read-only view of the attributes that drive query selection.
///
/// Every field is free text. An empty string means "unknown", which every
/// predicate treats as the negative case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientProfile {
    pub sex: String,
    pub age_range: String,
    pub pregnancy_status: String,
    pub chronic_conditions: String,
    pub current_treatments: String,
    pub allergy_history: String,
    pub profession: String,
    pub travel_plan: String,
    pub check_pregnancy_or_postpartum: String,
    pub check_immunosuppression: String,
    pub check_anticoagulants: String,
    pub check_severe_allergy: String,
}

impl PatientProfile {
    /// Build a profile from a patient object. Never fails: missing keys and
    /// non-string values become empty strings.
    pub fn from_object(patient: &PatientObject) -> Self {
        let text = |keys: &[&str]| text_field(patient, keys);

        Self {
            sex: text(SEX),
            age_range: text(AGE_RANGE),
            pregnancy_status: text(PREGNANCY),
            chronic_conditions: text(CONDITIONS),
            current_treatments: text(TREATMENTS),
            allergy_history: text(ALLERGIES),
            profession: text(PROFESSION),
            travel_plan: text(TRAVEL),
            check_pregnancy_or_postpartum: text(CHECK_PREGNANCY),
            check_immunosuppression: text(CHECK_IMMUNOSUPPRESSION),
            check_anticoagulants: text(CHECK_ANTICOAGULANTS),
            check_severe_allergy: text(CHECK_SEVERE_ALLERGY),
        }
    }

    /// Same as [`PatientProfile::from_object`]; anything but an object
    /// yields the empty profile.
    pub fn from_value(value: &JsonValue) -> Self {
        value.as_object().map(Self::from_object).unwrap_or_default()
    }
}

/// First present key wins, even when its value is not a string
fn text_field(patient: &PatientObject, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| patient.get(*key))
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}
