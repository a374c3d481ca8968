//! Form collector: field definitions, current values, and record assembly

pub mod record;

pub use record::{
    BmiCategory, Choice, EmploymentStatus, FieldError, FieldRange, Gender, InputRecord, InsurancePlan,
    MaritalStatus, MedicalHistory, Region, SmokingStatus,
};

use record::{check_range, AGE, DEPENDANTS, GENETICAL_RISK, INCOME_LAKHS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTab {
    Personal,
    Financial,
    Health,
    Location,
}

impl FormTab {
    pub const ALL: [FormTab; 4] = [FormTab::Personal, FormTab::Financial, FormTab::Health, FormTab::Location];

    pub fn title(self) -> &'static str {
        match self {
            FormTab::Personal => "Personal Info",
            FormTab::Financial => "Financial & Family",
            FormTab::Health => "Health & Risk",
            FormTab::Location => "Insurance & Location",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FormTab::Personal => FormTab::Financial,
            FormTab::Financial => FormTab::Health,
            FormTab::Health => FormTab::Location,
            FormTab::Location => FormTab::Personal,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormTab::Personal => FormTab::Location,
            FormTab::Financial => FormTab::Personal,
            FormTab::Health => FormTab::Financial,
            FormTab::Location => FormTab::Health,
        }
    }

    /// Fields shown on this tab, in display order
    pub fn fields(self) -> &'static [FieldId] {
        match self {
            FormTab::Personal => &[FieldId::Age, FieldId::Gender, FieldId::MaritalStatus],
            FormTab::Financial => &[FieldId::IncomeLakhs, FieldId::Dependants, FieldId::EmploymentStatus],
            FormTab::Health => &[
                FieldId::BmiCategory,
                FieldId::SmokingStatus,
                FieldId::GeneticalRisk,
                FieldId::MedicalHistory,
            ],
            FormTab::Location => &[FieldId::Region, FieldId::InsurancePlan],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Age,
    Gender,
    MaritalStatus,
    IncomeLakhs,
    Dependants,
    EmploymentStatus,
    BmiCategory,
    SmokingStatus,
    GeneticalRisk,
    MedicalHistory,
    Region,
    InsurancePlan,
}

impl FieldId {
    /// Name used in the record and in error messages
    pub fn name(self) -> &'static str {
        match self {
            FieldId::Age => "Age",
            FieldId::Gender => "Gender",
            FieldId::MaritalStatus => "Marital Status",
            FieldId::IncomeLakhs => "Income in Lakhs",
            FieldId::Dependants => "Number of Dependants",
            FieldId::EmploymentStatus => "Employment Status",
            FieldId::BmiCategory => "BMI Category",
            FieldId::SmokingStatus => "Smoking Status",
            FieldId::GeneticalRisk => "Genetical Risk",
            FieldId::MedicalHistory => "Medical History",
            FieldId::Region => "Region",
            FieldId::InsurancePlan => "Insurance Plan",
        }
    }

    /// Label shown next to the input control
    pub fn label(self) -> &'static str {
        match self {
            FieldId::Age => "Age",
            FieldId::Gender => "Gender",
            FieldId::MaritalStatus => "Marital Status",
            FieldId::IncomeLakhs => "Annual Income (Lakhs)",
            FieldId::Dependants => "Number of Dependants",
            FieldId::EmploymentStatus => "Employment Status",
            FieldId::BmiCategory => "BMI Category",
            FieldId::SmokingStatus => "Smoking Status",
            FieldId::GeneticalRisk => "Genetical Risk Score (0-5)",
            FieldId::MedicalHistory => "Medical Condition",
            FieldId::Region => "Region",
            FieldId::InsurancePlan => "Insurance Plan Type",
        }
    }

    pub fn range(self) -> Option<FieldRange> {
        match self {
            FieldId::Age => Some(AGE),
            FieldId::IncomeLakhs => Some(INCOME_LAKHS),
            FieldId::Dependants => Some(DEPENDANTS),
            FieldId::GeneticalRisk => Some(GENETICAL_RISK),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.range().is_some()
    }

    /// Option labels for select fields (empty for numeric fields)
    pub fn options(self) -> Vec<&'static str> {
        fn labels<T: Choice>() -> Vec<&'static str> {
            T::ALL.iter().map(|c| c.label()).collect()
        }
        match self {
            FieldId::Gender => labels::<Gender>(),
            FieldId::MaritalStatus => labels::<MaritalStatus>(),
            FieldId::EmploymentStatus => labels::<EmploymentStatus>(),
            FieldId::BmiCategory => labels::<BmiCategory>(),
            FieldId::SmokingStatus => labels::<SmokingStatus>(),
            FieldId::MedicalHistory => labels::<MedicalHistory>(),
            FieldId::Region => labels::<Region>(),
            FieldId::InsurancePlan => labels::<InsurancePlan>(),
            FieldId::Age | FieldId::IncomeLakhs | FieldId::Dependants | FieldId::GeneticalRisk => Vec::new(),
        }
    }
}

/// Current values of every control on the form
///
/// Numeric values are kept inside their ranges at all times, so `record()`
/// never produces an invalid record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    values: InputRecord,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a fresh Input Record from the current values
    pub fn record(&self) -> InputRecord {
        self.values.clone()
    }

    /// Display text for a field's current value
    pub fn value_text(&self, field: FieldId) -> String {
        let v = &self.values;
        match field {
            FieldId::Age => v.age.to_string(),
            FieldId::IncomeLakhs => v.income_lakhs.to_string(),
            FieldId::Dependants => v.number_of_dependants.to_string(),
            FieldId::GeneticalRisk => v.genetical_risk.to_string(),
            FieldId::Gender => v.gender.label().to_string(),
            FieldId::MaritalStatus => v.marital_status.label().to_string(),
            FieldId::EmploymentStatus => v.employment_status.label().to_string(),
            FieldId::BmiCategory => v.bmi_category.label().to_string(),
            FieldId::SmokingStatus => v.smoking_status.label().to_string(),
            FieldId::MedicalHistory => v.medical_history.label().to_string(),
            FieldId::Region => v.region.label().to_string(),
            FieldId::InsurancePlan => v.insurance_plan.label().to_string(),
        }
    }

    /// Numeric fields move by `delta` clamped to range; select fields cycle
    pub fn step(&mut self, field: FieldId, delta: i32) {
        if let Some(range) = field.range() {
            let current = self.number(field).unwrap_or(range.default) as i64;
            let next = (current + delta as i64).clamp(range.min as i64, range.max as i64) as u32;
            self.store_number(field, next);
            return;
        }

        let v = &mut self.values;
        match field {
            FieldId::Gender => v.gender = v.gender.cycle(delta),
            FieldId::MaritalStatus => v.marital_status = v.marital_status.cycle(delta),
            FieldId::EmploymentStatus => v.employment_status = v.employment_status.cycle(delta),
            FieldId::BmiCategory => v.bmi_category = v.bmi_category.cycle(delta),
            FieldId::SmokingStatus => v.smoking_status = v.smoking_status.cycle(delta),
            FieldId::MedicalHistory => v.medical_history = v.medical_history.cycle(delta),
            FieldId::Region => v.region = v.region.cycle(delta),
            FieldId::InsurancePlan => v.insurance_plan = v.insurance_plan.cycle(delta),
            FieldId::Age | FieldId::IncomeLakhs | FieldId::Dependants | FieldId::GeneticalRisk => {}
        }
    }

    /// Set a numeric field; out-of-range values are rejected and the old value kept
    pub fn set_number(&mut self, field: FieldId, value: i64) -> Result<(), FieldError> {
        let range = field.range().ok_or(FieldError::NotNumeric { field: field.name() })?;
        let value = check_range(field.name(), range, value)?;
        self.store_number(field, value);
        Ok(())
    }

    /// Parse typed text and set it as the field's value
    pub fn set_from_text(&mut self, field: FieldId, input: &str) -> Result<(), FieldError> {
        let value = input.trim().parse::<i64>().map_err(|_| FieldError::NotANumber {
            field: field.name(),
            input: input.to_string(),
        })?;
        self.set_number(field, value)
    }

    fn number(&self, field: FieldId) -> Option<u32> {
        match field {
            FieldId::Age => Some(self.values.age),
            FieldId::IncomeLakhs => Some(self.values.income_lakhs),
            FieldId::Dependants => Some(self.values.number_of_dependants),
            FieldId::GeneticalRisk => Some(self.values.genetical_risk),
            _ => None,
        }
    }

    fn store_number(&mut self, field: FieldId, value: u32) {
        match field {
            FieldId::Age => self.values.age = value,
            FieldId::IncomeLakhs => self.values.income_lakhs = value,
            FieldId::Dependants => self.values.number_of_dependants = value,
            FieldId::GeneticalRisk => self.values.genetical_risk = value,
            _ => {}
        }
    }
}
