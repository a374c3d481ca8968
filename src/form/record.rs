use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fixed set of labelled options for a select-style field
pub trait Choice: Copy + PartialEq + Sized + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Move `delta` positions through `ALL`, wrapping at both ends
    fn cycle(self, delta: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let pos = Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as i32;
        Self::ALL[(pos + delta).rem_euclid(len) as usize]
    }
}

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Choice for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

// `#[default]` lands on the first variant of each list.
choice_enum!(Gender { Male => "Male", Female => "Female" });
choice_enum!(MaritalStatus { Unmarried => "Unmarried", Married => "Married" });
choice_enum!(EmploymentStatus {
    Salaried => "Salaried",
    SelfEmployed => "Self-Employed",
    Freelancer => "Freelancer",
    Unspecified => "",
});
choice_enum!(BmiCategory {
    Normal => "Normal",
    Obesity => "Obesity",
    Overweight => "Overweight",
    Underweight => "Underweight",
});
choice_enum!(SmokingStatus {
    NoSmoking => "No Smoking",
    Regular => "Regular",
    Occasional => "Occasional",
});
choice_enum!(
    /// Compound medical conditions, joined with " & "
    MedicalHistory {
        NoDisease => "No Disease",
        Diabetes => "Diabetes",
        HighBloodPressure => "High blood pressure",
        DiabetesHighBloodPressure => "Diabetes & High blood pressure",
        Thyroid => "Thyroid",
        HeartDisease => "Heart disease",
        HighBloodPressureHeartDisease => "High blood pressure & Heart disease",
        DiabetesThyroid => "Diabetes & Thyroid",
        DiabetesHeartDisease => "Diabetes & Heart disease",
    }
);
choice_enum!(Region {
    Northwest => "Northwest",
    Southeast => "Southeast",
    Northeast => "Northeast",
    Southwest => "Southwest",
});
choice_enum!(InsurancePlan { Bronze => "Bronze", Silver => "Silver", Gold => "Gold" });

/// Inclusive range and starting value of an integer field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl FieldRange {
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.min as i64 && value <= self.max as i64
    }
}

pub const AGE: FieldRange = FieldRange { min: 18, max: 100, default: 25 };
pub const INCOME_LAKHS: FieldRange = FieldRange { min: 0, max: 200, default: 5 };
pub const DEPENDANTS: FieldRange = FieldRange { min: 0, max: 20, default: 0 };
pub const GENETICAL_RISK: FieldRange = FieldRange { min: 0, max: 5, default: 0 };

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: u32,
        max: u32,
    },
    #[error("{field} expects a whole number (got {input:?})")]
    NotANumber { field: &'static str, input: String },
    #[error("{field} is not a numeric field")]
    NotNumeric { field: &'static str },
}

pub(crate) fn check_range(field: &'static str, range: FieldRange, value: i64) -> Result<u32, FieldError> {
    if range.contains(value) {
        Ok(value as u32)
    } else {
        Err(FieldError::OutOfRange {
            field,
            value,
            min: range.min,
            max: range.max,
        })
    }
}

/// One submission's worth of user attributes
///
/// Serializes to the key/label mapping the estimator boundary expects.
/// Built fresh for every submission and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct InputRecord {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Number of Dependants")]
    pub number_of_dependants: u32,
    #[serde(rename = "Income in Lakhs")]
    pub income_lakhs: u32,
    #[serde(rename = "Genetical Risk")]
    pub genetical_risk: u32,
    #[serde(rename = "Insurance Plan")]
    pub insurance_plan: InsurancePlan,
    #[serde(rename = "Employment Status")]
    pub employment_status: EmploymentStatus,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Marital Status")]
    pub marital_status: MaritalStatus,
    #[serde(rename = "BMI Category")]
    pub bmi_category: BmiCategory,
    #[serde(rename = "Smoking Status")]
    pub smoking_status: SmokingStatus,
    #[serde(rename = "Region")]
    pub region: Region,
    #[serde(rename = "Medical History")]
    pub medical_history: MedicalHistory,
}

impl Default for InputRecord {
    fn default() -> Self {
        Self {
            age: AGE.default,
            number_of_dependants: DEPENDANTS.default,
            income_lakhs: INCOME_LAKHS.default,
            genetical_risk: GENETICAL_RISK.default,
            insurance_plan: InsurancePlan::default(),
            employment_status: EmploymentStatus::default(),
            gender: Gender::default(),
            marital_status: MaritalStatus::default(),
            bmi_category: BmiCategory::default(),
            smoking_status: SmokingStatus::default(),
            region: Region::default(),
            medical_history: MedicalHistory::default(),
        }
    }
}

impl InputRecord {
    /// Check every integer field against its declared range
    pub fn validate(&self) -> Result<(), FieldError> {
        check_range("Age", AGE, self.age as i64)?;
        check_range("Number of Dependants", DEPENDANTS, self.number_of_dependants as i64)?;
        check_range("Income in Lakhs", INCOME_LAKHS, self.income_lakhs as i64)?;
        check_range("Genetical Risk", GENETICAL_RISK, self.genetical_risk as i64)?;
        Ok(())
    }
}

/// Unvalidated mirror of `InputRecord` used while deserializing
#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "Age")]
    age: i64,
    #[serde(rename = "Number of Dependants")]
    number_of_dependants: i64,
    #[serde(rename = "Income in Lakhs")]
    income_lakhs: i64,
    #[serde(rename = "Genetical Risk")]
    genetical_risk: i64,
    #[serde(rename = "Insurance Plan")]
    insurance_plan: InsurancePlan,
    #[serde(rename = "Employment Status")]
    employment_status: EmploymentStatus,
    #[serde(rename = "Gender")]
    gender: Gender,
    #[serde(rename = "Marital Status")]
    marital_status: MaritalStatus,
    #[serde(rename = "BMI Category")]
    bmi_category: BmiCategory,
    #[serde(rename = "Smoking Status")]
    smoking_status: SmokingStatus,
    #[serde(rename = "Region")]
    region: Region,
    #[serde(rename = "Medical History")]
    medical_history: MedicalHistory,
}

impl TryFrom<RawRecord> for InputRecord {
    type Error = FieldError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            age: check_range("Age", AGE, raw.age)?,
            number_of_dependants: check_range("Number of Dependants", DEPENDANTS, raw.number_of_dependants)?,
            income_lakhs: check_range("Income in Lakhs", INCOME_LAKHS, raw.income_lakhs)?,
            genetical_risk: check_range("Genetical Risk", GENETICAL_RISK, raw.genetical_risk)?,
            insurance_plan: raw.insurance_plan,
            employment_status: raw.employment_status,
            gender: raw.gender,
            marital_status: raw.marital_status,
            bmi_category: raw.bmi_category,
            smoking_status: raw.smoking_status,
            region: raw.region,
            medical_history: raw.medical_history,
        })
    }
}
