use std::collections::HashMap;

use crate::form::{
    BmiCategory, Choice, EmploymentStatus, Gender, InputRecord, InsurancePlan, MaritalStatus, Region,
    SmokingStatus,
};

/// Columns produced by `encode`, in model input order
pub const COLUMNS: [&str; 18] = [
    "age",
    "number_of_dependants",
    "income_lakhs",
    "insurance_plan",
    "genetical_risk",
    "normalized_risk_score",
    "gender_Male",
    "region_Northwest",
    "region_Southeast",
    "region_Southwest",
    "marital_status_Unmarried",
    "bmi_category_Obesity",
    "bmi_category_Overweight",
    "bmi_category_Underweight",
    "smoking_status_Occasional",
    "smoking_status_Regular",
    "employment_status_Salaried",
    "employment_status_Self-Employed",
];

/// Highest possible summed condition score (diabetes + heart disease)
const MAX_RISK_SCORE: f64 = 14.0;

/// Named numeric inputs for a regressor
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: HashMap<&'static str, f64>,
}

impl FeatureRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub(crate) fn set(&mut self, column: &'static str, value: f64) {
        self.values.insert(column, value);
    }
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

fn condition_score(condition: &str) -> f64 {
    match condition.trim().to_lowercase().as_str() {
        "diabetes" => 6.0,
        "heart disease" => 8.0,
        "high blood pressure" => 6.0,
        "thyroid" => 5.0,
        _ => 0.0,
    }
}

/// Sum of per-condition scores scaled into 0..=1
pub fn normalized_risk_score(medical_history: &str) -> f64 {
    let total: f64 = medical_history.split(" & ").map(condition_score).sum();
    total / MAX_RISK_SCORE
}

/// Turn a record into unscaled model features
pub fn encode(record: &InputRecord) -> FeatureRow {
    let plan = match record.insurance_plan {
        InsurancePlan::Bronze => 1.0,
        InsurancePlan::Silver => 2.0,
        InsurancePlan::Gold => 3.0,
    };

    let values = HashMap::from([
        ("age", record.age as f64),
        ("number_of_dependants", record.number_of_dependants as f64),
        ("income_lakhs", record.income_lakhs as f64),
        ("insurance_plan", plan),
        ("genetical_risk", record.genetical_risk as f64),
        ("normalized_risk_score", normalized_risk_score(record.medical_history.label())),
        ("gender_Male", flag(record.gender == Gender::Male)),
        ("region_Northwest", flag(record.region == Region::Northwest)),
        ("region_Southeast", flag(record.region == Region::Southeast)),
        ("region_Southwest", flag(record.region == Region::Southwest)),
        ("marital_status_Unmarried", flag(record.marital_status == MaritalStatus::Unmarried)),
        ("bmi_category_Obesity", flag(record.bmi_category == BmiCategory::Obesity)),
        ("bmi_category_Overweight", flag(record.bmi_category == BmiCategory::Overweight)),
        ("bmi_category_Underweight", flag(record.bmi_category == BmiCategory::Underweight)),
        ("smoking_status_Occasional", flag(record.smoking_status == SmokingStatus::Occasional)),
        ("smoking_status_Regular", flag(record.smoking_status == SmokingStatus::Regular)),
        ("employment_status_Salaried", flag(record.employment_status == EmploymentStatus::Salaried)),
        (
            "employment_status_Self-Employed",
            flag(record.employment_status == EmploymentStatus::SelfEmployed),
        ),
    ]);

    FeatureRow { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::MedicalHistory;

    #[test]
    fn test_normalized_risk_score() {
        assert_eq!(normalized_risk_score("No Disease"), 0.0);
        assert_eq!(normalized_risk_score("Diabetes & Heart disease"), 1.0);
        assert_eq!(normalized_risk_score("Thyroid"), 5.0 / 14.0);
        assert_eq!(normalized_risk_score("High blood pressure & Heart disease"), 1.0);
        assert_eq!(normalized_risk_score("Diabetes & Thyroid"), 11.0 / 14.0);
    }

    #[test]
    fn test_every_history_scores_within_unit_range() {
        for history in MedicalHistory::ALL {
            let score = normalized_risk_score(history.label());
            assert!((0.0..=1.0).contains(&score), "{} scored {}", history, score);
        }
    }

    #[test]
    fn test_encode_one_hot_baselines() {
        // Female, Northeast, Married, Normal BMI, non-smoker, unspecified
        // employment are the dropped baseline categories
        let record = InputRecord {
            gender: Gender::Female,
            region: Region::Northeast,
            marital_status: MaritalStatus::Married,
            employment_status: EmploymentStatus::Unspecified,
            insurance_plan: InsurancePlan::Gold,
            ..InputRecord::default()
        };
        let row = encode(&record);

        assert_eq!(row.get("insurance_plan"), Some(3.0));
        assert_eq!(row.get("age"), Some(25.0));
        for column in COLUMNS.iter().skip(6) {
            assert_eq!(row.get(column), Some(0.0), "{} should be off", column);
        }
        assert!(COLUMNS.iter().all(|c| row.get(c).is_some()));
    }

    #[test]
    fn test_encode_sets_matching_flags() {
        let record = InputRecord {
            smoking_status: SmokingStatus::Regular,
            bmi_category: BmiCategory::Obesity,
            employment_status: EmploymentStatus::SelfEmployed,
            ..InputRecord::default()
        };
        let row = encode(&record);
        assert_eq!(row.get("smoking_status_Regular"), Some(1.0));
        assert_eq!(row.get("smoking_status_Occasional"), Some(0.0));
        assert_eq!(row.get("bmi_category_Obesity"), Some(1.0));
        assert_eq!(row.get("employment_status_Self-Employed"), Some(1.0));
        assert_eq!(row.get("employment_status_Salaried"), Some(0.0));
        assert_eq!(row.get("gender_Male"), Some(1.0));
    }
}
