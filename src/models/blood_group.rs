use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    /// Canonical order used whenever a full inventory is synthesized
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Accept the Unicode minus sign as well as ASCII hyphen
        let normalized = s.trim().to_uppercase().replace('\u{2212}', "-");
        BloodGroup::ALL
            .iter()
            .copied()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| format!("Unknown blood group: {}", s))
    }
}

/// Serde adapter for fields where donors may answer `"unknown"`.
pub mod declared {
    use super::BloodGroup;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const UNKNOWN: &str = "unknown";

    pub fn serialize<S>(value: &Option<BloodGroup>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(group) => serializer.serialize_str(group.as_str()),
            None => serializer.serialize_str(UNKNOWN),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BloodGroup>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case(UNKNOWN) => Ok(None),
            Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("AB+".parse::<BloodGroup>().unwrap(), BloodGroup::AbPos);
        assert_eq!(" o- ".parse::<BloodGroup>().unwrap(), BloodGroup::ONeg);
        assert_eq!("B\u{2212}".parse::<BloodGroup>().unwrap(), BloodGroup::BNeg);
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&BloodGroup::ONeg).unwrap();
        assert_eq!(json, "\"O-\"");
        let group: BloodGroup = serde_json::from_str("\"AB-\"").unwrap();
        assert_eq!(group, BloodGroup::AbNeg);
    }

    #[test]
    fn test_declared_unknown() {
        #[derive(Serialize, Deserialize)]
        struct Form {
            #[serde(with = "declared", default)]
            blood_group: Option<BloodGroup>,
        }

        let form: Form = serde_json::from_str(r#"{"blood_group":"unknown"}"#).unwrap();
        assert!(form.blood_group.is_none());
        let form: Form = serde_json::from_str(r#"{}"#).unwrap();
        assert!(form.blood_group.is_none());
        let form: Form = serde_json::from_str(r#"{"blood_group":"A+"}"#).unwrap();
        assert_eq!(form.blood_group, Some(BloodGroup::APos));
        assert_eq!(
            serde_json::to_string(&Form { blood_group: None }).unwrap(),
            r#"{"blood_group":"unknown"}"#
        );
    }
}
