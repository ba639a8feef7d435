//! Four-band risk category and its ordinal encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Risk band attached to reference points and assigned to query points.
///
/// Variant order is the total order of the bands; `Unknown` sorts lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Risk {
    #[default]
    Unknown,
    VeryLow,
    Low,
    Medium,
    High,
}

impl Risk {
    /// All known bands, lowest first.
    pub const BANDS: [Risk; 4] = [Risk::VeryLow, Risk::Low, Risk::Medium, Risk::High];

    /// Integer ordinal: VeryLow=1, Low=2, Medium=3, High=4, Unknown=0.
    pub fn ordinal(self) -> u8 {
        match self {
            Risk::Unknown => 0,
            Risk::VeryLow => 1,
            Risk::Low => 2,
            Risk::Medium => 3,
            Risk::High => 4,
        }
    }

    /// Parse a band label. Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let norm: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match norm.as_str() {
            "verylow" => Risk::VeryLow,
            "low" => Risk::Low,
            "medium" => Risk::Medium,
            "high" => Risk::High,
            _ => Risk::Unknown,
        }
    }

    /// Canonical label, matching the source flood-risk data.
    pub fn label(self) -> &'static str {
        match self {
            Risk::Unknown => "Unknown",
            Risk::VeryLow => "Very Low",
            Risk::Low => "Low",
            Risk::Medium => "Medium",
            Risk::High => "High",
        }
    }

    pub fn is_known(self) -> bool {
        self != Risk::Unknown
    }
}

impl std::fmt::Display for Risk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Risk {
    fn from(label: &str) -> Self {
        Risk::from_label(label)
    }
}

impl Serialize for Risk {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Risk {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let label: Option<String> = Option::deserialize(d)?;
        Ok(label.as_deref().map(Risk::from_label).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_band_order() {
        assert_eq!(Risk::High.ordinal(), 4);
        assert_eq!(Risk::Medium.ordinal(), 3);
        assert_eq!(Risk::Low.ordinal(), 2);
        assert_eq!(Risk::VeryLow.ordinal(), 1);
        assert_eq!(Risk::Unknown.ordinal(), 0);
        assert!(Risk::Unknown < Risk::VeryLow && Risk::Medium < Risk::High);
    }

    #[test]
    fn labels_parse_loosely() {
        assert_eq!(Risk::from_label("Very Low"), Risk::VeryLow);
        assert_eq!(Risk::from_label("very_low"), Risk::VeryLow);
        assert_eq!(Risk::from_label("VeryLow"), Risk::VeryLow);
        assert_eq!(Risk::from_label("HIGH"), Risk::High);
        assert_eq!(Risk::from_label(" medium "), Risk::Medium);
    }

    #[test]
    fn unrecognised_labels_are_unknown() {
        for label in ["NaN", "", "Severe", "4"] {
            assert_eq!(Risk::from_label(label), Risk::Unknown, "label {label:?}");
        }
    }

    #[test]
    fn serde_uses_canonical_labels() {
        let json = serde_json::to_string(&Risk::VeryLow).unwrap();
        assert_eq!(json, "\"Very Low\"");
        let back: Risk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Risk::VeryLow);
        let null: Risk = serde_json::from_str("null").unwrap();
        assert_eq!(null, Risk::Unknown);
    }
}
