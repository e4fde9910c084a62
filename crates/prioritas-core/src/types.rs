//! Core types for Prioritas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Complaint category as submitted by a resident
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Infrastruktur,
    Kesehatan,
    Pendidikan,
    Ekonomi,
    Sosial,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Infrastruktur,
        Self::Kesehatan,
        Self::Pendidikan,
        Self::Ekonomi,
        Self::Sosial,
    ];

    /// Stable identifier used in feature vectors and files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infrastruktur => "infrastruktur",
            Self::Kesehatan => "kesehatan",
            Self::Pendidikan => "pendidikan",
            Self::Ekonomi => "ekonomi",
            Self::Sosial => "sosial",
        }
    }
}

/// Urgency declared on submission, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Normal,
    Mendesak,
    SangatMendesak,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 3] = [Self::Normal, Self::Mendesak, Self::SangatMendesak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Mendesak => "mendesak",
            Self::SangatMendesak => "sangat_mendesak",
        }
    }
}

/// Ground-truth or predicted handling priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLabel {
    Tinggi,
    Sedang,
    Rendah,
}

impl PriorityLabel {
    pub const ALL: [PriorityLabel; 3] = [Self::Tinggi, Self::Sedang, Self::Rendah];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tinggi => "tinggi",
            Self::Sedang => "sedang",
            Self::Rendah => "rendah",
        }
    }

    /// Ordinal rank, 0 being the most pressing
    pub fn rank(&self) -> u8 {
        match self {
            Self::Tinggi => 0,
            Self::Sedang => 1,
            Self::Rendah => 2,
        }
    }
}

macro_rules! impl_label_traits {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| format!("unknown {}: '{}'", $what, s))
            }
        }
    };
}

impl_label_traits!(Category, "category");
impl_label_traits!(UrgencyLevel, "urgency level");
impl_label_traits!(PriorityLabel, "priority label");

/// A citizen-submitted complaint
///
/// Every field except `id` is optional so that incomplete records coming from
/// the surrounding application can be represented and rejected explicitly.
/// `priority` is present only on historical, labelled records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    /// Identifier assigned by the data source
    pub id: String,

    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub urgency: Option<UrgencyLevel>,

    /// Free-text description, only used for derived features
    #[serde(default)]
    pub description: Option<String>,

    /// Area name (dusun, RT/RW)
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Ground-truth priority
    #[serde(default)]
    pub priority: Option<PriorityLabel>,
}

impl Complaint {
    /// Create a complaint with the two required fields set
    pub fn new(id: impl Into<String>, category: Category, urgency: UrgencyLevel) -> Self {
        Self {
            id: id.into(),
            category: Some(category),
            urgency: Some(urgency),
            description: None,
            location: None,
            submitted_at: None,
            priority: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = Some(submitted_at);
        self
    }

    pub fn with_priority(mut self, priority: PriorityLabel) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Check whether this record carries a ground-truth label
    pub fn is_labeled(&self) -> bool {
        self.priority.is_some()
    }

    /// Normalized area key, `None` when the location is absent or blank
    pub fn area_key(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!("Infrastruktur".parse::<Category>().unwrap(), Category::Infrastruktur);
        assert_eq!(
            " sangat_mendesak ".parse::<UrgencyLevel>().unwrap(),
            UrgencyLevel::SangatMendesak
        );
        assert_eq!("rendah".parse::<PriorityLabel>().unwrap(), PriorityLabel::Rendah);
        assert!("darurat".parse::<PriorityLabel>().is_err());
    }

    #[test]
    fn test_complaint_json_shape() {
        let json = r#"{
            "id": "c-1",
            "category": "kesehatan",
            "urgency": "sangat_mendesak",
            "location": "Dusun Krajan",
            "priority": "tinggi"
        }"#;

        let complaint: Complaint = serde_json::from_str(json).unwrap();
        assert_eq!(complaint.category, Some(Category::Kesehatan));
        assert_eq!(complaint.urgency, Some(UrgencyLevel::SangatMendesak));
        assert_eq!(complaint.priority, Some(PriorityLabel::Tinggi));
        assert!(complaint.description.is_none());
        assert_eq!(complaint.area_key().as_deref(), Some("dusun krajan"));
    }

    #[test]
    fn test_blank_location_has_no_area() {
        let complaint =
            Complaint::new("c-2", Category::Sosial, UrgencyLevel::Normal).with_location("   ");
        assert!(complaint.area_key().is_none());
        assert!(!complaint.is_labeled());
    }
}
