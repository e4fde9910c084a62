//! Feature extraction
//!
//! Turns a [`Complaint`] into a [`FeatureVector`] of discretized string values.
//! Every feature is categorical or a small ordinal bucket so that both the
//! Chi-Square test and the categorical Naive Bayes model apply directly.
//!
//! Extraction is pure: the extractor holds only its configuration and an
//! immutable snapshot of area history, and the same complaint always yields
//! the same vector.

use crate::config::FeatureConfig;
use aho_corasick::AhoCorasick;
use chrono::{DateTime, Datelike, Utc, Weekday};
use prioritas_core::{Complaint, Error, PriorityLabel, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Feature names produced by [`FeatureExtractor`]
pub mod names {
    pub const CATEGORY: &str = "category";
    pub const URGENCY_LEVEL: &str = "urgency_level";
    pub const DESCRIPTION_LENGTH_BUCKET: &str = "description_length_bucket";
    pub const LOCATION_DENSITY_BUCKET: &str = "location_density_bucket";
    pub const HAS_PRIOR_COMPLAINTS_IN_AREA: &str = "has_prior_complaints_in_area";
    pub const MENTIONS_HAZARD: &str = "mentions_hazard";
    pub const SUBMITTED_ON_WEEKEND: &str = "submitted_on_weekend";

    pub const ALL: [&str; 7] = [
        CATEGORY,
        URGENCY_LEVEL,
        DESCRIPTION_LENGTH_BUCKET,
        LOCATION_DENSITY_BUCKET,
        HAS_PRIOR_COMPLAINTS_IN_AREA,
        MENTIONS_HAZARD,
        SUBMITTED_ON_WEEKEND,
    ];
}

/// Fallback bucket for optional fields that are absent
pub const UNKNOWN: &str = "unknown";

const YES: &str = "yes";
const NO: &str = "no";

/// Discretized features of one complaint, keyed by feature name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<String, String>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Feature names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only the named features
    pub fn restrict<'a>(&self, keep: impl IntoIterator<Item = &'a str>) -> FeatureVector {
        let values = keep
            .into_iter()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Self { values }
    }
}

/// Snapshot of when complaints were filed per area
///
/// Built once from historical records and never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaHistory {
    /// Area key → number of recorded complaints (dated or not)
    counts: BTreeMap<String, usize>,

    /// Area key → earliest known submission time
    earliest: BTreeMap<String, DateTime<Utc>>,

    /// Area key → ids of the recorded complaints
    #[serde(default)]
    members: BTreeMap<String, BTreeSet<String>>,
}

impl AreaHistory {
    pub fn from_complaints<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> Self {
        let mut history = Self::default();

        for complaint in complaints {
            let Some(area) = complaint.area_key() else {
                continue;
            };

            *history.counts.entry(area.clone()).or_insert(0) += 1;
            history
                .members
                .entry(area.clone())
                .or_default()
                .insert(complaint.id.clone());

            if let Some(at) = complaint.submitted_at {
                history
                    .earliest
                    .entry(area)
                    .and_modify(|e| {
                        if at < *e {
                            *e = at;
                        }
                    })
                    .or_insert(at);
            }
        }

        history
    }

    /// Complaints recorded for the area
    pub fn count(&self, area: &str) -> usize {
        self.counts.get(area).copied().unwrap_or(0)
    }

    /// Complaints recorded for the area other than `complaint` itself
    ///
    /// A record of the history sees the same count as a new complaint filed
    /// into the same area.
    pub fn others_in_area(&self, area: &str, complaint_id: &str) -> usize {
        let recorded = self.count(area);
        let is_member = self
            .members
            .get(area)
            .is_some_and(|ids| ids.contains(complaint_id));
        if is_member {
            recorded.saturating_sub(1)
        } else {
            recorded
        }
    }

    /// Whether a complaint in the area was filed strictly before `at`
    pub fn has_complaint_before(&self, area: &str, at: DateTime<Utc>) -> bool {
        self.earliest.get(area).is_some_and(|e| *e < at)
    }
}

/// Converts complaints into feature vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExtractorSpec", into = "ExtractorSpec")]
pub struct FeatureExtractor {
    config: FeatureConfig,
    history: AreaHistory,
    hazards: AhoCorasick,
}

/// Serialized form of [`FeatureExtractor`]; the keyword matcher is rebuilt on load
#[derive(Serialize, Deserialize)]
struct ExtractorSpec {
    config: FeatureConfig,
    #[serde(default)]
    history: AreaHistory,
}

impl TryFrom<ExtractorSpec> for FeatureExtractor {
    type Error = Error;

    fn try_from(spec: ExtractorSpec) -> Result<Self> {
        Self::with_history(spec.config, spec.history)
    }
}

impl From<FeatureExtractor> for ExtractorSpec {
    fn from(extractor: FeatureExtractor) -> Self {
        Self {
            config: extractor.config,
            history: extractor.history,
        }
    }
}

// The keyword matcher is derived from the config, so it takes no part in equality.
impl PartialEq for FeatureExtractor {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config && self.history == other.history
    }
}

impl FeatureExtractor {
    /// Create an extractor with no area history
    pub fn new(config: FeatureConfig) -> Result<Self> {
        Self::with_history(config, AreaHistory::default())
    }

    /// Create an extractor backed by an area history snapshot
    pub fn with_history(config: FeatureConfig, history: AreaHistory) -> Result<Self> {
        config.validate()?;

        let hazards = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&config.hazard_keywords)
            .map_err(|e| Error::config(format!("Failed to build hazard keyword matcher: {}", e)))?;

        Ok(Self {
            config,
            history,
            hazards,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn history(&self) -> &AreaHistory {
        &self.history
    }

    /// Extract the feature vector of one complaint
    ///
    /// Fails with `InvalidComplaint` when category or urgency is missing.
    pub fn extract(&self, complaint: &Complaint) -> Result<FeatureVector> {
        let category = complaint
            .category
            .ok_or_else(|| Error::invalid_complaint(&complaint.id, "missing category"))?;
        let urgency = complaint
            .urgency
            .ok_or_else(|| Error::invalid_complaint(&complaint.id, "missing urgency level"))?;

        let description = complaint
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        let area = complaint.area_key();

        let mut vector = FeatureVector::new();
        vector.insert(names::CATEGORY, category.as_str());
        vector.insert(names::URGENCY_LEVEL, urgency.as_str());
        vector.insert(
            names::DESCRIPTION_LENGTH_BUCKET,
            self.length_bucket(description),
        );
        vector.insert(
            names::LOCATION_DENSITY_BUCKET,
            self.density_bucket(area.as_deref(), &complaint.id),
        );
        vector.insert(
            names::HAS_PRIOR_COMPLAINTS_IN_AREA,
            match (area.as_deref(), complaint.submitted_at) {
                (Some(area), Some(at)) => yes_no(self.history.has_complaint_before(area, at)),
                _ => UNKNOWN,
            },
        );
        vector.insert(
            names::MENTIONS_HAZARD,
            match description {
                Some(text) => yes_no(self.hazards.is_match(text)),
                None => UNKNOWN,
            },
        );
        vector.insert(
            names::SUBMITTED_ON_WEEKEND,
            match complaint.submitted_at {
                Some(at) => yes_no(matches!(at.weekday(), Weekday::Sat | Weekday::Sun)),
                None => UNKNOWN,
            },
        );

        Ok(vector)
    }

    /// Extract every complaint, failing on the first invalid one
    pub fn extract_all(&self, complaints: &[Complaint]) -> Result<Vec<FeatureVector>> {
        complaints.iter().map(|c| self.extract(c)).collect()
    }

    /// Extract a labelled batch, pairing each vector with its ground truth
    ///
    /// A record without a priority label is an `InvalidComplaint`.
    pub fn extract_labeled(
        &self,
        complaints: &[Complaint],
    ) -> Result<Vec<(FeatureVector, PriorityLabel)>> {
        complaints
            .iter()
            .map(|c| {
                let label = c
                    .priority
                    .ok_or_else(|| Error::invalid_complaint(&c.id, "missing priority label"))?;
                Ok((self.extract(c)?, label))
            })
            .collect()
    }

    fn length_bucket(&self, description: Option<&str>) -> &'static str {
        match description.map(|d| d.chars().count()) {
            None => UNKNOWN,
            Some(len) if len < self.config.short_max_chars => "short",
            Some(len) if len < self.config.medium_max_chars => "medium",
            Some(_) => "long",
        }
    }

    fn density_bucket(&self, area: Option<&str>, complaint_id: &str) -> &'static str {
        match area.map(|a| self.history.others_in_area(a, complaint_id)) {
            None => UNKNOWN,
            Some(n) if n <= self.config.density_low_max => "low",
            Some(n) if n <= self.config.density_medium_max => "medium",
            Some(_) => "high",
        }
    }
}

/// Extract with the default configuration and no area history
pub fn extract(complaint: &Complaint) -> Result<FeatureVector> {
    FeatureExtractor::new(FeatureConfig::default())?.extract(complaint)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        YES
    } else {
        NO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use prioritas_core::{Category, UrgencyLevel};

    fn at(day: u32) -> DateTime<Utc> {
        // October 2026: the 3rd is a Saturday
        Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_required_fields() {
        let mut complaint = Complaint::new("c-1", Category::Kesehatan, UrgencyLevel::Normal);
        complaint.category = None;

        let err = extract(&complaint).unwrap_err();
        assert!(matches!(err, Error::InvalidComplaint { ref id, .. } if id == "c-1"));

        let mut complaint = Complaint::new("c-2", Category::Kesehatan, UrgencyLevel::Normal);
        complaint.urgency = None;
        assert!(extract(&complaint).is_err());
    }

    #[test]
    fn test_missing_optional_fields_fall_back_to_unknown() {
        let complaint = Complaint::new("c-1", Category::Ekonomi, UrgencyLevel::Mendesak);
        let vector = extract(&complaint).unwrap();

        assert_eq!(vector.len(), names::ALL.len());
        assert_eq!(vector.get(names::CATEGORY), Some("ekonomi"));
        assert_eq!(vector.get(names::URGENCY_LEVEL), Some("mendesak"));
        for name in [
            names::DESCRIPTION_LENGTH_BUCKET,
            names::LOCATION_DENSITY_BUCKET,
            names::HAS_PRIOR_COMPLAINTS_IN_AREA,
            names::MENTIONS_HAZARD,
            names::SUBMITTED_ON_WEEKEND,
        ] {
            assert_eq!(vector.get(name), Some(UNKNOWN), "{}", name);
        }
    }

    #[test]
    fn test_description_buckets_and_hazards() {
        let extractor = FeatureExtractor::new(FeatureConfig::default()).unwrap();
        let base = Complaint::new("c", Category::Infrastruktur, UrgencyLevel::Normal);

        let short = extractor
            .extract(&base.clone().with_description("Jembatan PUTUS"))
            .unwrap();
        assert_eq!(short.get(names::DESCRIPTION_LENGTH_BUCKET), Some("short"));
        assert_eq!(short.get(names::MENTIONS_HAZARD), Some("yes"));

        let medium = extractor
            .extract(&base.clone().with_description("a".repeat(120)))
            .unwrap();
        assert_eq!(medium.get(names::DESCRIPTION_LENGTH_BUCKET), Some("medium"));
        assert_eq!(medium.get(names::MENTIONS_HAZARD), Some("no"));

        let long = extractor
            .extract(&base.clone().with_description("a".repeat(200)))
            .unwrap();
        assert_eq!(long.get(names::DESCRIPTION_LENGTH_BUCKET), Some("long"));

        let blank = extractor.extract(&base.with_description("   ")).unwrap();
        assert_eq!(blank.get(names::DESCRIPTION_LENGTH_BUCKET), Some(UNKNOWN));
    }

    #[test]
    fn test_area_history_features() {
        let history: Vec<Complaint> = (0..4)
            .map(|i| {
                Complaint::new(format!("h-{}", i), Category::Sosial, UrgencyLevel::Normal)
                    .with_location(" Dusun Krajan ")
                    .with_submitted_at(at(5 + i))
            })
            .collect();
        let extractor = FeatureExtractor::with_history(
            FeatureConfig::default(),
            AreaHistory::from_complaints(&history),
        )
        .unwrap();

        let early = Complaint::new("n-1", Category::Sosial, UrgencyLevel::Normal)
            .with_location("dusun krajan")
            .with_submitted_at(at(5));
        let vector = extractor.extract(&early).unwrap();
        assert_eq!(vector.get(names::LOCATION_DENSITY_BUCKET), Some("medium"));
        assert_eq!(vector.get(names::HAS_PRIOR_COMPLAINTS_IN_AREA), Some("no"));

        let later = early.clone().with_submitted_at(at(20));
        let vector = extractor.extract(&later).unwrap();
        assert_eq!(vector.get(names::HAS_PRIOR_COMPLAINTS_IN_AREA), Some("yes"));

        let elsewhere = later.with_location("Dusun Lor");
        let vector = extractor.extract(&elsewhere).unwrap();
        assert_eq!(vector.get(names::LOCATION_DENSITY_BUCKET), Some("low"));
        assert_eq!(vector.get(names::HAS_PRIOR_COMPLAINTS_IN_AREA), Some("no"));
    }

    #[test]
    fn test_density_excludes_the_complaint_itself() {
        let in_rt = |n: usize| -> Vec<Complaint> {
            (0..n)
                .map(|i| {
                    Complaint::new(format!("h-{}", i), Category::Sosial, UrgencyLevel::Normal)
                        .with_location("RT 01")
                })
                .collect()
        };

        // Training row: h-0 plus two others in its area.
        let three = in_rt(3);
        let training = FeatureExtractor::with_history(
            FeatureConfig::default(),
            AreaHistory::from_complaints(&three),
        )
        .unwrap();
        let training_view = training.extract(&three[0]).unwrap();

        // New complaint into an area that already holds two.
        let incoming = Complaint::new("n-1", Category::Sosial, UrgencyLevel::Normal)
            .with_location("RT 01");
        let serving = FeatureExtractor::with_history(
            FeatureConfig::default(),
            AreaHistory::from_complaints(&in_rt(2)),
        )
        .unwrap();
        let serving_view = serving.extract(&incoming).unwrap();

        assert_eq!(training_view.get(names::LOCATION_DENSITY_BUCKET), Some("low"));
        assert_eq!(
            training_view.get(names::LOCATION_DENSITY_BUCKET),
            serving_view.get(names::LOCATION_DENSITY_BUCKET)
        );

        let history = AreaHistory::from_complaints(&three);
        assert_eq!(history.count("rt 01"), 3);
        assert_eq!(history.others_in_area("rt 01", "h-1"), 2);
        assert_eq!(history.others_in_area("rt 01", "n-1"), 3);
    }

    #[test]
    fn test_weekend_flag() {
        let base = Complaint::new("c", Category::Pendidikan, UrgencyLevel::Normal);
        let saturday = extract(&base.clone().with_submitted_at(at(3))).unwrap();
        let monday = extract(&base.with_submitted_at(at(5))).unwrap();

        assert_eq!(saturday.get(names::SUBMITTED_ON_WEEKEND), Some("yes"));
        assert_eq!(monday.get(names::SUBMITTED_ON_WEEKEND), Some("no"));
    }

    #[test]
    fn test_restrict() {
        let complaint = Complaint::new("c", Category::Pendidikan, UrgencyLevel::Normal);
        let vector = extract(&complaint).unwrap();
        let restricted = vector.restrict([names::URGENCY_LEVEL, "not_a_feature"]);

        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted.get(names::URGENCY_LEVEL), Some("normal"));
    }

    #[test]
    fn test_extractor_serde_rebuilds_matcher() {
        let history = vec![Complaint::new("h", Category::Sosial, UrgencyLevel::Normal)
            .with_location("RT 01")];
        let extractor = FeatureExtractor::with_history(
            FeatureConfig::default(),
            AreaHistory::from_complaints(&history),
        )
        .unwrap();

        let json = serde_json::to_string(&extractor).unwrap();
        let restored: FeatureExtractor = serde_json::from_str(&json).unwrap();

        let complaint = Complaint::new("c", Category::Sosial, UrgencyLevel::Normal)
            .with_location("rt 01")
            .with_description("Rumah warga roboh");
        assert_eq!(
            extractor.extract(&complaint).unwrap(),
            restored.extract(&complaint).unwrap()
        );
    }
}
