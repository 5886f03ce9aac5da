//! Parameter domains, the full search range, the searchable subrange and
//! sampled configurations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::errors::SpaceError;
use crate::value::ParameterValue;

/// Name of the reserved entry holding the checkpoint identifiers.
pub const NUM_EPOCHS: &str = "num_epochs";

/// The set of values a single parameter can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Numeric or ordinal values, sorted ascending by the caller.
    Ordered(Vec<ParameterValue>),
    /// Categorical alternatives; never sub-ranged.
    #[serde(alias = "choice", alias = "set")]
    Unordered(Vec<ParameterValue>),
}

impl Domain {
    pub fn ordered<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        Self::Ordered(values.into_iter().map(Into::into).collect())
    }

    /// Builds a categorical domain. Repeated values collapse to their first
    /// occurrence.
    pub fn unordered<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        let mut seen = HashSet::new();
        let values = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &ParameterValue| seen.insert(v.clone()))
            .collect();
        Self::Unordered(values)
    }

    /// Parses a domain from JSON. A bare array is an ordered domain.
    pub fn from_json_value(param: &str, value: serde_json::Value) -> Result<Self, SpaceError> {
        let domain = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)
                .map(Self::Ordered)
                .map_err(|e| SpaceError::InvalidDomain {
                    param: param.to_string(),
                    message: e.to_string(),
                })?,
            serde_json::Value::Object(_) => {
                serde_json::from_value::<Self>(value).map_err(|e| SpaceError::InvalidDomain {
                    param: param.to_string(),
                    message: e.to_string(),
                })?
            }
            other => {
                return Err(SpaceError::InvalidDomain {
                    param: param.to_string(),
                    message: format!(
                        "expected an array or an `ordered`/`unordered` object, got {other}"
                    ),
                })
            }
        };

        match domain {
            Self::Unordered(values) => Ok(Self::unordered(values)),
            ordered => Ok(ordered),
        }
    }

    pub fn values(&self) -> &[ParameterValue] {
        match self {
            Self::Ordered(values) | Self::Unordered(values) => values,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Ordered(_))
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Index of `value` in the domain.
    pub fn position(&self, value: &ParameterValue) -> Option<usize> {
        self.values().iter().position(|v| v == value)
    }

    fn validate(&self, param: &str) -> Result<(), SpaceError> {
        validate_values(param, self.values(), self.is_ordered())
    }
}

fn validate_values(
    param: &str,
    values: &[ParameterValue],
    ordered: bool,
) -> Result<(), SpaceError> {
    if values.is_empty() {
        return Err(SpaceError::EmptyDomain {
            param: param.to_string(),
        });
    }
    if ordered {
        let mut seen = HashSet::with_capacity(values.len());
        for value in values {
            if !seen.insert(value) {
                return Err(SpaceError::DuplicateValue {
                    param: param.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// The full, immutable search space of a run.
///
/// `num_epochs` is split off at construction and never appears among the
/// optimized parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullRange {
    params: BTreeMap<String, Domain>,
    num_epochs: Vec<ParameterValue>,
}

impl FullRange {
    /// Validates `domains` and extracts the `num_epochs` checkpoints.
    pub fn new(mut domains: BTreeMap<String, Domain>) -> Result<Self, SpaceError> {
        let num_epochs = match domains.remove(NUM_EPOCHS) {
            Some(Domain::Ordered(values)) => values,
            Some(Domain::Unordered(_)) => return Err(SpaceError::UnorderedNumEpochs),
            None => return Err(SpaceError::MissingNumEpochs),
        };
        validate_values(NUM_EPOCHS, &num_epochs, true)?;

        for (param, domain) in &domains {
            domain.validate(param)?;
        }

        Ok(Self {
            params: domains,
            num_epochs,
        })
    }

    pub fn builder() -> FullRangeBuilder {
        FullRangeBuilder::default()
    }

    /// Parses a JSON object mapping parameter names to domains.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, SpaceError> {
        let serde_json::Value::Object(entries) = value else {
            return Err(SpaceError::NotAnObject);
        };
        let domains = entries
            .into_iter()
            .map(|(param, raw)| Domain::from_json_value(&param, raw).map(|d| (param, d)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::new(domains)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SpaceError> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    pub fn get(&self, param: &str) -> Option<&Domain> {
        self.params.get(param)
    }

    /// Optimized parameters in name order; `num_epochs` excluded.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Domain)> {
        self.params.iter()
    }

    pub fn num_epochs(&self) -> &[ParameterValue] {
        &self.num_epochs
    }

    /// Number of optimized parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters that offer an actual choice (more than one value).
    pub fn tunable_count(&self) -> usize {
        self.params.values().filter(|d| d.len() > 1).count()
    }
}

/// Chained construction of a [`FullRange`].
#[derive(Debug, Clone, Default)]
pub struct FullRangeBuilder {
    domains: BTreeMap<String, Domain>,
}

impl FullRangeBuilder {
    pub fn ordered<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        self.domains.insert(name.into(), Domain::ordered(values));
        self
    }

    pub fn unordered<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        self.domains.insert(name.into(), Domain::unordered(values));
        self
    }

    pub fn num_epochs<I, V>(self, checkpoints: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParameterValue>,
    {
        self.ordered(NUM_EPOCHS, checkpoints)
    }

    pub fn build(self) -> Result<FullRange, SpaceError> {
        FullRange::new(self.domains)
    }
}

/// The currently searchable values per parameter.
///
/// Ordered entries hold a contiguous slice of the full domain; categorical
/// entries hold the whole set. A subrange counts as initialized once any
/// entry is inserted or [`SubRange::mark_initialized`] is called, so a space
/// without optimized parameters is initialized exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubRange {
    params: BTreeMap<String, Vec<ParameterValue>>,
    #[serde(skip)]
    initialized: bool,
}

impl SubRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn get(&self, param: &str) -> Option<&[ParameterValue]> {
        self.params.get(param).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, param: &str) -> Option<&mut Vec<ParameterValue>> {
        self.params.get_mut(param)
    }

    pub fn insert(&mut self, param: impl Into<String>, values: Vec<ParameterValue>) {
        self.params.insert(param.into(), values);
        self.initialized = true;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ParameterValue>)> {
        self.params.iter()
    }

    /// Total number of values across all entries.
    pub fn total_values(&self) -> usize {
        self.params.values().map(Vec::len).sum()
    }
}

impl std::fmt::Display for SubRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (param, values)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}: [")?;
            for (j, value) in values.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
    }
}

/// One concrete value per parameter.
///
/// Backed by an ordered map, so two configurations with the same
/// (name, value) pairs hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, ParameterValue>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: &str) -> Option<&ParameterValue> {
        self.0.get(param)
    }

    pub fn insert(&mut self, param: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(param.into(), value.into());
    }

    /// A copy of this configuration tagged with the checkpoint `epoch`.
    pub fn with_num_epochs(&self, epoch: ParameterValue) -> Self {
        let mut tagged = self.clone();
        tagged.0.insert(NUM_EPOCHS.to_string(), epoch);
        tagged
    }

    pub fn num_epochs(&self) -> Option<&ParameterValue> {
        self.0.get(NUM_EPOCHS)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Configuration
where
    K: Into<String>,
    V: Into<ParameterValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (param, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}={value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lr_space() -> FullRange {
        FullRange::builder()
            .ordered("lr", [0.01, 0.1, 1.0])
            .unordered("activation", ["relu", "tanh"])
            .num_epochs([1, 2])
            .build()
            .unwrap()
    }

    #[test]
    fn builder_splits_off_num_epochs() {
        let space = lr_space();
        assert_eq!(space.len(), 2);
        assert!(!space.is_empty());
        assert!(space.get(NUM_EPOCHS).is_none());
        assert_eq!(
            space.num_epochs(),
            &[ParameterValue::Int(1), ParameterValue::Int(2)]
        );
    }

    #[test]
    fn tunable_count_ignores_single_valued() {
        let space = FullRange::builder()
            .ordered("lr", [0.1, 1.0])
            .ordered("layers", [2])
            .unordered("cell", ["lstm"])
            .num_epochs([5, 10, 20])
            .build()
            .unwrap();
        assert_eq!(space.tunable_count(), 1);
    }

    #[test]
    fn checkpoints_alone_form_an_empty_space() {
        let space = FullRange::builder().num_epochs([1, 2]).build().unwrap();
        assert!(space.is_empty());
        assert_eq!(space.tunable_count(), 0);
    }

    #[test]
    fn subrange_initialized_by_insert_or_mark() {
        let mut subrange = SubRange::new();
        assert!(!subrange.is_initialized());
        subrange.mark_initialized();
        assert!(subrange.is_initialized());

        let mut subrange = SubRange::new();
        subrange.insert("lr", vec![0.1.into()]);
        assert!(subrange.is_initialized());
    }

    #[test]
    fn missing_num_epochs_rejected() {
        let err = FullRange::builder()
            .ordered("lr", [0.1])
            .build()
            .unwrap_err();
        assert!(matches!(err, SpaceError::MissingNumEpochs));
    }

    #[test]
    fn unordered_num_epochs_rejected() {
        let err = FullRange::builder()
            .unordered(NUM_EPOCHS, [1, 2])
            .build()
            .unwrap_err();
        assert!(matches!(err, SpaceError::UnorderedNumEpochs));
    }

    #[test]
    fn empty_and_duplicate_domains_rejected() {
        let err = FullRange::builder()
            .ordered("lr", Vec::<f64>::new())
            .num_epochs([1])
            .build()
            .unwrap_err();
        assert!(matches!(err, SpaceError::EmptyDomain { .. }));

        let err = FullRange::builder()
            .ordered("lr", [0.1, 0.1])
            .num_epochs([1])
            .build()
            .unwrap_err();
        assert!(matches!(err, SpaceError::DuplicateValue { .. }));
    }

    #[test]
    fn unordered_collapses_repeats() {
        let domain = Domain::unordered(["relu", "tanh", "relu"]);
        assert_eq!(domain.len(), 2);
        assert!(!domain.is_ordered());
    }

    #[test]
    fn json_space_accepts_arrays_and_tagged_objects() {
        let space = FullRange::from_json_value(json!({
            "lr": [0.01, 0.1, 1.0],
            "hidden": {"ordered": [64, 128]},
            "activation": {"unordered": ["relu", "tanh"]},
            "cell": {"choice": ["lstm", "gru"]},
            "num_epochs": [1, 2],
        }))
        .unwrap();

        assert!(space.get("lr").unwrap().is_ordered());
        assert!(space.get("hidden").unwrap().is_ordered());
        assert!(!space.get("activation").unwrap().is_ordered());
        assert!(!space.get("cell").unwrap().is_ordered());
        assert_eq!(space.tunable_count(), 4);
    }

    #[test]
    fn json_space_rejects_unknown_domain_shapes() {
        let err = FullRange::from_json_value(json!({
            "lr": 0.1,
            "num_epochs": [1],
        }))
        .unwrap_err();
        match err {
            SpaceError::InvalidDomain { param, .. } => assert_eq!(param, "lr"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = FullRange::from_json_value(json!({
            "lr": {"range": [0.1, 1.0]},
            "num_epochs": [1],
        }))
        .unwrap_err();
        assert!(matches!(err, SpaceError::InvalidDomain { .. }));

        let err = FullRange::from_json_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, SpaceError::NotAnObject));
    }

    #[test]
    fn json_space_requires_num_epochs() {
        let err = FullRange::from_json_str(r#"{"lr": [0.1]}"#).unwrap_err();
        assert!(matches!(err, SpaceError::MissingNumEpochs));
    }

    #[test]
    fn configuration_hash_ignores_insertion_order() {
        let a: Configuration = [("lr", ParameterValue::Float(0.1)), ("act", "relu".into())]
            .into_iter()
            .collect();
        let b: Configuration = [("act", ParameterValue::from("relu")), ("lr", 0.1.into())]
            .into_iter()
            .collect();

        let mut tried = HashSet::new();
        tried.insert(a);
        assert!(tried.contains(&b));
    }

    #[test]
    fn with_num_epochs_leaves_original_untouched() {
        let mut config = Configuration::new();
        config.insert("lr", 0.1);
        let tagged = config.with_num_epochs(ParameterValue::Int(2));

        assert!(config.num_epochs().is_none());
        assert_eq!(tagged.num_epochs(), Some(&ParameterValue::Int(2)));
        assert_eq!(tagged.len(), 2);
    }

    #[test]
    fn display_formats() {
        let mut subrange = SubRange::new();
        subrange.insert("lr", vec![0.1.into(), 1.0.into()]);
        assert_eq!(subrange.to_string(), "{lr: [0.1, 1]}");

        let config: Configuration = [("lr", 0.1)].into_iter().collect();
        assert_eq!(config.to_string(), "{lr=0.1}");
    }
}
