//! Value types exchanged with the decision service and their JSON wire form.
//!
//! Every message is a single JSON object terminated by a newline. The
//! request carries the model identifier, the action mask, and the
//! (optionally frame-stacked) observation; the response carries one
//! selected index per head.

use serde::{Deserialize, Serialize};

use crate::contract::{
    ActionHead, ContractError, HEAD_COUNT, HEAD_SIZES, OBSERVATION_SIZE, ObservationField,
    options::NO_OP,
};

/// Fixed-length observation. Unset slots are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationVector(Vec<f64>);

impl ObservationVector {
    /// A contract-sized vector with every slot at zero.
    pub fn zeroed() -> Self {
        Self(vec![0.0; OBSERVATION_SIZE])
    }

    /// Write `value` into `field`. Non-finite values are stored as zero.
    pub fn set(&mut self, field: ObservationField, value: f64) {
        if let Some(slot) = self.0.get_mut(field.index()) {
            *slot = if value.is_finite() { value } else { 0.0 };
        }
    }

    /// Write a boolean flag as `1.0` or `0.0`.
    pub fn set_flag(&mut self, field: ObservationField, flag: bool) {
        self.set(field, if flag { 1.0 } else { 0.0 });
    }

    /// Read `field`, zero if the vector is short.
    pub fn get(&self, field: ObservationField) -> f64 {
        self.0.get(field.index()).copied().unwrap_or(0.0)
    }

    /// Raw values in index order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no slots.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check length and finiteness against the published contract.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.0.len() != OBSERVATION_SIZE {
            return Err(ContractError::ObservationLength {
                expected: OBSERVATION_SIZE,
                actual: self.0.len(),
            });
        }
        for (field, value) in ObservationField::ALL.iter().zip(&self.0) {
            if !value.is_finite() {
                return Err(ContractError::NonFinite {
                    field: field.name(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<f64>> for ObservationVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Per-head validity vectors, in head order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionMask(Vec<Vec<bool>>);

impl ActionMask {
    /// A mask where only the no-op of every head is valid.
    pub fn no_ops_only() -> Self {
        Self(
            HEAD_SIZES
                .iter()
                .map(|&size| {
                    let mut head = vec![false; size];
                    if let Some(first) = head.first_mut() {
                        *first = true;
                    }
                    head
                })
                .collect(),
        )
    }

    /// Mark `option` in `head` as valid or invalid. The no-op cannot be
    /// masked out; out-of-range options are ignored.
    pub fn set(&mut self, head: ActionHead, option: usize, valid: bool) {
        if option == NO_OP {
            return;
        }
        if let Some(slot) = self
            .0
            .get_mut(head.index())
            .and_then(|options| options.get_mut(option))
        {
            *slot = valid;
        }
    }

    /// Whether `option` of `head` is valid. Out-of-range reads are invalid.
    pub fn allows(&self, head: ActionHead, option: usize) -> bool {
        self.0
            .get(head.index())
            .and_then(|options| options.get(option))
            .copied()
            .unwrap_or(false)
    }

    /// Validity vector for `head`.
    pub fn head(&self, head: ActionHead) -> &[bool] {
        self.0.get(head.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of heads.
    pub fn head_count(&self) -> usize {
        self.0.len()
    }

    /// Check head count, head sizes and no-op validity against the contract.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.0.len() != HEAD_COUNT {
            return Err(ContractError::HeadCount {
                expected: HEAD_COUNT,
                actual: self.0.len(),
            });
        }
        for (head, options) in ActionHead::ALL.iter().zip(&self.0) {
            if options.len() != head.size() {
                return Err(ContractError::HeadSize {
                    head: head.name(),
                    expected: head.size(),
                    actual: options.len(),
                });
            }
            if options.first() != Some(&true) {
                return Err(ContractError::NoOpMasked { head: head.name() });
            }
        }
        Ok(())
    }
}

/// One selected option per head, in head order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionVector([usize; HEAD_COUNT]);

impl ActionVector {
    /// The safe default: no-op in every head.
    pub const fn no_op() -> Self {
        Self([NO_OP; HEAD_COUNT])
    }

    /// Build from explicit per-head selections without validation.
    pub const fn from_indices(indices: [usize; HEAD_COUNT]) -> Self {
        Self(indices)
    }

    /// Validate raw wire integers against head count and head sizes.
    pub fn from_wire(raw: &[i64]) -> Result<Self, ContractError> {
        if raw.len() != HEAD_COUNT {
            return Err(ContractError::HeadCount {
                expected: HEAD_COUNT,
                actual: raw.len(),
            });
        }
        let mut indices = [NO_OP; HEAD_COUNT];
        for ((slot, head), &selected) in indices.iter_mut().zip(ActionHead::ALL).zip(raw) {
            let in_range = usize::try_from(selected)
                .ok()
                .filter(|&index| index < head.size());
            match in_range {
                Some(index) => *slot = index,
                None => {
                    return Err(ContractError::OptionOutOfRange {
                        head: head.name(),
                        selected,
                        size: head.size(),
                    });
                }
            }
        }
        Ok(Self(indices))
    }

    /// Selected option of `head`.
    pub fn get(&self, head: ActionHead) -> usize {
        self.0.get(head.index()).copied().unwrap_or(NO_OP)
    }

    /// Replace the selection of `head`.
    pub fn set(&mut self, head: ActionHead, option: usize) {
        if let Some(slot) = self.0.get_mut(head.index()) {
            *slot = option;
        }
    }

    /// Whether every head selects its no-op.
    pub fn is_no_op(&self) -> bool {
        self.0.iter().all(|&index| index == NO_OP)
    }

    /// Selections in head order.
    pub const fn as_array(&self) -> &[usize; HEAD_COUNT] {
        &self.0
    }
}

impl Default for ActionVector {
    fn default() -> Self {
        Self::no_op()
    }
}

/// A single decision request line.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Model identifier the service should evaluate.
    pub model: String,
    /// Validity mask, one array per head in head order.
    pub action_masks: ActionMask,
    /// Observation frames; the outer array exists for frame stacking.
    pub obs: Vec<ObservationVector>,
    /// Select the arg-max action instead of sampling.
    #[serde(default)]
    pub deterministic: bool,
    /// Also return the log-probability of the chosen action.
    #[serde(default)]
    pub return_log_prob: bool,
    /// Also return the policy entropy.
    #[serde(default)]
    pub return_entropy: bool,
    /// Also return the value estimate.
    #[serde(default)]
    pub return_value: bool,
    /// Also return the full per-head distributions.
    #[serde(default)]
    pub return_probs: bool,
    /// [`crate::fingerprint_hex`] of the layout `obs` and `action_masks` follow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_fingerprint: Option<String>,
}

/// A single decision response line in its raw wire form.
///
/// `action` is kept as signed integers so that negative or oversized
/// indices can be reported as contract violations rather than parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    /// One selected index per head.
    pub action: Vec<i64>,
    /// Log-probability of the action, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_prob: Option<f64>,
    /// Policy entropy, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    /// Value estimate, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Why a response line could not be turned into an [`ActionVector`].
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The line is not a valid response object.
    #[error("malformed response: {source}")]
    Malformed {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The response parsed but violates the action contract.
    #[error("response violates contract: {source}")]
    Contract {
        /// The contract violation.
        #[from]
        source: ContractError,
    },
}

/// Parse and validate one response line.
pub fn parse_response(line: &str) -> Result<ActionVector, ResponseError> {
    let response: DecisionResponse = serde_json::from_str(line.trim())?;
    Ok(ActionVector::from_wire(&response.action)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_observation_matches_contract() {
        let obs = ObservationVector::zeroed();
        assert_eq!(obs.len(), OBSERVATION_SIZE);
        assert!(obs.validate().is_ok());
        assert!(obs.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn non_finite_values_are_stored_as_zero() {
        let mut obs = ObservationVector::zeroed();
        obs.set(ObservationField::Distance, f64::NAN);
        assert!(obs.get(ObservationField::Distance).abs() < f64::EPSILON);
        obs.set(ObservationField::Distance, 0.25);
        assert!((obs.get(ObservationField::Distance) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn short_observation_fails_validation() {
        let obs = ObservationVector::from(vec![0.0; 3]);
        assert!(matches!(
            obs.validate(),
            Err(ContractError::ObservationLength { actual: 3, .. })
        ));
    }

    #[test]
    fn no_op_cannot_be_masked_out() {
        let mut mask = ActionMask::no_ops_only();
        assert!(mask.validate().is_ok());
        mask.set(ActionHead::Food, NO_OP, false);
        assert!(mask.allows(ActionHead::Food, NO_OP));
        mask.set(ActionHead::Food, 1, true);
        assert!(mask.allows(ActionHead::Food, 1));
        assert!(!mask.allows(ActionHead::Food, 2));
    }

    #[test]
    fn all_zero_response_parses() {
        let action = parse_response(r#"{"action":[0,0,0,0,0,0,0,0,0,0,0,0]}"#).unwrap();
        assert_eq!(action, ActionVector::no_op());
        assert_eq!(action.as_array(), &[0; HEAD_COUNT]);
    }

    #[test]
    fn valid_nonzero_response_parses() {
        let action =
            parse_response("{\"action\":[3,0,0,1,0,1,0,0,0,2,0,1],\"logProb\":-0.5}\n").unwrap();
        assert_eq!(action.get(ActionHead::Attack), 3);
        assert_eq!(action.get(ActionHead::MagicAttackType), 1);
        assert_eq!(action.get(ActionHead::Prayer), 1);
    }

    #[test]
    fn short_action_array_is_a_contract_violation() {
        let err = parse_response(r#"{"action":[0,0,0]}"#).unwrap_err();
        assert!(matches!(
            err,
            ResponseError::Contract {
                source: ContractError::HeadCount { actual: 3, .. }
            }
        ));
    }

    #[test]
    fn out_of_range_and_negative_indices_are_rejected() {
        let too_big = parse_response(r#"{"action":[4,0,0,0,0,0,0,0,0,0,0,0]}"#);
        assert!(matches!(too_big, Err(ResponseError::Contract { .. })));
        let negative = parse_response(r#"{"action":[0,-1,0,0,0,0,0,0,0,0,0,0]}"#);
        assert!(matches!(negative, Err(ResponseError::Contract { .. })));
    }

    #[test]
    fn non_numeric_payload_is_malformed() {
        let err = parse_response(r#"{"action":["melee"]}"#).unwrap_err();
        assert!(matches!(err, ResponseError::Malformed { .. }));
        assert!(matches!(parse_response("not json"), Err(ResponseError::Malformed { .. })));
    }

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = DecisionRequest {
            model: String::from("nh-v1"),
            action_masks: ActionMask::no_ops_only(),
            obs: vec![ObservationVector::zeroed()],
            deterministic: true,
            return_log_prob: false,
            return_entropy: false,
            return_value: false,
            return_probs: false,
            contract_fingerprint: Some(crate::fingerprint_hex()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "nh-v1");
        assert_eq!(value["deterministic"], true);
        assert_eq!(value["actionMasks"].as_array().map(Vec::len), Some(HEAD_COUNT));
        assert_eq!(
            value["obs"][0].as_array().map(Vec::len),
            Some(OBSERVATION_SIZE)
        );
        assert!(value.get("returnLogProb").is_some());
        assert_eq!(value["contractFingerprint"], crate::fingerprint_hex());
    }
}
