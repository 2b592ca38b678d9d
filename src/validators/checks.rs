//! Component validity tracking
//!
//! A schema graph may contain circular definitions, so "has this component been
//! checked" is not a visited flag: each component records the check token of
//! the pass that last checked it, and its stored validity is trusted only while
//! that token equals the current one. Starting a new pass on the owning
//! [`CheckContext`] makes every recorded validity stale at once.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Error, ParseError, Result};

use super::base::{ValidationStatus, ValidityStatus};

/// Opaque token identifying a check generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckToken(u64);

impl CheckToken {
    /// The generation number behind this token
    pub fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CheckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Check generation counter owned by a schema compilation context
#[derive(Debug)]
pub struct CheckContext {
    generation: AtomicU64,
}

impl CheckContext {
    /// Create a context at the first generation
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(1),
        }
    }

    /// Create a shared context
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Token of the current generation
    pub fn current(&self) -> CheckToken {
        CheckToken(self.generation.load(Ordering::Acquire))
    }

    /// Start a new generation, invalidating every recorded check
    pub fn advance(&self) -> CheckToken {
        CheckToken(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

impl Default for CheckContext {
    fn default() -> Self {
        Self::new()
    }
}

const STATE_NOT_KNOWN: u8 = 0;
const STATE_VALID: u8 = 1;
const STATE_INVALID: u8 = 2;

// Zero is never handed out by CheckContext, so it encodes "never checked".
const NO_TOKEN: u64 = 0;

/// Per-component cached validity
///
/// Mutated only through [`stamp`](Self::stamp), [`begin`](Self::begin) and
/// [`set_validity`](Self::set_validity). Concurrent checks of one component are
/// expected to be externally serialized.
#[derive(Debug)]
pub struct ValidityTracker {
    last_checked: AtomicU64,
    state: AtomicU8,
}

impl ValidityTracker {
    /// Create an unchecked tracker
    pub fn new() -> Self {
        Self {
            last_checked: AtomicU64::new(NO_TOKEN),
            state: AtomicU8::new(STATE_NOT_KNOWN),
        }
    }

    /// Token recorded by the last check, if any
    pub fn last_checked(&self) -> Option<CheckToken> {
        match self.last_checked.load(Ordering::Acquire) {
            NO_TOKEN => None,
            token => Some(CheckToken(token)),
        }
    }

    /// Whether the recorded token matches `token`
    pub fn is_fresh(&self, token: CheckToken) -> bool {
        self.last_checked() == Some(token)
    }

    /// Record `token` and mark the component valid
    pub fn stamp(&self, token: CheckToken) {
        self.last_checked.store(token.0, Ordering::Release);
        self.set_validity(ValidityStatus::Valid);
    }

    /// Record `token` while leaving the validity unknown (check in progress)
    pub fn begin(&self, token: CheckToken) {
        self.last_checked.store(token.0, Ordering::Release);
        self.set_validity(ValidityStatus::NotKnown);
    }

    /// Stored validity, regardless of freshness
    pub fn state(&self) -> ValidityStatus {
        match self.state.load(Ordering::Acquire) {
            STATE_VALID => ValidityStatus::Valid,
            STATE_INVALID => ValidityStatus::Invalid,
            _ => ValidityStatus::NotKnown,
        }
    }

    /// Override the stored validity
    pub fn set_validity(&self, status: ValidityStatus) {
        let state = match status {
            ValidityStatus::Valid => STATE_VALID,
            ValidityStatus::Invalid => STATE_INVALID,
            ValidityStatus::NotKnown => STATE_NOT_KNOWN,
        };
        self.state.store(state, Ordering::Release);
    }
}

impl Default for ValidityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Base trait for all schema components that take part in check passes
pub trait XsdComponent: fmt::Debug + Send + Sync {
    /// The component's validity tracker
    fn tracker(&self) -> &ValidityTracker;

    /// Token of the check generation relevant to this component
    fn check_token(&self) -> Result<CheckToken> {
        Err(Error::NotImplemented(format!(
            "{} does not provide a check token",
            self.describe()
        )))
    }

    /// Short human readable description, used in errors and logs
    fn describe(&self) -> String {
        format!("{:?}", self)
    }

    /// Direct sub-components reached by the check pass
    fn components(&self) -> Vec<Arc<dyn XsdComponent>> {
        Vec::new()
    }

    /// Constraints on the component itself, excluding sub-components
    fn check_content(&self) -> Vec<ParseError> {
        Vec::new()
    }

    /// Mark the component as checked and valid in the current generation
    fn check(&self) -> Result<()> {
        let token = self.check_token()?;
        self.tracker().stamp(token);
        Ok(())
    }

    /// Whether the component was checked in the current generation
    fn checked(&self) -> Result<bool> {
        Ok(self.tracker().is_fresh(self.check_token()?))
    }

    /// Tri-state validity: `None` unless checked in the current generation
    fn valid(&self) -> Result<Option<bool>> {
        Ok(self.validity()?.as_bool())
    }

    /// Validity, reported as `NotKnown` when the record is stale
    fn validity(&self) -> Result<ValidityStatus> {
        if self.checked()? {
            Ok(self.tracker().state())
        } else {
            Ok(ValidityStatus::NotKnown)
        }
    }

    /// `Full` iff checked in the current generation
    fn validation_attempted(&self) -> Result<ValidationStatus> {
        if self.checked()? {
            Ok(ValidationStatus::Full)
        } else {
            Ok(ValidationStatus::None)
        }
    }
}

/// Outcome of a schema check pass
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Validity of the root component
    pub validity: ValidityStatus,
    /// Content errors found during the pass
    pub errors: Vec<ParseError>,
}

impl CheckReport {
    /// Whether the pass found the root component valid
    pub fn is_valid(&self) -> bool {
        self.validity == ValidityStatus::Valid
    }
}

/// Check a component and everything reachable from it in the current generation
///
/// Components already stamped with the current token are not revisited; one
/// still in progress further up the recursion reports `NotKnown`, which does
/// not invalidate the component that reached it. Once the recursion unwinds,
/// invalidity found on a cycle is propagated to every component that contains
/// an invalid sub-component.
pub fn check_component(
    component: &dyn XsdComponent,
    errors: &mut Vec<ParseError>,
) -> Result<ValidityStatus> {
    let mut visited = Vec::new();
    let status = visit(component, errors, &mut visited)?;
    if visited.is_empty() {
        return Ok(status);
    }

    let nodes: Vec<&dyn XsdComponent> = visited
        .iter()
        .map(|c| c.as_ref())
        .chain(std::iter::once(component))
        .collect();
    propagate_invalid(&nodes);
    Ok(component.tracker().state())
}

fn visit(
    component: &dyn XsdComponent,
    errors: &mut Vec<ParseError>,
    visited: &mut Vec<Arc<dyn XsdComponent>>,
) -> Result<ValidityStatus> {
    let token = component.check_token()?;
    let tracker = component.tracker();
    if tracker.is_fresh(token) {
        return Ok(tracker.state());
    }
    tracker.begin(token);

    let mut status = ValidityStatus::Valid;
    for error in component.check_content() {
        tracing::warn!(component = %component.describe(), error = %error.message, "component check failed");
        errors.push(error);
        status = ValidityStatus::Invalid;
    }
    if status == ValidityStatus::Invalid {
        tracker.set_validity(status);
    }

    for child in component.components() {
        if visit(child.as_ref(), errors, visited)? == ValidityStatus::Invalid {
            status = ValidityStatus::Invalid;
        }
        visited.push(child);
    }

    tracker.set_validity(status);
    tracing::debug!(component = %component.describe(), token = %token, validity = %status, "component checked");
    Ok(status)
}

/// Mark `Invalid` every valid component holding an invalid sub-component,
/// until no record changes
fn propagate_invalid(nodes: &[&dyn XsdComponent]) {
    let mut changed = true;
    while changed {
        changed = false;
        for node in nodes {
            let tracker = node.tracker();
            if tracker.state() == ValidityStatus::Valid
                && node
                    .components()
                    .iter()
                    .any(|c| c.tracker().state() == ValidityStatus::Invalid)
            {
                tracing::debug!(component = %node.describe(), "invalid sub-component on a cycle");
                tracker.set_validity(ValidityStatus::Invalid);
                changed = true;
            }
        }
    }
}

/// Run [`check_component`] and collect the outcome
pub fn check_report(component: &dyn XsdComponent) -> Result<CheckReport> {
    let mut errors = Vec::new();
    let validity = check_component(component, &mut errors)?;
    Ok(CheckReport { validity, errors })
}
