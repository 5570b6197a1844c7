use rand_core::RngCore;
use thiserror::Error;

/// Failure taxonomy shared by every algorithm in the engine.
///
/// Each variant maps to a distinct caller-visible situation; the engine never
/// logs or swallows a failure, it always surfaces one of these.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("malformed ciphertext: {reason}")]
    Format { reason: String },

    #[error("value out of range: {reason}")]
    Range { reason: String },

    #[error("padding byte check failed")]
    Padding,

    #[error("shared point degenerated to the point at infinity, retry the operation")]
    DegeneratePoint,
}

impl CipherError {
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    pub fn range(reason: impl Into<String>) -> Self {
        Self::Range {
            reason: reason.into(),
        }
    }
}

/// Outcome of a key validation, reported before any transform is attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCheck {
    pub valid: bool,
    pub error: Option<String>,
}

impl KeyCheck {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Classical,
    Symmetric,
    Asymmetric,
    Hash,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Classical => "classical ciphers",
            Category::Symmetric => "symmetric ciphers",
            Category::Asymmetric => "asymmetric cryptography",
            Category::Hash => "hash functions",
        }
    }
}

/// Display metadata carried by every algorithm.
#[derive(Clone, Copy, Debug)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
}

/// One observed step of a transform, in execution order.
#[derive(Clone, Debug)]
pub struct TraceStep {
    pub index: usize,
    pub description: String,
    pub before: Option<String>,
    pub after: Option<String>,
    pub detail: Option<String>,
}

/// Receives trace steps during a transform. Purely observational: the engine
/// never reads anything back from the sink.
pub trait TraceSink {
    fn record(&mut self, step: TraceStep);
}

/// Collecting sink for callers that want the whole step sequence.
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<TraceStep>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }
}

impl TraceSink for StepLog {
    fn record(&mut self, step: TraceStep) {
        self.steps.push(step);
    }
}

/// Handle threaded through a transform call. Wraps an optional sink so the
/// disabled path costs nothing but an index bump check.
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn TraceSink>,
    next_index: usize,
}

impl<'a> Tracer<'a> {
    pub fn disabled() -> Self {
        Self {
            sink: None,
            next_index: 0,
        }
    }

    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self {
            sink: Some(sink),
            next_index: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Records a bare step with no before/after values.
    pub fn step(&mut self, description: impl Into<String>) {
        self.step_detailed(description, None, None, None);
    }

    pub fn step_detailed(
        &mut self,
        description: impl Into<String>,
        before: Option<String>,
        after: Option<String>,
        detail: Option<String>,
    ) {
        if let Some(sink) = self.sink.as_mut() {
            let index = self.next_index;
            self.next_index += 1;
            sink.record(TraceStep {
                index,
                description: description.into(),
                before,
                after,
                detail,
            });
        }
    }
}

/// The uniform capability set every algorithm implements.
///
/// Randomness enters through the `rng` handle so callers control the source;
/// `tracer` is an optional observer and never affects the result.
pub trait Algorithm {
    fn info(&self) -> AlgorithmInfo;

    /// Pure check of the key against this algorithm's format and range rules.
    fn validate_key(&self, key: &str) -> KeyCheck;

    /// Human-readable description of what the key must look like.
    fn key_requirements(&self) -> String;

    fn encrypt(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut dyn RngCore,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError>;

    fn decrypt(
        &self,
        ciphertext: &str,
        key: &str,
        tracer: &mut Tracer<'_>,
    ) -> Result<String, CipherError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracer_indexes_steps_in_order() {
        let mut log = StepLog::new();
        let mut tracer = Tracer::new(&mut log);
        tracer.step("first");
        tracer.step_detailed("second", Some("in".into()), Some("out".into()), None);
        let steps = log.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].index, 0);
        assert_eq!(steps[1].index, 1);
        assert_eq!(steps[1].before.as_deref(), Some("in"));
    }

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut tracer = Tracer::disabled();
        tracer.step("ignored");
        assert!(!tracer.is_enabled());
    }
}
