//! Dependency validator for pipeline specifications.
//!
//! The engine runs all registered [`ValidationRule`]s against a
//! [`PipelineSpec`] and collects every diagnostic into a
//! [`ValidationReport`] — it never short-circuits on the first error, so
//! users see all problems at once. Validation happens before any external
//! process launches.
//!
//! Some rules also *repair*: [`resolve_derived_params`] fills in parameters
//! that the rule set knows how to derive (currently `aoc.k` from the
//! preceding `ikc` stage) and must run before the engine so a derivable
//! omission is not reported as an error.

use tracing::debug;

use crate::methods::MethodRegistry;

use super::errors::PipelineError;
use super::spec::PipelineSpec;

// ─── Severity and report ────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    /// 0-based stage position the finding refers to.
    pub stage_index: usize,
    pub error: PipelineError,
}

impl ValidationDiagnostic {
    pub fn error(stage_index: usize, error: PipelineError) -> Self {
        Self {
            severity: Severity::Error,
            stage_index,
            error,
        }
    }

    pub fn warning(stage_index: usize, error: PipelineError) -> Self {
        Self {
            severity: Severity::Warning,
            stage_index,
            error,
        }
    }
}

/// Collected diagnostics from running all rules.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// Consume the report, surfacing the first error if any.
    pub fn into_result(self) -> super::errors::Result<()> {
        match self
            .diagnostics
            .into_iter()
            .find(|d| d.severity == Severity::Error)
        {
            Some(diagnostic) => Err(diagnostic.error),
            None => Ok(()),
        }
    }
}

// ─── Rule trait and engine ──────────────────────────────────────────────────

/// A single validation rule inspecting a whole pipeline specification.
///
/// Rules are stateless and `Send + Sync` so one engine can be shared.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier (e.g. `"seed_dependency"`).
    fn name(&self) -> &str;

    fn validate(&self, spec: &PipelineSpec, registry: &MethodRegistry)
        -> Vec<ValidationDiagnostic>;
}

/// Runs a set of rules against a spec and collects all diagnostics.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(KnownMethodsRule));
        engine.add_rule(Box::new(RequiredParamsRule));
        engine.add_rule(Box::new(ExistingClusteringRule));
        engine.add_rule(Box::new(SeedDependencyRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn validate(&self, spec: &PipelineSpec, registry: &MethodRegistry) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec, registry));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Parameter derivation ───────────────────────────────────────────────────

/// Fill in derivable parameters before validation.
///
/// An `aoc` stage that omits `k` inherits it from the nearest preceding
/// `ikc` stage that carries one. The derivation is part of the dependency
/// contract, not an incidental default: the augmentation threshold tracks
/// the seed's core number.
pub fn resolve_derived_params(spec: &mut PipelineSpec) {
    for aoc_index in 0..spec.stages.len() {
        if spec.stages[aoc_index].method != "aoc"
            || spec.stages[aoc_index].params.contains_key("k")
        {
            continue;
        }
        let seed_k = spec.stages[..aoc_index]
            .iter()
            .rev()
            .find(|s| s.method == "ikc")
            .and_then(|s| s.params.get("k").cloned());
        if let Some(k) = seed_k {
            debug!(stage = aoc_index, k = %k, "derived aoc k from preceding ikc stage");
            spec.stages[aoc_index].params.insert("k".to_string(), k);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. every method must be registered ─────────────────────────────────────

struct KnownMethodsRule;

impl ValidationRule for KnownMethodsRule {
    fn name(&self) -> &str {
        "known_methods"
    }

    fn validate(
        &self,
        spec: &PipelineSpec,
        registry: &MethodRegistry,
    ) -> Vec<ValidationDiagnostic> {
        spec.iter()
            .filter(|(_, stage)| !registry.contains(&stage.method))
            .map(|(index, stage)| {
                ValidationDiagnostic::error(
                    index,
                    PipelineError::UnknownMethod {
                        method: stage.method.clone(),
                    },
                )
            })
            .collect()
    }
}

// ─── 2. required parameters present ─────────────────────────────────────────

struct RequiredParamsRule;

impl ValidationRule for RequiredParamsRule {
    fn name(&self) -> &str {
        "required_params"
    }

    fn validate(
        &self,
        spec: &PipelineSpec,
        registry: &MethodRegistry,
    ) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();
        for (index, stage) in spec.iter() {
            let Some(descriptor) = registry.descriptor(&stage.method) else {
                continue; // KnownMethodsRule reports this one.
            };
            for param in descriptor.required_params {
                if !stage.params.contains_key(*param) {
                    out.push(ValidationDiagnostic::error(
                        index,
                        PipelineError::missing_parameter(&stage.method, *param),
                    ));
                }
            }
        }
        out
    }
}

// ─── 3. refinement methods need an earlier stage ────────────────────────────

struct ExistingClusteringRule;

impl ValidationRule for ExistingClusteringRule {
    fn name(&self) -> &str {
        "existing_clustering"
    }

    fn validate(
        &self,
        spec: &PipelineSpec,
        registry: &MethodRegistry,
    ) -> Vec<ValidationDiagnostic> {
        spec.iter()
            .filter(|(index, stage)| {
                *index == 0
                    && registry
                        .descriptor(&stage.method)
                        .is_some_and(|d| d.needs_existing_clustering)
            })
            .map(|(index, stage)| {
                ValidationDiagnostic::error(
                    index,
                    PipelineError::dependency(
                        &stage.method,
                        "refines an existing clustering and cannot run as the first stage",
                    ),
                )
            })
            .collect()
    }
}

// ─── 4. aoc must follow an ikc seed ─────────────────────────────────────────

struct SeedDependencyRule;

impl ValidationRule for SeedDependencyRule {
    fn name(&self) -> &str {
        "seed_dependency"
    }

    fn validate(
        &self,
        spec: &PipelineSpec,
        _registry: &MethodRegistry,
    ) -> Vec<ValidationDiagnostic> {
        spec.iter()
            .filter(|(index, stage)| {
                stage.method == "aoc"
                    && !spec.stages[..*index].iter().any(|s| s.method == "ikc")
            })
            .map(|(index, _)| {
                ValidationDiagnostic::error(
                    index,
                    PipelineError::dependency(
                        "aoc",
                        "requires a preceding 'ikc' seeding stage anywhere earlier in the pipeline",
                    ),
                )
            })
            .collect()
    }
}
