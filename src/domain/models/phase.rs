//! Phase plan domain model.
//!
//! A phase plan is a static, ordered table of phases. Each phase binds one
//! agent to a task template: an instruction, a script of capability call
//! templates, and the artifacts the phase must produce to count as
//! complete. Templates may reference artifacts of strictly earlier phases
//! only; dangling references are configuration errors caught by
//! [`PhasePlan::validate`] before execution starts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::artifact::ArtifactKind;
use super::task::ArtifactBinding;
use super::template;
use crate::domain::errors::OrchestrationError;

/// One capability call template within a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTemplate {
    pub capability: String,
    /// Input template; placeholder strings are substituted at
    /// materialization time.
    pub input: Value,
    pub register_as: Option<ArtifactBinding>,
}

impl CallTemplate {
    pub fn new(capability: impl Into<String>, input: Value) -> Self {
        Self {
            capability: capability.into(),
            input,
            register_as: None,
        }
    }

    pub fn registering(mut self, name: impl Into<String>, kind: ArtifactKind) -> Self {
        self.register_as = Some(ArtifactBinding::new(name, kind));
        self
    }
}

/// One step of the pipeline: an agent bound to a task template and the
/// artifacts the step must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Phase name, e.g. `visualization`.
    pub name: String,
    /// Identifier of the agent assigned to this phase.
    pub agent: String,
    /// Free-text instruction framing the task.
    pub instruction: String,
    /// Ordered capability call templates.
    pub calls: Vec<CallTemplate>,
}

impl Phase {
    pub fn new(
        name: impl Into<String>,
        agent: impl Into<String>,
        instruction: impl Into<String>,
        calls: Vec<CallTemplate>,
    ) -> Self {
        Self {
            name: name.into(),
            agent: agent.into(),
            instruction: instruction.into(),
            calls,
        }
    }

    /// Artifacts this phase declares it will produce. The phase counts as
    /// complete only when every declared artifact is registered with this
    /// phase's ordinal as producing phase.
    pub fn declared_outputs(&self) -> Vec<&ArtifactBinding> {
        self.calls
            .iter()
            .filter_map(|c| c.register_as.as_ref())
            .collect()
    }

    /// Count of declared outputs per artifact kind.
    pub fn required_kind_counts(&self) -> HashMap<ArtifactKind, usize> {
        let mut counts = HashMap::new();
        for binding in self.declared_outputs() {
            *counts.entry(binding.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Static, ordered table of phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    pub phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Validate the plan before execution.
    ///
    /// Checks, in order: the plan is non-empty; every phase declares at
    /// least one output; output names are unique across the plan; every
    /// `${artifact:...}` reference in a call template names an output of a
    /// strictly earlier phase.
    pub fn validate(&self) -> Result<(), OrchestrationError> {
        if self.phases.is_empty() {
            return Err(OrchestrationError::PlanValidation(
                "plan has no phases".to_string(),
            ));
        }

        let mut declared: HashMap<&str, usize> = HashMap::new();
        for (ordinal, phase) in self.phases.iter().enumerate() {
            let outputs = phase.declared_outputs();
            if outputs.is_empty() {
                return Err(OrchestrationError::PlanValidation(format!(
                    "phase {ordinal} ({}) declares no required artifacts",
                    phase.name
                )));
            }

            // References must resolve against earlier phases only.
            for call in &phase.calls {
                let mut refs = Vec::new();
                template::scan_artifact_refs(&call.input, &mut refs);
                for reference in refs {
                    match declared.get(reference.name.as_str()) {
                        Some(producer) if *producer < ordinal => {}
                        Some(_) => {
                            return Err(OrchestrationError::PlanValidation(format!(
                                "phase {ordinal} ({}) references artifact '{}' from a non-earlier phase",
                                phase.name, reference.name
                            )));
                        }
                        None => {
                            return Err(OrchestrationError::PlanValidation(format!(
                                "phase {ordinal} ({}) references undeclared artifact '{}'",
                                phase.name, reference.name
                            )));
                        }
                    }
                }
            }

            for binding in outputs {
                if declared.insert(binding.name.as_str(), ordinal).is_some() {
                    return Err(OrchestrationError::PlanValidation(format!(
                        "artifact name '{}' declared by more than one phase",
                        binding.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// The canonical five-phase pipeline: discovery, analysis, statistics,
    /// visualization (five charts), report.
    ///
    /// Directory roots come from run parameters (`data_dir`, `plots_dir`,
    /// `reports_dir`), so the plan itself is static.
    pub fn standard() -> Self {
        let discovery = Phase::new(
            "discovery",
            "discovery",
            "Identify CSV files in the data directory and record their metadata.",
            vec![CallTemplate::new(
                "csv.list",
                json!({"directory": "${param:data_dir}"}),
            )
            .registering("files", ArtifactKind::MetadataRecord)],
        );

        let analysis = Phase::new(
            "analysis",
            "analysis",
            "Load the discovered CSV into a named dataframe and produce a column overview.",
            vec![
                CallTemplate::new(
                    "csv.load",
                    json!({"path": "${artifact:files#/files/0/path}", "handle": "frame"}),
                )
                .registering("frame", ArtifactKind::DataframeHandle),
                // The handle is named literally: registration happens only
                // after the phase returns, so a same-phase artifact
                // reference would not resolve.
                CallTemplate::new("table.describe", json!({"handle": "frame"}))
                    .registering("overview", ArtifactKind::MetadataRecord),
            ],
        );

        let statistics = Phase::new(
            "statistics",
            "statistics",
            "Compute per-column statistics and the correlation matrix.",
            vec![
                CallTemplate::new("table.describe", json!({"handle": "${artifact:frame}"}))
                    .registering("column_stats", ArtifactKind::MetadataRecord),
                CallTemplate::new("table.correlate", json!({"handle": "${artifact:frame}"}))
                    .registering("correlations", ArtifactKind::MetadataRecord),
            ],
        );

        let visualization = Phase::new(
            "visualization",
            "visualization",
            "Render the five standard charts from the loaded dataframe.",
            vec![
                CallTemplate::new(
                    "chart.render",
                    json!({
                        "handle": "${artifact:frame}",
                        "kind": "histogram",
                        "title": "Distribution",
                        "output_path": "${param:plots_dir}/distribution.svg",
                    }),
                )
                .registering("distribution_chart", ArtifactKind::ImageFile),
                CallTemplate::new(
                    "chart.render",
                    json!({
                        "handle": "${artifact:frame}",
                        "kind": "bar",
                        "title": "Category breakdown",
                        "output_path": "${param:plots_dir}/category_breakdown.svg",
                    }),
                )
                .registering("category_chart", ArtifactKind::ImageFile),
                CallTemplate::new(
                    "chart.render",
                    json!({
                        "handle": "${artifact:frame}",
                        "kind": "scatter",
                        "title": "Relationship",
                        "output_path": "${param:plots_dir}/scatter.svg",
                    }),
                )
                .registering("scatter_chart", ArtifactKind::ImageFile),
                CallTemplate::new(
                    "chart.render",
                    json!({
                        "handle": "${artifact:frame}",
                        "kind": "box",
                        "title": "Spread",
                        "output_path": "${param:plots_dir}/box.svg",
                    }),
                )
                .registering("box_chart", ArtifactKind::ImageFile),
                CallTemplate::new(
                    "chart.render",
                    json!({
                        "handle": "${artifact:frame}",
                        "kind": "bar",
                        "column_index": 2,
                        "title": "Secondary breakdown",
                        "output_path": "${param:plots_dir}/secondary_breakdown.svg",
                    }),
                )
                .registering("breakdown_chart", ArtifactKind::ImageFile),
            ],
        );

        let report = Phase::new(
            "report",
            "report",
            "Compose the markdown analysis report from statistics and charts.",
            vec![CallTemplate::new(
                "report.compose",
                json!({
                    "title": "Data Analysis Report",
                    "dataset": "${artifact:files#/files/0/name}",
                    "overview": "${artifact:overview}",
                    "statistics": "${artifact:column_stats}",
                    "correlations": "${artifact:correlations}",
                    "charts": [
                        {"title": "Distribution", "path": "${artifact:distribution_chart}"},
                        {"title": "Category breakdown", "path": "${artifact:category_chart}"},
                        {"title": "Relationship", "path": "${artifact:scatter_chart}"},
                        {"title": "Spread", "path": "${artifact:box_chart}"},
                        {"title": "Secondary breakdown", "path": "${artifact:breakdown_chart}"},
                    ],
                    "output_path": "${param:reports_dir}/analysis_report.md",
                }),
            )
            .registering("report", ArtifactKind::ReportFile)],
        );

        Self::new(vec![discovery, analysis, statistics, visualization, report])
    }
}
