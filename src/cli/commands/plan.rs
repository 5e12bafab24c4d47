//! Implementation of the `datamill plan` commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::{standard_agents, standard_plan};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub command: PlanCommands,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Show the standard five-phase plan
    Show,
    /// Validate the standard plan and its agent roster
    Validate,
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct PhaseDetail {
    ordinal: usize,
    name: String,
    agent: String,
    instruction: String,
    capabilities: Vec<String>,
    outputs: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
struct PlanShowOutput {
    phases: Vec<PhaseDetail>,
}

impl CommandOutput for PlanShowOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Standard plan ({} phases):", self.phases.len())];
        for phase in &self.phases {
            lines.push(format!("\n  {}. {} — agent: {}", phase.ordinal, phase.name, phase.agent));
            lines.push(format!("     {}", phase.instruction));
            lines.push(format!("     Calls: {}", phase.capabilities.join(", ")));
            lines.push(format!("     Produces: {}", phase.outputs.join(", ")));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct PlanValidateOutput {
    valid: bool,
    phases: usize,
    error: Option<String>,
}

impl CommandOutput for PlanValidateOutput {
    fn to_human(&self) -> String {
        if self.valid {
            format!("Plan is valid ({} phases).", self.phases)
        } else {
            format!(
                "Plan is invalid: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(args: PlanArgs, json: bool) -> Result<()> {
    let plan = standard_plan();

    match args.command {
        PlanCommands::Show => {
            let phases = plan
                .phases
                .iter()
                .enumerate()
                .map(|(ordinal, phase)| PhaseDetail {
                    ordinal,
                    name: phase.name.clone(),
                    agent: phase.agent.clone(),
                    instruction: phase.instruction.clone(),
                    capabilities: phase.calls.iter().map(|c| c.capability.clone()).collect(),
                    outputs: phase
                        .declared_outputs()
                        .iter()
                        .map(|b| format!("{} ({})", b.name, b.kind.as_str()))
                        .collect(),
                })
                .collect();
            output(&PlanShowOutput { phases }, json);
        }
        PlanCommands::Validate => {
            let result = validate(&plan);
            let valid = result.is_ok();
            output(
                &PlanValidateOutput {
                    valid,
                    phases: plan.len(),
                    error: result.err(),
                },
                json,
            );
            if !valid {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

/// Plan validation plus roster coverage: every phase's agent must exist and
/// permit every capability its template scripts.
fn validate(plan: &crate::domain::models::PhasePlan) -> Result<(), String> {
    plan.validate().map_err(|e| e.to_string())?;

    let agents = standard_agents(&Config::default());
    for phase in &plan.phases {
        let agent = agents
            .iter()
            .find(|a| a.id == phase.agent)
            .ok_or_else(|| format!("phase '{}' has no agent '{}'", phase.name, phase.agent))?;
        for call in &phase.calls {
            if !agent.permits(&call.capability) {
                return Err(format!(
                    "phase '{}' scripts '{}' outside agent '{}' permitted set",
                    phase.name, call.capability, agent.id
                ));
            }
        }
    }
    Ok(())
}
