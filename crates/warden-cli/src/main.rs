//! CLI binary for validating and designing governed ML pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use warden_feasibility::DesignOutcome;
use warden_lifecycle::{InMemoryProjectRegistry, TransitionMetadata};
use warden_service::ProjectService;
use warden_types::{DesignRequest, LifecycleState, ModelFamily, Severity};

#[derive(Parser)]
#[command(name = "warden", version, about = "Lifecycle governance for ML pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a design request without generating candidates
    Validate {
        /// Path to the design request JSON file
        request: PathBuf,
    },

    /// Validate a request and generate ranked pipeline candidates
    Design {
        /// Path to the design request JSON file
        request: PathBuf,

        /// Emit the full response as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Walk a demo project through the full lifecycle in memory
    Demo {
        /// Path to the design request JSON file
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Validate { request } => cmd_validate(&request)?,
        Commands::Design { request, json } => cmd_design(&request, json)?,
        Commands::Demo { request } => cmd_demo(&request).await?,
    }

    Ok(())
}

fn load_request(path: &std::path::Path) -> anyhow::Result<DesignRequest> {
    let source = std::fs::read_to_string(path)?;
    let request = serde_json::from_str(&source)?;
    Ok(request)
}

fn cmd_validate(path: &std::path::Path) -> anyhow::Result<()> {
    let request = load_request(path)?;
    let report = warden_validation::validate(&request);

    if report.violations.is_empty() {
        println!("Request is valid (feasibility score {:.2})", report.feasibility_score);
        return Ok(());
    }

    for violation in &report.violations {
        let severity = match violation.severity {
            Severity::Hard => "HARD",
            Severity::Soft => "SOFT",
        };
        println!("[{}] {}: {}", severity, violation.constraint, violation.message);
    }
    for suggestion in &report.suggestions {
        println!(
            "[SUGGEST] {}: {} -> {} ({})",
            suggestion.constraint, suggestion.current, suggestion.suggested, suggestion.reason
        );
    }
    println!(
        "Feasibility score: {:.2} ({})",
        report.feasibility_score,
        if report.is_valid { "valid" } else { "invalid" }
    );

    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_design(path: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let request = load_request(path)?;
    let service = ProjectService::new(Arc::new(InMemoryProjectRegistry::new()));
    let response = service.design(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if !response.validation.is_valid {
        println!("Request failed validation:");
        for violation in response.validation.hard_violations() {
            println!("  {}: {}", violation.constraint, violation.message);
        }
        std::process::exit(1);
    }

    match response.outcome {
        Some(DesignOutcome::Feasible { candidates }) => {
            println!("{} feasible candidate(s):", candidates.len());
            for candidate in &candidates {
                println!(
                    "  {} — ${:.2}, {:.3} kg, {} ms, accuracy {:.2} (score {:.2})",
                    candidate.name,
                    candidate.estimated_cost_usd,
                    candidate.estimated_carbon_kg,
                    candidate.estimated_latency_ms,
                    candidate.estimated_accuracy,
                    candidate.feasibility_score
                );
            }
        }
        Some(DesignOutcome::Infeasible { candidates, suggestions }) => {
            println!("No feasible candidates ({} rejected)", candidates.len());
            for suggestion in &suggestions {
                println!(
                    "  relax {}: {} -> {}",
                    suggestion.constraint, suggestion.current, suggestion.suggested
                );
            }
            std::process::exit(1);
        }
        Some(DesignOutcome::NoEligibleFamilies) => {
            println!("No model family is eligible for this request");
            std::process::exit(1);
        }
        None => unreachable!("valid request always produces an outcome"),
    }

    Ok(())
}

async fn cmd_demo(path: &std::path::Path) -> anyhow::Result<()> {
    let request = load_request(path)?;
    let service = ProjectService::new(Arc::new(InMemoryProjectRegistry::new()));

    let project = service.create_project(request.name.clone()).await?;
    let id = project.id;
    println!("Created project {} ({})", project.name, id);

    service
        .transition(
            id,
            LifecycleState::DatasetProfiled,
            Some(TransitionMetadata::Profile(request.data_profile.clone())),
        )
        .await?;
    service
        .transition(id, LifecycleState::DatasetValidated, None)
        .await?;
    service
        .transition(
            id,
            LifecycleState::ConstraintsValidated,
            Some(TransitionMetadata::Constraints(request.constraints.clone())),
        )
        .await?;
    service
        .transition(id, LifecycleState::FeasibilityApproved, None)
        .await?;

    let response = service.design(&request);
    let Some(DesignOutcome::Feasible { candidates }) = response.outcome else {
        anyhow::bail!("request produced no feasible candidates");
    };
    println!("Generated {} candidate(s)", candidates.len());
    let family = candidates
        .first()
        .and_then(|c| c.model_families.first().copied())
        .unwrap_or(ModelFamily::Classical);

    service
        .transition(
            id,
            LifecycleState::CandidatesGenerated,
            Some(TransitionMetadata::Candidates(candidates)),
        )
        .await?;

    let rows = request.data_profile.num_samples.unwrap_or(10_000);
    let plan = service.plan_training(id, rows, 3, family).await?;
    if !plan.approved {
        println!("Training plan blocked:");
        for violation in &plan.violations {
            println!("  {}: {}", violation.code, violation.message);
        }
        std::process::exit(1);
    }
    println!(
        "Training plan approved: ${:.2}, {:.3} kg, {} ms",
        plan.plan.estimate.cost_usd, plan.plan.estimate.carbon_kg, plan.plan.estimate.duration_ms
    );

    let start = service.start_training(id, false).await?;
    println!("Safety gate passed; {} monitor(s) attached", start.monitors.len());
    for warning in &start.report.decision.warnings {
        println!("  warning: {}", warning);
    }

    let result = warden_types::TrainingResult {
        status: warden_types::ExecutionStatus::Completed,
        metrics: warden_types::ExecutionMetrics {
            cost_usd: plan.plan.estimate.cost_usd,
            carbon_kg: plan.plan.estimate.carbon_kg,
            memory_mb: plan.plan.estimate.memory_mb,
            duration_ms: plan.plan.estimate.duration_ms,
            steps_completed: 4,
        },
        completed_at: chrono::Utc::now(),
    };
    let project = service.complete_training(id, result).await?;
    println!("Project finished in state {}", project.current_state);

    Ok(())
}
