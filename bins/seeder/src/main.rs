//! Database seeder for HRFlow development and testing.
//!
//! Seeds a small organisation with a complete reporting chain and the
//! default approval flows, then prints a bearer token per employee.
//! Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;

use hrflow_core::approval::{FlowStep, RequestKind};
use hrflow_db::repositories::{
    ApprovalFlowRepository, CreateEmployeeInput, CreateFlowInput, EmployeeRepository,
};
use hrflow_shared::{AppConfig, JwtConfig, JwtService};

/// Employees as `(code, name, role, department, manager)`.
const EMPLOYEES: &[(&str, &str, &str, &str, Option<&str>)] = &[
    ("EMP0001", "Ana Lima", "Employee", "Engineering", Some("EMP0002")),
    ("EMP0002", "Ben Okafor", "TeamLeader", "Engineering", Some("EMP0003")),
    ("EMP0003", "Chen Wei", "Manager", "Engineering", Some("EMP0004")),
    ("EMP0004", "Dana Kowalski", "HR", "People", None),
    ("EMP0005", "Eli Navarro", "Employee", "Engineering", Some("EMP0002")),
    ("EMP0006", "Fatima Haddad", "TeamLeader", "Engineering", Some("EMP0003")),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = hrflow_db::connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding employees...");
    let employees = EmployeeRepository::new(db.clone());
    seed_employees(&employees).await?;

    println!("Seeding approval flows...");
    let flows = ApprovalFlowRepository::new(db, config.approval.flow_cache_ttl_secs);
    seed_flows(&flows).await?;

    println!("Development tokens:");
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: 24 * 60,
    });
    for (code, name, role, _, _) in EMPLOYEES {
        let token = jwt.generate_access_token(code, role)?;
        println!("  {code} {name} ({role}):\n    {token}");
    }

    println!("Seeding complete!");
    Ok(())
}

async fn seed_employees(repo: &EmployeeRepository) -> anyhow::Result<()> {
    for (code, name, role, department, _) in EMPLOYEES {
        repo.upsert(CreateEmployeeInput {
            employee_id: (*code).to_string(),
            name: (*name).to_string(),
            email: Some(format!("{}@hrflow.local", code.to_lowercase())),
            role: (*role).to_string(),
            department: Some((*department).to_string()),
        })
        .await
        .with_context(|| format!("Failed to seed employee {code}"))?;
    }

    // Managers must exist before anyone can report to them.
    for (code, _, _, _, manager) in EMPLOYEES {
        if let Some(manager) = manager {
            repo.set_manager(code, manager)
                .await
                .with_context(|| format!("Failed to link {code} to {manager}"))?;
        }
    }

    println!("  {} employees", EMPLOYEES.len());
    Ok(())
}

fn default_steps(kind: RequestKind) -> Vec<FlowStep> {
    let roles: &[&str] = match kind {
        RequestKind::Leave => &["Employee", "TeamLeader", "Manager", "HR"],
        RequestKind::Project => &["Employee", "TeamLeader", "Manager"],
        RequestKind::Task => &["Employee", "TeamLeader"],
    };
    roles
        .iter()
        .zip(1..)
        .map(|(role, seq)| FlowStep::new(role, seq))
        .collect()
}

async fn seed_flows(repo: &ApprovalFlowRepository) -> anyhow::Result<()> {
    for kind in RequestKind::ALL {
        let flow = repo
            .upsert(CreateFlowInput {
                request_type: kind.flow_request_type().to_string(),
                display_name: kind.flow_display_name().to_string(),
                steps: default_steps(kind),
            })
            .await
            .with_context(|| format!("Failed to seed {kind} flow"))?;

        let roles: Vec<&str> = flow.ordered_steps().iter().map(|s| s.role.as_str()).collect();
        println!("  {} / {}: {}", flow.request_type, flow.display_name, roles.join(" -> "));
    }
    Ok(())
}
