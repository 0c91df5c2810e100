//! Project Administration Sample
//!
//! Runs the project lifecycle and project membership workflows against the
//! project API, then deletes every project the run created.

use anyhow::anyhow;
use project_admin_client::config::Config;
use project_admin_client::credential::BearerCredential;
use project_admin_client::error::AppError;
use project_admin_client::workflow::{
    project_lifecycle_workflow, project_membership_workflow, CleanupReport, ProjectSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env();
    config.validate()?;
    info!(base_url = %config.api.base_url, "Configuration loaded");

    print_banner();

    let auth_header = match &config.workflow.auth_header {
        Some(header) => header.clone(),
        None => prompt_for_auth_header().await?,
    };
    let credential = BearerCredential::from_header(&auth_header)?;

    let mut session = ProjectSession::open(&config.api, &credential)?;

    let outcome = run_workflows(&mut session, &config, &credential).await;

    // Cleanup runs whether or not a workflow failed.
    let report = session.close().await;
    print_cleanup(&report);

    match outcome {
        Ok(()) if report.is_clean() => {
            println!("\n✓ Sample completed successfully");
            Ok(())
        }
        Ok(()) => Err(anyhow!(
            "{} project(s) could not be deleted",
            report.failed.len()
        )),
        Err(e) => {
            eprintln!("\n✗ Workflow failed: {}", e);
            Err(e.into())
        }
    }
}

async fn run_workflows(
    session: &mut ProjectSession,
    config: &Config,
    credential: &BearerCredential,
) -> Result<(), AppError> {
    let lifecycle = project_lifecycle_workflow(session, &config.workflow.search_term)
        .instrument(info_span!("project_lifecycle"))
        .await?;
    println!("\nProject lifecycle workflow (SUCCESS)");
    println!("  project id:        {}", lifecycle.project_id);
    println!("  renamed to:        {}", lifecycle.renamed_to);
    println!("  all projects:      {}", lifecycle.all_projects);
    println!("  by project number: {}", lifecycle.matching_number);
    println!("  search results:    {}", lifecycle.search_results);
    println!("  favorites:         {}", lifecycle.favorites);
    println!("  recents:           {}", lifecycle.recents);

    let member_email = match &config.workflow.member_email {
        Some(email) => email.clone(),
        None => credential.email_claim()?.ok_or_else(|| {
            AppError::InvalidCredential(
                "token has no email claim; set PROJECTS_MEMBER_EMAIL".to_string(),
            )
        })?,
    };

    let membership = project_membership_workflow(session, &member_email)
        .instrument(info_span!("project_membership", email = %member_email))
        .await?;
    println!("\nProject membership workflow (SUCCESS)");
    println!("  project id:        {}", membership.project_id);
    println!("  role id:           {}", membership.role_id);
    println!("  role permissions:  {}", membership.role_permissions);
    println!("  roles:             {}", membership.roles);
    println!("  members:           {}", membership.members);

    Ok(())
}

async fn prompt_for_auth_header() -> Result<String, AppError> {
    println!("Paste the Authorization header value ('Bearer <token>'):");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| AppError::Internal(anyhow!("Failed to read authorization header: {}", e)))?;
    Ok(line.trim().to_string())
}

fn print_banner() {
    println!("*****************************************************************");
    println!("*           Project Administration Sample                       *");
    println!("*****************************************************************\n");
}

fn print_cleanup(report: &CleanupReport) {
    println!("\nDeleting projects created by this run");
    for id in &report.deleted {
        println!("  ✓ deleted {}", id);
    }
    for id in &report.already_gone {
        println!("  - {} was already deleted", id);
    }
    for (id, e) in &report.failed {
        eprintln!("  ✗ {}: {}", id, e);
    }
}
