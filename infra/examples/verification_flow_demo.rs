//! Example walking one email verification against the in-memory backend
//!
//! Run with: cargo run --example verification_flow_demo

use std::sync::Arc;

use ev_core::domain::entities::EmailType;
use ev_core::services::verification::{
    EmailVerificationFlow, FlowCallbacks, RequestOutcome, SubmitOutcome, VerificationServiceConfig,
};
use ev_infra::{init_tracing, load_config, InMemoryVerificationBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(None)?;
    init_tracing(&config.logging)?;

    let backend = Arc::new(InMemoryVerificationBackend::from_settings(&config.verification)?);
    let service_config = VerificationServiceConfig::from_settings(&config.verification)?;

    let flow = EmailVerificationFlow::mount(
        EmailType::Contact,
        None,
        backend.clone(),
        service_config,
        FlowCallbacks::new().on_verified(|completed| {
            println!(
                "  -> Verified {} for slots {:?}",
                completed.address, completed.email_types
            );
        }),
    );

    let address = "jane.doe@canada.ca";
    println!("\n=== Requesting a code for {} ===", address);
    match flow.request_code(address).await? {
        RequestOutcome::Sent { email_types, .. } => {
            println!("  -> Code sent, covering {:?}", email_types);
        }
        RequestOutcome::Throttled { remaining_seconds } => {
            println!("  -> Throttled, retry in {} seconds", remaining_seconds);
        }
    }

    println!("\n=== Requesting again straight away ===");
    if let RequestOutcome::Throttled { remaining_seconds } = flow.request_code(address).await? {
        println!("  -> Throttled, retry in {} seconds", remaining_seconds);
    }

    println!("\n=== Submitting a wrong code ===");
    let code = backend.last_dispatched_code().await.unwrap_or_default();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    if let Err(error) = flow.submit_code(wrong).await {
        println!("  -> Rejected: {}", error);
    }

    println!("\n=== Submitting the code from the outbox ===");
    if let SubmitOutcome::Verified(completed) = flow.submit_code(&code).await? {
        println!("  -> Backend user id: {}", completed.id);
    }

    for email_type in [EmailType::Contact, EmailType::Work] {
        let slot = backend.slot(email_type).await;
        println!(
            "{}: {:?} (verified: {})",
            email_type,
            slot.address,
            slot.is_verified()
        );
    }

    Ok(())
}
