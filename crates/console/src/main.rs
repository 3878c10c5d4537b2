use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use faqdesk_console::config::ConsoleConfig;
use faqdesk_console::orchestrator::{RefreshOutcome, WorkflowOrchestrator};
use faqdesk_core::inbox::{InboxItem, ACTIVE_STATUSES};
use faqdesk_core::workflow::InboxAction;
use faqdesk_gateway::{HttpInboxApi, InboxApi};

/// One line of output per active item.
#[derive(Serialize)]
struct ItemLine<'a> {
    item: &'a InboxItem,
    actions: Vec<InboxAction>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faqdesk_console=debug,faqdesk_gateway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ConsoleConfig::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        actor_id = %config.actor.id,
        role = %config.actor.role,
        faq_enabled = config.faq_enabled,
        "Loaded console configuration",
    );

    // --- Inbox API ---
    let api: Arc<dyn InboxApi> = Arc::new(
        HttpInboxApi::new(&config.api_url, config.api_token.clone(), config.request_timeout)
            .context("Failed to build Inbox API client")?,
    );

    let orchestrator = WorkflowOrchestrator::new(api, config.actor.clone(), &config);

    // --- Load every page of the active inbox ---
    match orchestrator
        .refresh()
        .await
        .context("Failed to load the inbox")?
    {
        RefreshOutcome::Applied { items } => tracing::debug!(items, "Loaded first pages"),
        RefreshOutcome::Superseded => {}
    }
    while orchestrator.has_more().await {
        let mut added = 0;
        for status in ACTIVE_STATUSES {
            added += orchestrator
                .load_more(*status)
                .await
                .with_context(|| format!("Failed to load more {status} items"))?;
        }
        if added == 0 {
            break;
        }
    }

    for item in orchestrator.snapshot().await {
        let line = ItemLine {
            actions: orchestrator.available_actions(&item.id).await,
            item: &item,
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    tracing::info!("Done");
    Ok(())
}
