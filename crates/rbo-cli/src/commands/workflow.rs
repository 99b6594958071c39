//! Workflow dry-runs. Nothing is persisted; the caller stores the printed
//! state and context.

use anyhow::{Context, Result};
use chrono::Utc;
use rbo_lifecycle::{FulfillmentStatus, SaleStatus};
use rbo_workflow::{
    advance_fulfilment, events_for_fulfilment_transition, run_sale, FulfilState,
    FulfilmentContext, SaleContext, SaleEvent, SaleWorkflowState,
};

pub fn fulfilment_plan(from: &str, to: &str, workflow_state: Option<&str>) -> Result<()> {
    let from: FulfillmentStatus = from.parse()?;
    let to: FulfillmentStatus = to.parse()?;
    let workflow_state = workflow_state
        .map(str::parse::<FulfilState>)
        .transpose()?;

    let run = advance_fulfilment(from, to, workflow_state, FulfilmentContext::default())?;
    for event in events_for_fulfilment_transition(from, to) {
        println!("event={}", event);
    }
    println!("state={}", run.state);
    println!("changed={}", run.changed);
    Ok(())
}

pub fn sale_step(
    status: &str,
    event: &str,
    workflow_state: Option<&str>,
    context: Option<&str>,
) -> Result<()> {
    let status: SaleStatus = status.parse()?;
    let event: SaleEvent =
        serde_json::from_str(event.trim()).context("--event must be a sale event JSON object")?;
    let workflow_state = workflow_state
        .map(str::parse::<SaleWorkflowState>)
        .transpose()?;
    let context: SaleContext = match context {
        Some(raw) => serde_json::from_str(raw.trim()).context("--context must be valid JSON")?,
        None => SaleContext::default(),
    };

    let step = run_sale(status, &event, workflow_state, &context, Utc::now());
    println!("state={}", step.state);
    println!("changed={}", step.changed);
    println!("cleared={}", step.cleared);
    println!(
        "{}",
        serde_json::to_string(&step.context).context("serialize sale context failed")?
    );
    Ok(())
}
