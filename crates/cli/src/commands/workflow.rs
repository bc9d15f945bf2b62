//! `findoc workflow`: create one document and advance it until the table
//! refuses, printing each step.

use findoc_core::{Currency, Document, DocumentInput, DocumentType, WorkflowViolation};
use findoc_service::{ApiError, FinanceApi, ServiceConfig};
use rust_decimal::Decimal;

use crate::render::document_detail;
use crate::{exit_with_api_error, OutputFormat};

pub(crate) struct DemoArgs {
    pub amount: Decimal,
    pub currency: Currency,
    pub doc_type: DocumentType,
    pub counterparty: String,
}

pub(crate) async fn cmd_workflow(
    config: &ServiceConfig,
    args: DemoArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let api = FinanceApi::from_config(config);
    let input = DocumentInput::new(args.doc_type, args.counterparty, args.amount, args.currency);

    let mut doc = match api.create_document(input).await {
        Ok(doc) => doc,
        Err(e) => exit_with_api_error(&e, output, quiet),
    };
    let mut steps = vec![step_json(&doc)];
    if output == OutputFormat::Text {
        println!("created {} in {}", doc.id, doc.status);
    }

    // Advance until the table has no next status; that final refusal is the
    // expected end of the walk.
    let rejected = loop {
        match api.advance_document(&doc.id).await {
            Ok(next) => {
                if output == OutputFormat::Text {
                    let approver = next
                        .next_approver
                        .as_deref()
                        .map(|a| format!(" (approver: {a})"))
                        .unwrap_or_default();
                    println!("v{} {} -> {}{}", next.version, doc.status, next.status, approver);
                }
                steps.push(step_json(&next));
                doc = next;
            }
            Err(ApiError::Workflow(err))
                if matches!(err.violation, WorkflowViolation::Terminal { .. }) =>
            {
                break err.to_string();
            }
            Err(e) => exit_with_api_error(&e, output, quiet),
        }
    };

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "steps": steps,
                "document": doc,
                "rejected": rejected,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            println!("rejected: {}", rejected);
            if !quiet {
                print!("{}", document_detail(&doc));
            }
        }
    }
}

fn step_json(doc: &Document) -> serde_json::Value {
    serde_json::json!({
        "status": doc.status,
        "version": doc.version,
        "nextApprover": doc.next_approver,
    })
}
