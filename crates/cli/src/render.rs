//! Text and JSON rendering of documents for terminal output.

use findoc_core::{Document, Page};

use crate::OutputFormat;

/// One fixed-width summary line per document.
pub(crate) fn document_row(doc: &Document) -> String {
    format!(
        "{:<36}  {:<14}  {:<9}  {:<16}  {:>12} {}",
        doc.id,
        doc.doc_type.as_str(),
        doc.status.as_str(),
        doc.document_number,
        doc.total_amount.amount,
        doc.total_amount.currency,
    )
}

pub(crate) fn document_detail(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", doc.document_number, doc.id));
    out.push_str(&format!("  type:         {}\n", doc.doc_type));
    out.push_str(&format!("  status:       {}\n", doc.status));
    out.push_str(&format!("  counterparty: {}\n", doc.counterparty));
    if let Some(description) = &doc.description {
        out.push_str(&format!("  description:  {}\n", description));
    }
    out.push_str(&format!("  total:        {}\n", doc.total_amount));
    out.push_str(&format!("  issued:       {}\n", doc.issue_date));
    if let Some(due) = doc.due_date {
        out.push_str(&format!("  due:          {}\n", due));
    }
    out.push_str(&format!("  version:      {}\n", doc.version));
    if let Some(approver) = &doc.next_approver {
        out.push_str(&format!("  approver:     {}\n", approver));
    }
    out.push_str("  lines:\n");
    for (i, item) in doc.line_items.iter().enumerate() {
        out.push_str(&format!(
            "    {}. {} x{} @ {} = {} [{}]\n",
            i + 1,
            item.description,
            item.quantity,
            item.unit_price.amount,
            item.line_total.amount,
            item.account_code
        ));
    }
    if !doc.history.is_empty() {
        out.push_str("  history:\n");
        for record in &doc.history {
            out.push_str(&format!(
                "    v{} {} -> {}\n",
                record.version, record.from, record.to
            ));
        }
    }
    out
}

pub(crate) fn print_documents(docs: &[Document], output: OutputFormat) {
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(docs).unwrap_or_else(|e| format!("serialization error: {}", e))
        ),
        OutputFormat::Text => {
            for doc in docs {
                println!("{}", document_row(doc));
            }
        }
    }
}

pub(crate) fn print_page(page: &Page<Document>, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(page).unwrap_or_else(|e| format!("serialization error: {}", e))
        ),
        OutputFormat::Text => {
            for doc in &page.data {
                println!("{}", document_row(doc));
            }
            if !quiet {
                println!(
                    "-- {} shown, more: {}, next: {}, prev: {}",
                    page.data.len(),
                    page.has_more,
                    page.next_cursor.as_deref().unwrap_or("-"),
                    page.prev_cursor.as_deref().unwrap_or("-"),
                );
            }
        }
    }
}
