use findoc_service::{FinanceApi, ServiceConfig};

use crate::render::document_detail;
use crate::{exit_with_api_error, OutputFormat};

pub(crate) async fn cmd_show(config: &ServiceConfig, id: &str, output: OutputFormat, quiet: bool) {
    let api = FinanceApi::from_config(config);
    match api.get_document(id).await {
        Ok(doc) => match output {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&doc)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            ),
            OutputFormat::Text => print!("{}", document_detail(&doc)),
        },
        Err(e) => exit_with_api_error(&e, output, quiet),
    }
}
