use findoc_service::{FinanceApi, ServiceConfig};

use crate::render::print_documents;
use crate::{exit_with_api_error, OutputFormat};

pub(crate) async fn cmd_generate(
    config: &ServiceConfig,
    count: usize,
    seed: u64,
    output: OutputFormat,
    quiet: bool,
) {
    // The seed set itself is not needed here, only the engine and simulator.
    let mut config = config.clone();
    config.dataset.count = 0;
    let api = FinanceApi::from_config(&config);

    match api.generate_documents(count, seed).await {
        Ok(docs) => print_documents(&docs, output),
        Err(e) => exit_with_api_error(&e, output, quiet),
    }
}
