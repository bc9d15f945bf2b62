use findoc_service::{FinanceApi, ListRequest, ServiceConfig};

use crate::render::{print_documents, print_page};
use crate::{exit_with_api_error, OutputFormat};

/// Query arguments of `findoc list`.
pub(crate) struct ListArgs {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub all: bool,
}

pub(crate) async fn cmd_list(
    config: &ServiceConfig,
    args: ListArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let api = FinanceApi::from_config(config);
    let mut request = ListRequest {
        filter: args.filter,
        sort: args.sort,
        limit: args.limit,
        cursor: args.cursor,
    };

    if !args.all {
        match api.list_documents(&request).await {
            Ok(page) => print_page(&page, output, quiet),
            Err(e) => exit_with_api_error(&e, output, quiet),
        }
        return;
    }

    let mut collected = Vec::new();
    let mut pages = 0usize;
    loop {
        let page = match api.list_documents(&request).await {
            Ok(page) => page,
            Err(e) => exit_with_api_error(&e, output, quiet),
        };
        pages += 1;
        collected.extend(page.data);
        match page.next_cursor {
            Some(next) => request.cursor = Some(next),
            None => break,
        }
    }
    tracing::debug!(pages, documents = collected.len(), "walked all pages");

    print_documents(&collected, output);
    if !quiet && output == OutputFormat::Text {
        println!("-- {} documents in {} pages", collected.len(), pages);
    }
}
