use findoc_core::TransitionTable;
use findoc_service::ServiceConfig;

use crate::OutputFormat;

pub(crate) fn cmd_transitions(config: &ServiceConfig, output: OutputFormat, quiet: bool) {
    let table = TransitionTable::for_model(config.workflow.model);

    match output {
        OutputFormat::Json => {
            let transitions: serde_json::Map<String, serde_json::Value> = table
                .states()
                .map(|state| {
                    let next: Vec<&str> =
                        table.legal_next(state).iter().map(|s| s.as_str()).collect();
                    (state.as_str().to_string(), serde_json::json!(next))
                })
                .collect();
            let terminal: Vec<&str> = table
                .states()
                .filter(|s| table.is_terminal(*s))
                .map(|s| s.as_str())
                .collect();
            let value = serde_json::json!({
                "model": config.workflow.model.to_string(),
                "initial": table.initial().as_str(),
                "transitions": transitions,
                "terminal": terminal,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            if !quiet {
                println!("workflow model: {}", config.workflow.model);
            }
            for state in table.states() {
                let next = table.legal_next(state);
                let mut line = format!("{:<10}", state.as_str());
                if next.is_empty() {
                    line.push_str(" (terminal)");
                } else {
                    let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
                    line.push_str(&format!(" -> {}", names.join(", ")));
                }
                if state == table.initial() {
                    line.push_str(" (initial)");
                }
                println!("{}", line);
            }
        }
    }
}
