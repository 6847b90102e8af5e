//! Terminal output helpers

use chrono::{DateTime, Local, Utc};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};

use commons_core::chat::ConversationSummary;

/// Render the conversation directory as a table
pub fn print_summaries(summaries: &[ConversationSummary]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["With", "Last message", "When", "Conversation"]);

    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.title),
            Cell::new(summary.last_message.as_deref().unwrap_or("—")),
            Cell::new(
                summary
                    .last_at
                    .map(|at| format_time(&at))
                    .unwrap_or_else(|| "—".to_string()),
            ),
            Cell::new(summary.id.to_string()),
        ]);
    }

    println!("{table}");
}

/// Short local-time stamp for message rows
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %e %H:%M").to_string()
}
