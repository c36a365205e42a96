//! Terminal rendering of comparison results and session totals.
//!
//! Plain text only: one section per model with the response or error,
//! the token split, estimated cost, and elapsed time, followed by an
//! optional running-totals block for multi-round sessions.

use rust_decimal::Decimal;

use crate::session::Session;
use crate::types::{ComparisonResult, Outcome};

const RULE: &str = "----------------------------------------------------------------------";

fn format_cost(cost: Option<Decimal>) -> String {
    match cost {
        Some(c) => format!("${c:.6}"),
        None => "n/a".to_string(),
    }
}

/// Render one round of results as per-model sections, in result order.
pub fn render_results(results: &[ComparisonResult]) -> String {
    let mut out = String::new();

    for result in results {
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "{}  [{}ms, {}]\n",
            result.model,
            result.elapsed_ms,
            result.completed_at.format("%H:%M:%S"),
        ));
        out.push_str(RULE);
        out.push('\n');

        match &result.outcome {
            Outcome::Success { text, usage, cost } => {
                out.push_str(text);
                out.push('\n');
                match usage {
                    Some(u) => out.push_str(&format!(
                        "\ntokens: {u} | estimated cost: {}\n",
                        format_cost(*cost),
                    )),
                    None => out.push_str("\ntokens: n/a (no usage metadata) | estimated cost: n/a\n"),
                }
            }
            Outcome::Failure { error } => {
                out.push_str(&format!("ERROR: {error}\n"));
            }
        }
        out.push('\n');
    }

    out
}

/// Render the session's running per-model totals.
pub fn render_totals(session: &Session) -> String {
    let mut out = String::new();
    out.push_str(&format!("Session totals after {} round(s):\n", session.rounds()));
    for thread in session.threads() {
        out.push_str(&format!("  {:<24} {}\n", thread.spec.id, thread.tally));
    }
    out.push_str(&format!(
        "  combined estimated cost: {}\n",
        format_cost(Some(session.total_cost())),
    ));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
