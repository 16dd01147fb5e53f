pub mod filter;
pub mod openai;
pub mod prompt;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage reported by the model provider
///
/// Counters the provider omits deserialize to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A generated engineering summary with cost accounting
///
/// Immutable once persisted; deleted only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Store-assigned identifier (empty until saved)
    pub id: String,
    /// The generated summary text
    pub content: String,
    /// Token usage for the generation call
    pub usage: Usage,
    /// Monetary cost in USD, rounded to six decimals
    pub cost_usd: f64,
    /// Model that produced the summary
    pub model: String,
    /// Short (non-owner-qualified) repository names covered
    pub repos: Vec<String>,
    /// Lower bound of the commit window
    pub since_iso: DateTime<Utc>,
    /// When the insight was generated
    pub created_at: DateTime<Utc>,
}

impl Insight {
    /// Format the insight as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.repos.join(", ")));
        output.push_str(&self.content);
        output.push_str("\n\n");

        output.push_str(&format!(
            "*Model: {} | Tokens: {} prompt / {} completion | Cost: ${:.6}*\n",
            self.model, self.usage.prompt_tokens, self.usage.completion_tokens, self.cost_usd
        ));
        output.push_str(&format!(
            "*Since: {} | Generated: {}*\n",
            self.since_iso.format("%Y-%m-%d"),
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output
    }
}

/// Outcome of one generation request
///
/// `Empty` means no repository yielded any filtered commits; callers must be
/// able to tell that apart from a failure, which travels through the error
/// channel instead.
#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(Insight),
    Empty,
}
