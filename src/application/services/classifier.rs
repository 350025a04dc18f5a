use serde::{Deserialize, Serialize};

use crate::domain::entities::{CommandEntry, CommandTable};

/// How a message is matched against the command table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// First entry, in declaration order, whose trigger occurs in the message
    #[default]
    Substring,
    /// An entry equal to the whole message wins, otherwise `Substring`
    ExactThenSubstring,
}

/// Maps raw message text to a canned response.
///
/// Pure: the same text always yields the same response for a given table.
pub struct Classifier {
    table: CommandTable,
    strategy: MatchStrategy,
}

impl Classifier {
    pub fn new(table: CommandTable, strategy: MatchStrategy) -> Self {
        Self { table, strategy }
    }

    pub fn classify(&self, message: &str) -> &str {
        self.find(message)
            .map(CommandEntry::response)
            .unwrap_or_else(|| self.table.default_response())
    }

    /// The entry selected for `message`, if any
    pub fn find(&self, message: &str) -> Option<&CommandEntry> {
        let normalized = message.trim().to_lowercase();

        if self.strategy == MatchStrategy::ExactThenSubstring {
            if let Some(entry) = self.table.entries().find(|e| e.matches_exactly(&normalized)) {
                return Some(entry);
            }
        }

        self.table.entries().find(|e| e.occurs_in(&normalized))
    }

    /// One line per trigger, in match order
    pub fn describe(&self) -> String {
        let mut help = format!("Strategy: {:?}\n", self.strategy);
        for entry in self.table.entries() {
            let first_line = entry.response().lines().next().unwrap_or("");
            help.push_str(&format!("  {} - {}\n", entry.trigger(), first_line));
        }
        help
    }
}
