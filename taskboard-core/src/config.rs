/// Board configuration shared by every front end.
use serde::{Deserialize, Serialize};

use crate::search::SearchMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    /// Where the board snapshot lives. `None` uses the platform data dir.
    #[serde(default)]
    pub state_file: Option<String>,
    #[serde(default = "default_fuzzy_search")]
    pub fuzzy_search: bool,
    /// `env_logger` filter, used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_fuzzy_search() -> bool {
    true
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            fuzzy_search: default_fuzzy_search(),
            log_level: None,
        }
    }
}

impl BoardConfig {
    pub fn search_mode(&self) -> SearchMode {
        if self.fuzzy_search {
            SearchMode::Fuzzy
        } else {
            SearchMode::Plain
        }
    }
}
