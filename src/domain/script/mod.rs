pub mod parser;

pub use parser::ScriptParser;

use serde::{Deserialize, Serialize};

/// Canonical speaker identifiers used as voice lookup keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Luoyonghao,
    Wangziru,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Luoyonghao => "luoyonghao",
            Speaker::Wangziru => "wangziru",
        }
    }

    /// Name printed in scripts and show notes
    pub fn display_name(&self) -> &'static str {
        match self {
            Speaker::Luoyonghao => "罗永浩",
            Speaker::Wangziru => "王自如",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attributed line of the script.
///
/// `index` is the position of the unit in the parsed script and stays attached
/// to the unit through filtering, synthesis and reassembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueUnit {
    pub index: usize,
    pub speaker: Speaker,
    pub text: String,
}

/// Count of units per speaker, in speaker order
pub fn speaker_counts(units: &[DialogueUnit]) -> Vec<(Speaker, usize)> {
    let mut counts = std::collections::BTreeMap::new();
    for unit in units {
        *counts.entry(unit.speaker).or_insert(0usize) += 1;
    }
    counts.into_iter().collect()
}
