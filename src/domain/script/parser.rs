use super::{DialogueUnit, Speaker};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// `**<tag>：**` or `**<tag>:**`
static TAG_MARKER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\*\*([^*\n]+?)[：:]\*\*").unwrap());

/// Tag spellings accepted by default. Older scripts use the nicknames.
const DEFAULT_TAGS: &[(&str, Speaker)] = &[
    ("彪悍罗", Speaker::Luoyonghao),
    ("罗永浩", Speaker::Luoyonghao),
    ("OK王", Speaker::Wangziru),
    ("王自如", Speaker::Wangziru),
];

/// Splits a dialogue script into speaker-tagged units.
///
/// The parser is forgiving: unknown tags and empty lines are dropped rather
/// than reported as errors.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    tags: HashMap<String, Speaker>,
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS.iter().copied())
    }
}

impl ScriptParser {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = (S, Speaker)>,
        S: Into<String>,
    {
        let tags = tags
            .into_iter()
            .map(|(tag, speaker)| (tag.into().trim().to_string(), speaker))
            .collect();
        Self { tags }
    }

    pub fn parse(&self, script: &str) -> Vec<DialogueUnit> {
        let markers: Vec<(usize, usize, &str)> = TAG_MARKER
            .captures_iter(script)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let tag = caps.get(1)?;
                Some((whole.start(), whole.end(), tag.as_str().trim()))
            })
            .collect();

        let mut units = Vec::with_capacity(markers.len());

        for (position, &(_, text_start, tag)) in markers.iter().enumerate() {
            let text_end = markers
                .get(position + 1)
                .map(|&(next_start, _, _)| next_start)
                .unwrap_or(script.len());

            let Some(&speaker) = self.tags.get(tag) else {
                tracing::debug!(tag = tag, "Ignoring unknown speaker tag");
                continue;
            };

            let text = script[text_start..text_end].trim();
            if text.is_empty() {
                continue;
            }

            units.push(DialogueUnit {
                index: units.len(),
                speaker,
                text: text.to_string(),
            });
        }

        units
    }

    pub async fn parse_file(&self, path: &Path) -> std::io::Result<Vec<DialogueUnit>> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(self.parse(&content))
    }
}
