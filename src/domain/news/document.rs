//! Plain-text documents kept next to each episode: the `news.txt` source list
//! and the `show_notes.md` listing.

use super::NewsItem;

const TITLE_LABEL: &str = "新闻";
const URL_LABEL: &str = "URL";
const SUMMARY_LABEL: &str = "摘要";
const SHOW_NAME: &str = "科技双响炮";

pub fn render_news(items: &[NewsItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}{}: {}\n", TITLE_LABEL, i + 1, item.title));
        out.push_str(&format!("{}: {}\n", URL_LABEL, item.url));
        out.push_str(&format!("{}: {}\n", SUMMARY_LABEL, item.summary));
        out.push('\n');
    }
    out
}

/// Reads a `news.txt` back into items. Lines that belong to no item are
/// ignored; continuation lines are appended to the summary.
pub fn parse_news(text: &str) -> Vec<NewsItem> {
    let mut items = Vec::new();
    let mut current: Option<NewsItem> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(title) = title_line(line) {
            if let Some(item) = current.take() {
                items.push(item);
            }
            current = Some(NewsItem {
                title: title.to_string(),
                url: String::new(),
                summary: String::new(),
                published_at: None,
            });
            continue;
        }

        let Some(item) = current.as_mut() else {
            continue;
        };

        if let Some(url) = labelled(line, URL_LABEL) {
            item.url = url.to_string();
        } else if let Some(summary) = labelled(line, SUMMARY_LABEL) {
            item.summary = summary.to_string();
        } else if item.summary.is_empty() {
            item.summary = line.to_string();
        } else {
            item.summary.push(' ');
            item.summary.push_str(line);
        }
    }

    if let Some(item) = current {
        items.push(item);
    }
    items
}

/// `新闻<n>: <title>` with either colon width
fn title_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(TITLE_LABEL)?;
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    strip_colon(&rest[digits..])
}

fn labelled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    strip_colon(line.strip_prefix(label)?)
}

fn strip_colon(rest: &str) -> Option<&str> {
    rest.strip_prefix(':')
        .or_else(|| rest.strip_prefix('：'))
        .map(str::trim)
}

pub fn render_show_notes(date: &str, items: &[NewsItem]) -> String {
    let mut blocks = vec![
        format!("# {} - {}\n", SHOW_NAME, date),
        "## 本期新闻\n".to_string(),
    ];
    for (i, item) in items.iter().enumerate() {
        blocks.push(format!("### {}. {}\n", i + 1, item.title.trim()));
        blocks.push(format!("{}\n", item.summary.trim()));
    }
    blocks.join("\n")
}
