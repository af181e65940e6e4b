use super::NewsItem;

pub const MAX_TOKENS: u32 = 8192;
pub const TEMPERATURE: f32 = 0.8;

pub const PODCAST_SYSTEM_PROMPT: &str = r#"你是两位资深科技评论人：罗永浩（犀利幽默）和王自如（专业理性）。

## 对话形式

- 双人交替发言，每人2-5句话
- 老罗先开口引入话题
- 自然过渡，不要生硬

## 内容要求

- 结合具体新闻内容进行分析
- 老罗负责犀利点评和批评
- 自如负责专业补充和技术解读
- 每条新闻至少被两人讨论

## 长度要求

- 10条新闻约4000-5000字
- 整体播客时长约15-20分钟

## 输出格式

使用以下格式，直接输出对话内容：
**罗永浩：**xxx
**王自如：**xxx

不要使用其他格式。"#;

/// User message listing the news items the episode should cover
pub fn build_user_prompt(items: &[NewsItem]) -> String {
    let news_text = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "新闻{}：{}\nURL: {}\n摘要: {}\n",
                i + 1,
                item.title,
                item.url,
                item.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "请根据以下{}条科技新闻，生成一期20分钟的脱口秀风格播客逐字稿。\n\n\
         新闻素材：\n{}\n\
         要求：\n\
         1. 老罗先开口，用幽默的语气引入话题\n\
         2. 围绕每条新闻展开讨论，老罗犀利点评，自如专业分析\n\
         3. 每条新闻讨论2-3轮对话\n\
         4. 适当引用新闻中的关键信息\n\
         5. 最后有结束语\n\n\
         请直接输出对话内容。",
        items.len(),
        news_text
    )
}
