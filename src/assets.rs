use log::{debug, info, warn};
use serde::Serialize;

use crate::chunk::truncate_chars;
use crate::data_api::{ChannelVideo, VideoDetails};
use crate::generate::ResilientGenerator;
use crate::quiz::{self, MAX_QUIZ_ATTEMPTS, QuizItem};

pub const NO_SUGGESTION: &str = "(no suggestion)";
pub const TITLE_COUNT: usize = 8;
pub const MEME_TITLE_COUNT: usize = 3;
pub const SUMMARY_POINT_COUNT: usize = 5;
pub const DESCRIPTION_COUNT: usize = 2;
pub const HASHTAG_COUNT: usize = 14;
pub const TOP_CHANNEL_VIDEOS: usize = 10;

/// Title styles, in the order their titles appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TitleCategory {
    Curiosity,
    Informative,
    Provocative,
    Dramatic,
    Expert,
}

impl TitleCategory {
    pub const ALL: [TitleCategory; 5] = [
        TitleCategory::Curiosity,
        TitleCategory::Informative,
        TitleCategory::Provocative,
        TitleCategory::Dramatic,
        TitleCategory::Expert,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TitleCategory::Curiosity => "흥미유발",
            TitleCategory::Informative => "정보성",
            TitleCategory::Provocative => "문제제기",
            TitleCategory::Dramatic => "드라마틱",
            TitleCategory::Expert => "전문성",
        }
    }

    fn style(&self) -> &'static str {
        match self {
            TitleCategory::Curiosity => "sparks curiosity",
            TitleCategory::Informative => "is informative",
            TitleCategory::Provocative => "raises a problem or question",
            TitleCategory::Dramatic => "is dramatic",
            TitleCategory::Expert => "sounds expert and authoritative",
        }
    }
}

/// Everything generated for one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBundle {
    pub summary_points: Vec<String>,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub hashtags: Vec<String>,
    pub quizzes: Vec<QuizItem>,
}

/// What the asset prompts know about the video and its channel
#[derive(Debug, Clone, Default)]
pub struct VideoContext {
    pub details: VideoDetails,
    pub channel_videos: Vec<ChannelVideo>,
}

impl VideoContext {
    /// Most viewed channel videos as prompt lines
    pub fn top_videos(&self) -> String {
        let mut videos: Vec<&ChannelVideo> = self.channel_videos.iter().collect();
        videos.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        videos
            .iter()
            .take(TOP_CHANNEL_VIDEOS)
            .map(|v| format!("- {} (views: {})", v.title, format_count(v.view_count)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Non-empty trimmed lines with leading list markers removed
fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"title (meme: name)"` into its title and meme parts
pub fn split_meme_title(title: &str) -> (String, Option<String>) {
    let trimmed = title.trim();
    let parts = trimmed
        .strip_suffix(')')
        .and_then(|body| body.rfind('(').map(|idx| (body[..idx].trim(), body[idx + 1..].trim())));
    match parts {
        Some((text, meme)) if !text.is_empty() && !meme.is_empty() => (text.to_string(), Some(meme.to_string())),
        _ => (trimmed.to_string(), None),
    }
}

/// Issues the fixed sequence of asset prompts
pub struct AssetGenerator {
    generator: ResilientGenerator,
    language: String,
    fixed_hashtags: Vec<String>,
    quiz_attempts: u32,
}

impl AssetGenerator {
    pub fn new(generator: ResilientGenerator, language: &str, fixed_hashtags: Vec<String>) -> Self {
        Self {
            generator,
            language: language.to_string(),
            fixed_hashtags,
            quiz_attempts: MAX_QUIZ_ATTEMPTS,
        }
    }

    pub async fn generate(&self, summary: &str, context: &VideoContext) -> AssetBundle {
        let top_videos = context.top_videos();

        let summary_points = self.summary_points(summary).await;

        let mut titles = Vec::with_capacity(TITLE_COUNT);
        for category in TitleCategory::ALL {
            titles.push(self.category_title(category, summary, context, &top_videos).await);
        }
        titles.extend(self.meme_titles(summary, &top_videos).await);
        while titles.len() < TITLE_COUNT {
            titles.push(NO_SUGGESTION.to_string());
        }
        titles.truncate(TITLE_COUNT);

        let descriptions = self.descriptions(summary, context).await;
        let hashtags = self.hashtags(summary).await;

        let quizzes = quiz::generate_quizzes(&self.generator, summary, &self.language, self.quiz_attempts)
            .await
            .items;

        info!(
            "Assets ready: {} points, {} titles, {} descriptions, {} hashtags, {} quizzes",
            summary_points.len(),
            titles.len(),
            descriptions.len(),
            hashtags.len(),
            quizzes.len()
        );

        AssetBundle {
            summary_points,
            titles,
            descriptions,
            hashtags,
            quizzes,
        }
    }

    async fn summary_points(&self, summary: &str) -> Vec<String> {
        let prompt = format!(
            "Split the following YouTube video summary into {SUMMARY_POINT_COUNT} key points. Write each point as one \
sentence on its own line and start it with a fitting emoji. Do not number them. Write in {}.\n\n{summary}",
            self.language
        );
        self.lines_or_placeholder(&prompt, SUMMARY_POINT_COUNT, "summary points").await
    }

    async fn category_title(
        &self,
        category: TitleCategory,
        summary: &str,
        context: &VideoContext,
        top_videos: &str,
    ) -> String {
        let label = category.label();
        let prompt = format!(
            "Based on the following YouTube video summary, write 1 attractive title for the '{label}' category \
(a title that {}).\n\
- Do not use markdown (#, *, etc.).\n\
- Use fitting emoji.\n\
- Write the title as one sentence.\n\
- Do not include the word '{label}' in the title.\n\
- These are popular titles from our channel with their view counts. Match their style:\n\
{top_videos}\n\n\
Write in {}. Reply with the title only.\n\n\
Original title: '{}'\n\n{summary}",
            category.style(),
            self.language,
            context.details.title
        );

        match self.generator.generate(&prompt).await {
            Some(title) => {
                let title = first_line(&title).replace(label, "").trim().to_string();
                if title.is_empty() {
                    format!("({label} no suggestion)")
                } else {
                    title
                }
            }
            None => {
                warn!("No {label} title generated");
                format!("({label} no suggestion)")
            }
        }
    }

    async fn meme_titles(&self, summary: &str, top_videos: &str) -> Vec<String> {
        let prompt = format!(
            "Based on the following YouTube video summary, write {MEME_TITLE_COUNT} attractive titles that use recently \
trending internet memes or slang.\n\
- Every title must include a meme or slang phrase.\n\
- End each title with the meme in parentheses, e.g. 'Title (meme: meme name)'.\n\
- Do not use markdown (#, *, etc.).\n\
- Use fitting emoji.\n\
- Put each title on its own line and do not number them.\n\
- These are popular titles from our channel with their view counts. Match their style:\n\
{top_videos}\n\n\
Write in {}.\n\n{summary}",
            self.language
        );

        match self.generator.generate(&prompt).await {
            Some(text) => {
                let mut titles = clean_lines(&text);
                if titles.len() != MEME_TITLE_COUNT {
                    debug!("Meme prompt returned {} lines, expected {MEME_TITLE_COUNT}", titles.len());
                }
                titles.truncate(MEME_TITLE_COUNT);
                titles
            }
            None => {
                warn!("No meme titles generated");
                Vec::new()
            }
        }
    }

    async fn descriptions(&self, summary: &str, context: &VideoContext) -> Vec<String> {
        let prompt = format!(
            "Based on the following YouTube video summary, write {DESCRIPTION_COUNT} engaging video descriptions. Mix in \
fitting emoji and keep them friendly, cute and witty. Put each description on a single line and do not number them. \
Write in {}. For reference, the original description: '{}'\n\n{summary}",
            self.language,
            truncate_chars(&context.details.description, 200)
        );
        self.lines_or_placeholder(&prompt, DESCRIPTION_COUNT, "descriptions").await
    }

    async fn hashtags(&self, summary: &str) -> Vec<String> {
        let fixed = self.fixed_hashtags.join(" ");
        let generated_count = HASHTAG_COUNT.saturating_sub(self.fixed_hashtags.len());
        let prompt = format!(
            "Generate hashtags related to the following YouTube video summary.\n\
These {} hashtags must always be included: {fixed}\n\
Besides those, generate {generated_count} more related hashtags.\n\
Every hashtag starts with '#' and contains no spaces.\n\
There must be {HASHTAG_COUNT} hashtags in total:\n\n{summary}",
            self.fixed_hashtags.len()
        );

        let response = self.generator.generate(&prompt).await;
        if response.is_none() {
            warn!("No hashtags generated");
        }
        assemble_hashtags(&self.fixed_hashtags, response.as_deref().unwrap_or_default())
    }

    async fn lines_or_placeholder(&self, prompt: &str, max: usize, what: &str) -> Vec<String> {
        match self.generator.generate(prompt).await {
            Some(text) => {
                let mut lines = clean_lines(&text);
                lines.truncate(max);
                if lines.is_empty() {
                    vec![NO_SUGGESTION.to_string()]
                } else {
                    lines
                }
            }
            None => {
                warn!("No {what} generated");
                vec![NO_SUGGESTION.to_string()]
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default()
}

/// Fixed tags first, then generated `#` tokens that are not fixed echoes, padded to exactly 14
fn assemble_hashtags(fixed: &[String], response: &str) -> Vec<String> {
    let mut tags: Vec<String> = fixed.iter().take(HASHTAG_COUNT).cloned().collect();
    let generated = response
        .split_whitespace()
        .map(|t| t.trim_end_matches([',', '.']))
        .filter(|t| t.starts_with('#') && t.len() > 1)
        .filter(|t| !fixed.iter().any(|f| f.as_str() == *t));
    for tag in generated {
        if tags.len() >= HASHTAG_COUNT {
            break;
        }
        tags.push(tag.to_string());
    }
    while tags.len() < HASHTAG_COUNT {
        tags.push(NO_SUGGESTION.to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_fixed_hashtags;
    use crate::generate::tests::{ScriptedGenerator, resilient};
    use crate::quiz::QUIZ_UNAVAILABLE;
    use std::sync::Arc;

    const QUIZ: &str = "Question: Q1\na) 1\nb) 2\nc) 3\n\nQuestion: Q2\na) 1\nb) 2\nc) 3\n\nQuestion: Q3\na) 1\nb) 2\nc) 3";

    fn context() -> VideoContext {
        VideoContext {
            details: VideoDetails {
                title: "Original".to_string(),
                description: "Original description".to_string(),
            },
            channel_videos: vec![
                ChannelVideo {
                    title: "Small".to_string(),
                    view_count: 10,
                },
                ChannelVideo {
                    title: "Big".to_string(),
                    view_count: 1_234_567,
                },
            ],
        }
    }

    fn assets(generator: &Arc<ScriptedGenerator>) -> AssetGenerator {
        AssetGenerator::new(resilient(generator), "Korean", default_fixed_hashtags())
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_top_videos_sorted_by_views() {
        assert_eq!(context().top_videos(), "- Big (views: 1,234,567)\n- Small (views: 10)");
    }

    #[test]
    fn test_clean_lines() {
        assert_eq!(clean_lines("- one\n\n  * two \n• three\n"), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_split_meme_title() {
        assert_eq!(
            split_meme_title("점메추 완료 🍜 (meme: 점메추)"),
            ("점메추 완료 🍜".to_string(), Some("meme: 점메추".to_string()))
        );
        assert_eq!(split_meme_title("plain title"), ("plain title".to_string(), None));
        assert_eq!(split_meme_title("(only parens)"), ("(only parens)".to_string(), None));
    }

    #[test]
    fn test_assemble_hashtags_exact_count() {
        let fixed = default_fixed_hashtags();
        let response = "#SK텔레콤 #SKtelecom #SKT #AI #one #two, #three. plain #four #five #six #seven #eight #nine #ten #eleven";
        let tags = assemble_hashtags(&fixed, response);
        assert_eq!(tags.len(), HASHTAG_COUNT);
        assert_eq!(&tags[..4], &fixed[..]);
        assert_eq!(tags[5], "#two");
        assert_eq!(tags[6], "#three");
        assert_eq!(tags[13], "#ten");
    }

    #[test]
    fn test_assemble_hashtags_pads() {
        let tags = assemble_hashtags(&default_fixed_hashtags(), "#only");
        assert_eq!(tags.len(), HASHTAG_COUNT);
        assert_eq!(tags[4], "#only");
        assert!(tags[5..].iter().all(|t| t == NO_SUGGESTION));
    }

    #[test]
    fn test_assemble_hashtags_keeps_generated_duplicates() {
        let tags = assemble_hashtags(&default_fixed_hashtags(), "#dup #dup");
        assert_eq!(tags[4], "#dup");
        assert_eq!(tags[5], "#dup");
    }

    #[tokio::test]
    async fn test_full_bundle() {
        let generator = Arc::new(ScriptedGenerator::new(
            vec![
                Some("🚀 one\n🎯 two\n💡 three\n🔥 four\n✅ five\n➕ six"),
                Some("흥미 title"),
                Some("정보성 정보 title\nsecond line ignored"),
                Some("problem title"),
                Some("drama title"),
                Some("expert title"),
                Some("meme one (meme: a)\nmeme two (meme: b)\nmeme three (meme: c)\nmeme four (meme: d)"),
                Some("desc one\n\ndesc two\ndesc three"),
                Some("#SKT #AI #a #b #c"),
                Some(QUIZ),
            ],
            None,
        ));
        let bundle = assets(&generator).generate("the summary", &context()).await;

        assert_eq!(bundle.summary_points.len(), 5);
        assert_eq!(bundle.summary_points[0], "🚀 one");
        assert_eq!(bundle.titles.len(), TITLE_COUNT);
        assert_eq!(bundle.titles[1], "정보 title");
        assert_eq!(bundle.titles[7], "meme three (meme: c)");
        assert_eq!(bundle.descriptions, vec!["desc one", "desc two"]);
        assert_eq!(bundle.hashtags.len(), HASHTAG_COUNT);
        assert_eq!(bundle.hashtags[4], "#a");
        assert_eq!(bundle.quizzes.len(), 3);
        assert_eq!(bundle.quizzes[2].question, "Q3");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 10);
        assert!(prompts[1].contains("'흥미유발'"));
        assert!(prompts[1].contains("- Big (views: 1,234,567)"));
        assert!(prompts[1].contains("Original title: 'Original'"));
        assert!(prompts[8].contains("#SK텔레콤 #SKtelecom #SKT #AI"));
    }

    #[tokio::test]
    async fn test_bundle_shape_when_everything_fails() {
        let generator = Arc::new(ScriptedGenerator::failing());
        let bundle = assets(&generator).generate("the summary", &VideoContext::default()).await;

        assert_eq!(bundle.summary_points, vec![NO_SUGGESTION]);
        assert_eq!(bundle.titles.len(), TITLE_COUNT);
        assert_eq!(bundle.titles[0], "(흥미유발 no suggestion)");
        assert_eq!(bundle.titles[4], "(전문성 no suggestion)");
        assert!(bundle.titles[5..].iter().all(|t| t == NO_SUGGESTION));
        assert_eq!(bundle.descriptions, vec![NO_SUGGESTION]);
        assert_eq!(bundle.hashtags.len(), HASHTAG_COUNT);
        assert_eq!(&bundle.hashtags[..4], &default_fixed_hashtags()[..]);
        assert_eq!(bundle.quizzes.len(), 3);
        assert!(bundle.quizzes.iter().all(|q| q.question == QUIZ_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_short_meme_response_is_padded() {
        let generator = Arc::new(ScriptedGenerator::new(
            vec![
                Some("point"),
                Some("t1"),
                Some("t2"),
                Some("t3"),
                Some("t4"),
                Some("t5"),
                Some("just one meme (meme: x)"),
            ],
            Some("filler"),
        ));
        let bundle = assets(&generator).generate("s", &VideoContext::default()).await;
        assert_eq!(bundle.titles.len(), TITLE_COUNT);
        assert_eq!(bundle.titles[5], "just one meme (meme: x)");
        assert_eq!(bundle.titles[6], NO_SUGGESTION);
        assert_eq!(bundle.titles[7], NO_SUGGESTION);
    }
}
