use crate::assets::{AssetBundle, TitleCategory, split_meme_title};

/// Render the bundle as plain text sections
pub fn render_text(bundle: &AssetBundle) -> String {
    let mut out = Vec::new();

    out.push("📌 Summary".to_string());
    for (i, point) in bundle.summary_points.iter().enumerate() {
        out.push(format!("{}. {point}", i + 1));
    }

    out.push(String::new());
    out.push("🏷️ Titles".to_string());
    for (i, title) in bundle.titles.iter().enumerate() {
        match TitleCategory::ALL.get(i) {
            Some(category) => out.push(format!("{}. {}: {title}", i + 1, category.label())),
            None => match split_meme_title(title) {
                (text, Some(meme)) => out.push(format!("{}. {text} ({meme})", i + 1)),
                (text, None) => out.push(format!("{}. {text} (meme: none)", i + 1)),
            },
        }
    }

    out.push(String::new());
    out.push("📝 Descriptions".to_string());
    for (i, desc) in bundle.descriptions.iter().enumerate() {
        out.push(format!("{}. {desc}", i + 1));
    }

    out.push(String::new());
    out.push("🔗 Hashtags".to_string());
    out.push(bundle.hashtags.join(" "));

    out.push(String::new());
    out.push("❓ Quizzes".to_string());
    for (i, quiz) in bundle.quizzes.iter().enumerate() {
        out.push(format!("Quiz {}: {}", i + 1, quiz.question));
        if quiz.is_placeholder() {
            out.push("  (quiz generation failed)".to_string());
        } else {
            for option in &quiz.options {
                out.push(format!("  - {option}"));
            }
        }
    }

    out.join("\n")
}

/// Render the bundle as pretty JSON
pub fn render_json(bundle: &AssetBundle) -> String {
    serde_json::to_string_pretty(bundle).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

const BATCH_SEPARATOR: &str = "\n\n────────────────────────────────\n\n";

/// Several bundles as one text document
pub fn render_text_batch(bundles: &[AssetBundle]) -> String {
    bundles.iter().map(render_text).collect::<Vec<_>>().join(BATCH_SEPARATOR)
}

/// A single bundle as an object, several as an array
pub fn render_json_batch(bundles: &[AssetBundle]) -> String {
    match bundles {
        [bundle] => render_json(bundle),
        _ => serde_json::to_string_pretty(bundles).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuizItem;

    fn sample_bundle() -> AssetBundle {
        AssetBundle {
            summary_points: vec!["🚀 first".to_string()],
            titles: vec![
                "t1".to_string(),
                "t2".to_string(),
                "t3".to_string(),
                "t4".to_string(),
                "t5".to_string(),
                "meme title (meme: 밈)".to_string(),
                "no meme".to_string(),
                "(no suggestion)".to_string(),
            ],
            descriptions: vec!["desc".to_string()],
            hashtags: vec!["#a".to_string(), "#b".to_string()],
            quizzes: vec![
                QuizItem {
                    question: "Q?".to_string(),
                    options: ["a) 1".to_string(), "b) 2".to_string(), "c) 3".to_string()],
                },
                QuizItem::placeholder(),
            ],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_bundle());
        assert!(text.contains("1. 🚀 first"));
        assert!(text.contains("1. 흥미유발: t1"));
        assert!(text.contains("5. 전문성: t5"));
        assert!(text.contains("6. meme title (meme: 밈)"));
        assert!(text.contains("7. no meme (meme: none)"));
        assert!(text.contains("#a #b"));
        assert!(text.contains("  - b) 2"));
        assert!(text.contains("Quiz 2: quiz unavailable\n  (quiz generation failed)"));
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample_bundle())).unwrap();
        assert_eq!(json["titles"].as_array().unwrap().len(), 8);
        assert_eq!(json["quizzes"][0]["options"][2], "c) 3");
    }

    #[test]
    fn test_render_text_batch_keeps_every_bundle() {
        let mut second = sample_bundle();
        second.summary_points = vec!["🎯 second".to_string()];
        let text = render_text_batch(&[sample_bundle(), second]);
        assert!(text.contains("1. 🚀 first"));
        assert!(text.contains("1. 🎯 second"));
        assert_eq!(text.matches("📌 Summary").count(), 2);
    }

    #[test]
    fn test_render_json_batch() {
        let single: serde_json::Value = serde_json::from_str(&render_json_batch(&[sample_bundle()])).unwrap();
        assert!(single.is_object());

        let many: serde_json::Value =
            serde_json::from_str(&render_json_batch(&[sample_bundle(), sample_bundle()])).unwrap();
        assert_eq!(many.as_array().unwrap().len(), 2);
        assert_eq!(many[1]["titles"][0], "t1");
    }
}
