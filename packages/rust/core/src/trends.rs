//! Parsing the trend researcher's `{summary, blog_titles}` reply.

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::debug;

/// What the trend stage produced, after tolerant parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendReport {
    pub summary: String,
    pub blog_titles: Vec<String>,
}

impl TrendReport {
    /// Parse the model reply.
    ///
    /// Tries the whole text as a JSON object, then the slice between the
    /// first `{` and the last `}`. If neither is an object, the raw text
    /// becomes the summary and there are no titles. An object without a
    /// string `summary` also keeps the raw text as its summary.
    pub fn parse(text: &str) -> Self {
        let Some(object) = parse_object(text) else {
            debug!("trend reply is not a JSON object, using raw text as summary");
            return Self {
                summary: text.to_string(),
                blog_titles: Vec::new(),
            };
        };

        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| text.to_string());

        let blog_titles = object
            .get("blog_titles")
            .and_then(Value::as_array)
            .map(|titles| {
                titles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            summary,
            blog_titles,
        }
    }

    /// One title picked uniformly at random, if any.
    pub fn choose_title<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.blog_titles.choose(rng).map(String::as_str)
    }
}

fn parse_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str(text.trim()) {
        return Some(map);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parses_clean_json() {
        let report = TrendReport::parse(
            r#"{"summary": "Listicles lead.", "blog_titles": ["A", "B", "C"]}"#,
        );
        assert_eq!(report.summary, "Listicles lead.");
        assert_eq!(report.blog_titles, ["A", "B", "C"]);
    }

    #[test]
    fn recovers_object_from_fenced_reply() {
        let report = TrendReport::parse(
            "```json\n{\"summary\": \"Video is up.\", \"blog_titles\": [\"Only\"]}\n```",
        );
        assert_eq!(report.summary, "Video is up.");
        assert_eq!(report.blog_titles, ["Only"]);
    }

    #[test]
    fn plain_text_becomes_summary() {
        let text = "Trends: short-form video, AI tools.";
        let report = TrendReport::parse(text);
        assert_eq!(report.summary, text);
        assert!(report.blog_titles.is_empty());
    }

    #[test]
    fn sentinel_becomes_summary() {
        let report = TrendReport::parse("[Error in BlogTrendResearcher agent: timeout]");
        assert_eq!(report.summary, "[Error in BlogTrendResearcher agent: timeout]");
        assert!(report.blog_titles.is_empty());
    }

    #[test]
    fn missing_summary_keeps_raw_text() {
        let text = r#"{"blog_titles": ["X", 7, " "]}"#;
        let report = TrendReport::parse(text);
        assert_eq!(report.summary, text);
        assert_eq!(report.blog_titles, ["X"]);
    }

    #[test]
    fn choose_title_picks_from_list() {
        let report = TrendReport {
            summary: String::new(),
            blog_titles: vec!["A".into(), "B".into(), "C".into()],
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let title = report.choose_title(&mut rng).unwrap();
            assert!(["A", "B", "C"].contains(&title));
        }
    }

    #[test]
    fn choose_title_none_when_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(TrendReport::default().choose_title(&mut rng), None);
    }
}
