use tracing::instrument;

use blogsmith_completion::Completer;
use blogsmith_shared::{RunConfig, StageName, StageOutput};

/// Role instructions for the outline stage.
pub const OUTLINE_CREATOR_ROLE: &str = "You are a blog outline creator. You turn research, \
keywords and trend insights into logical, engaging outlines that serve as blueprints for \
high-quality posts, and you answer in strict JSON when asked to.";

/// Product fields offered to the outline and writer stages.
#[derive(Debug, Clone, Copy)]
pub struct ProductBrief<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub image_url: &'a str,
    pub description: &'a str,
    pub price_min: &'a str,
    pub price_max: &'a str,
    pub currency: &'a str,
}

impl<'a> ProductBrief<'a> {
    /// The product fields of a run, when the run is about a product.
    pub fn from_config(config: &'a RunConfig) -> Option<Self> {
        (config.has_product && config.has_product_details()).then_some(Self {
            name: &config.product_name,
            url: &config.product_url,
            image_url: &config.product_image_url,
            description: &config.product_description_text,
            price_min: &config.product_price_min,
            price_max: &config.product_price_max,
            currency: &config.product_currency,
        })
    }

    /// Non-empty fields as `- label: value` lines.
    pub fn render(&self) -> String {
        let price = match (self.price_min.trim(), self.price_max.trim()) {
            ("", "") => String::new(),
            (min, "") => format!("{min} {}", self.currency),
            ("", max) => format!("{max} {}", self.currency),
            (min, max) => format!("{min} - {max} {}", self.currency),
        };

        [
            ("Name", self.name),
            ("URL", self.url),
            ("Image", self.image_url),
            ("Description", self.description),
            ("Price", price.trim()),
        ]
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("- {label}: {}", value.trim()))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Inputs for [`OutlineCreator::run`].
#[derive(Debug, Clone, Copy)]
pub struct OutlineRequest<'a> {
    pub topic: &'a str,
    pub research: &'a str,
    pub keywords: &'a str,
    pub trend_summary: &'a str,
    pub faq: bool,
    pub product: Option<ProductBrief<'a>>,
}

/// Produces a JSON array of outline items.
pub struct OutlineCreator {
    completer: Completer,
}

impl OutlineCreator {
    pub fn new(completer: Completer) -> Self {
        Self { completer }
    }

    #[instrument(skip_all, fields(topic = %request.topic, faq = request.faq, product = request.product.is_some()))]
    pub async fn run(&self, request: OutlineRequest<'_>) -> StageOutput {
        let prompt = outline_prompt(&request);
        self.completer
            .complete(
                StageName::OutlineCreator.error_context(),
                OUTLINE_CREATOR_ROLE,
                &prompt,
            )
            .await
    }
}

fn outline_prompt(request: &OutlineRequest<'_>) -> String {
    let mut prompt = format!(
        "Create a detailed outline for a blog post about \"{topic}\".\n\n\
Research Findings:\n{research}\n\n\
SEO Keywords:\n{keywords}\n\n\
Current Trends:\n{trends}\n\n",
        topic = request.topic,
        research = crate::or_none(request.research),
        keywords = crate::or_none(request.keywords),
        trends = crate::or_none(request.trend_summary),
    );

    if let Some(product) = &request.product {
        prompt.push_str(&format!("Featured product:\n{}\n\n", product.render()));
    }

    prompt.push_str(
        "The outline must:\n\
- open with an introduction section (hook, problem statement, what readers will learn)\n\
- contain 4-6 main sections with headings that use the keywords naturally and 2-3 subtopics each\n\
- weave in trending angles where relevant\n\
- close with a conclusion section (summary, call to action, next steps)\n\n\
Answer with a JSON array only, no markdown and no commentary. Each section is an object:\n\
{\"title\": \"Section heading\", \"subtopics\": [\"point\", \"point\"]}\n",
    );

    if request.faq {
        prompt.push_str(
            "Add one FAQ object with 4-6 reader questions:\n\
{\"faq\": [{\"question\": \"...\", \"answer\": \"...\"}]}\n",
        );
    }

    if request.product.is_some() {
        prompt.push_str(
            "Add one product object describing the featured product:\n\
{\"product_title\": \"...\", \"product_description\": \"...\"}\n",
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Recorder, completer};

    fn request<'a>() -> OutlineRequest<'a> {
        OutlineRequest {
            topic: "Remote Work",
            research: "research notes",
            keywords: "• remote jobs",
            trend_summary: "async is in",
            faq: false,
            product: None,
        }
    }

    #[tokio::test]
    async fn plain_outline_prompt() {
        let recorder = Recorder::replying("[]");
        let agent = OutlineCreator::new(completer(&recorder));

        agent.run(request()).await;

        let prompt = recorder.last_prompt();
        assert!(prompt.contains("research notes"));
        assert!(prompt.contains("async is in"));
        assert!(prompt.contains("JSON array"));
        assert!(!prompt.contains("\"faq\""));
        assert!(!prompt.contains("product_title"));
    }

    #[tokio::test]
    async fn faq_and_product_sections_requested() {
        let recorder = Recorder::replying("[]");
        let agent = OutlineCreator::new(completer(&recorder));

        let config = RunConfig {
            has_product: true,
            product_name: "Desk Pro".into(),
            product_price_min: "199".into(),
            product_price_max: "299".into(),
            product_currency: "USD".into(),
            ..RunConfig::default()
        };
        let req = OutlineRequest {
            faq: true,
            product: ProductBrief::from_config(&config),
            ..request()
        };
        agent.run(req).await;

        let prompt = recorder.last_prompt();
        assert!(prompt.contains("\"faq\""));
        assert!(prompt.contains("product_title"));
        assert!(prompt.contains("- Name: Desk Pro"));
        assert!(prompt.contains("- Price: 199 - 299 USD"));
    }

    #[test]
    fn product_brief_requires_flag_and_details() {
        let flagged_only = RunConfig {
            has_product: true,
            ..RunConfig::default()
        };
        assert!(ProductBrief::from_config(&flagged_only).is_none());

        let details_only = RunConfig {
            product_name: "Desk Pro".into(),
            ..RunConfig::default()
        };
        assert!(ProductBrief::from_config(&details_only).is_none());
    }
}
