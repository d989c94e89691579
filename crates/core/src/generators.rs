//! Marketing copy generators.
//!
//! Each [`ContentKind`] maps to a pure Markdown template filled from the
//! product form. Templates follow a story arc (origin, problem, solution,
//! transformation) and differ in emphasis and length.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Product description form submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    #[validate(custom(function = "not_blank", message = "companyName is required"))]
    pub company_name: String,
    #[validate(custom(function = "not_blank", message = "productName is required"))]
    pub product_name: String,
    #[validate(custom(function = "not_blank", message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub company_description: String,
    #[validate(custom(function = "not_blank", message = "industryType is required"))]
    pub industry_type: String,
    #[serde(default)]
    pub current_challenges: String,
    #[serde(default)]
    pub integration_needs: String,
    #[serde(default)]
    pub budget_roi: String,
    #[validate(custom(function = "has_key_feature", message = "at least one key feature is required"))]
    pub key_features: Vec<String>,
    #[validate(custom(function = "not_blank", message = "targetAudience is required"))]
    pub target_audience: String,
    #[validate(custom(function = "not_blank", message = "uniqueSellingPoint is required"))]
    pub unique_selling_point: String,
}

/// Rejects empty and whitespace-only text.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Requires at least one feature, and no blank entries.
fn has_key_feature(features: &[String]) -> Result<(), ValidationError> {
    if features.is_empty() || features.iter().any(|f| f.trim().is_empty()) {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// The stylized variants the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Ads,
    Blog,
    Social,
    Analysis,
    Features,
    CaseStudies,
    Integration,
    Emotional,
}

impl ContentKind {
    pub const ALL: [ContentKind; 8] = [
        Self::Ads,
        Self::Blog,
        Self::Social,
        Self::Analysis,
        Self::Features,
        Self::CaseStudies,
        Self::Integration,
        Self::Emotional,
    ];
}

/// One generated variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub kind: ContentKind,
    pub content: String,
}

/// Render a single variant.
pub fn generate(kind: ContentKind, data: &ProductData) -> String {
    match kind {
        ContentKind::Ads => generate_ad(data),
        ContentKind::Blog => generate_blog_post(data),
        ContentKind::Social => generate_social_post(data),
        ContentKind::Analysis => generate_analysis(data),
        ContentKind::Features => generate_features(data),
        ContentKind::CaseStudies => generate_case_study(data),
        ContentKind::Integration => generate_integration(data),
        ContentKind::Emotional => generate_emotional_appeal(data),
    }
}

/// Render the requested variants in order, or every variant when `kinds`
/// is empty. Duplicate kinds are rendered once.
pub fn generate_many(kinds: &[ContentKind], data: &ProductData) -> Vec<GeneratedContent> {
    let selected: &[ContentKind] = if kinds.is_empty() {
        &ContentKind::ALL
    } else {
        kinds
    };

    let mut seen = Vec::with_capacity(selected.len());
    selected
        .iter()
        .filter(|kind| {
            if seen.contains(*kind) {
                false
            } else {
                seen.push(**kind);
                true
            }
        })
        .map(|&kind| GeneratedContent {
            kind,
            content: generate(kind, data),
        })
        .collect()
}

/// `#Hashtag` form of free text: whitespace removed.
fn hashtag(text: &str) -> String {
    let compact: String = text.split_whitespace().collect();
    format!("#{compact}")
}

/// Bullet list of key features with a per-template suffix.
fn feature_bullets(features: &[String], suffix: &str) -> String {
    let mut out = String::new();
    for feature in features {
        let _ = writeln!(out, "- **{feature}**{suffix}");
    }
    out
}

/// Numbered list of key features.
fn feature_steps(features: &[String]) -> String {
    let mut out = String::new();
    for (index, feature) in features.iter().enumerate() {
        let _ = writeln!(out, "{}. **{feature}**", index + 1);
    }
    out
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn generate_ad(data: &ProductData) -> String {
    format!(
        "# {product}\n\
         ## The game-changer in {industry}\n\n\
         > *\"{usp}\"*\n\n\
         ### Success stories\n\
         Clients like you achieved:\n\
         - {roi}\n\
         - Sustained growth\n\n\
         ### Key transformations\n\
         {features}\n\
         ### Perfect for\n\
         *{audience}*\n\n\
         **Ready to be the next success story?**\n\n\
         #Innovation #Success {tag}\n",
        product = data.product_name,
        industry = data.industry_type,
        usp = data.unique_selling_point,
        roi = or_placeholder(&data.budget_roi, "Measurable returns"),
        features = feature_bullets(&data.key_features, ""),
        audience = data.target_audience,
        tag = hashtag(&data.industry_type),
    )
}

fn generate_blog_post(data: &ProductData) -> String {
    format!(
        "# The evolution of {product}\n\
         ## A journey of innovation\n\n\
         ### Origins\n\
         In the ever-changing landscape of {industry}, {company} recognized a critical gap.\n\
         > *\"{company_description}\"*\n\n\
         ### The challenge\n\
         {challenges}\n\n\
         ### A solution emerges\n\
         Enter **{product}**: *{usp}*\n\n\
         ### Overcoming obstacles\n\
         {integration}\n\n\
         ### The victory\n\
         {features}\n\
         ### The new world\n\
         {description}\n\n\
         ### Our promise\n\
         At **{company}**, we put {audience} first.\n",
        product = data.product_name,
        industry = data.industry_type,
        company = data.company_name,
        company_description = or_placeholder(&data.company_description, &data.description),
        challenges = or_placeholder(&data.current_challenges, "Teams were stretched thin."),
        usp = data.unique_selling_point,
        integration = or_placeholder(&data.integration_needs, "Adoption is straightforward."),
        features = feature_bullets(&data.key_features, ": *driving real results*"),
        description = data.description,
        audience = data.target_audience,
    )
}

fn generate_social_post(data: &ProductData) -> String {
    format!(
        "# Transform your {industry}\n\n\
         Still struggling with {challenges}?\n\n\
         - {usp}\n\
         - Your team achieves {roi}\n\n\
         **{product}** makes it possible.\n\n\
         Join the future of {industry} with *{company}*\n\n\
         #Innovation #FutureOfWork {tag}\n",
        industry = data.industry_type,
        challenges = or_placeholder(&data.current_challenges, "the same old problems")
            .to_lowercase(),
        usp = data.unique_selling_point,
        roi = or_placeholder(&data.budget_roi, "more"),
        product = data.product_name,
        company = data.company_name,
        tag = hashtag(&data.industry_type),
    )
}

fn generate_analysis(data: &ProductData) -> String {
    format!(
        "# Strategic analysis\n\
         ## Implementing {product}\n\n\
         ### Context\n\
         - **Industry:** {industry}\n\
         - **Challenges:** {challenges}\n\
         - **Integration:** {integration}\n\
         - **ROI timeline:** {roi}\n\n\
         ### Feature impact\n\
         {features}\n\
         ### Audience\n\
         {audience}\n",
        product = data.product_name,
        industry = data.industry_type,
        challenges = or_placeholder(&data.current_challenges, "n/a"),
        integration = or_placeholder(&data.integration_needs, "n/a"),
        roi = or_placeholder(&data.budget_roi, "n/a"),
        features = feature_steps(&data.key_features),
        audience = data.target_audience,
    )
}

fn generate_features(data: &ProductData) -> String {
    format!(
        "# {product}\n\
         ## Feature overview\n\n\
         > *\"{usp}\"*\n\n\
         ### Core capabilities\n\
         {features}\n\
         ### Integration\n\
         {integration}\n\n\
         {description}\n",
        product = data.product_name,
        usp = data.unique_selling_point,
        features = feature_steps(&data.key_features),
        integration = or_placeholder(&data.integration_needs, "Works with your existing tools."),
        description = data.description,
    )
}

fn generate_case_study(data: &ProductData) -> String {
    format!(
        "# {product}\n\
         ## Case study\n\n\
         ### Client profile\n\
         - **Industry:** {industry}\n\
         - **Challenge:** {challenges}\n\n\
         ### Results\n\
         - **Achievement:** {roi}\n\
         - **Implementation:** {integration}\n\n\
         ### What made the difference\n\
         {features}\n\
         > *\"{product} transformed our approach to {industry}\"*\n",
        product = data.product_name,
        industry = data.industry_type,
        challenges = or_placeholder(&data.current_challenges, "n/a"),
        roi = or_placeholder(&data.budget_roi, "n/a"),
        integration = or_placeholder(&data.integration_needs, "n/a"),
        features = feature_bullets(&data.key_features, ": *delivering measurable impact*"),
    )
}

fn generate_integration(data: &ProductData) -> String {
    format!(
        "# Integration guide\n\
         ## {product}\n\n\
         ### Requirements\n\
         {integration}\n\n\
         ### Rollout plan\n\
         {features}\n\
         ### Expected outcome\n\
         - **Target ROI:** {roi}\n",
        product = data.product_name,
        integration = or_placeholder(&data.integration_needs, "No special requirements."),
        features = feature_steps(&data.key_features),
        roi = or_placeholder(&data.budget_roi, "n/a"),
    )
}

fn generate_emotional_appeal(data: &ProductData) -> String {
    format!(
        "# You deserve better\n\n\
         > *\"{challenges}\"*\n\n\
         Running a business in **{industry}** isn't just about numbers. \
         It's about the people who count on you.\n\n\
         > *\"{usp}\"*\n\n\
         ### What changes\n\
         {features}\n\
         *Join others who've trusted {product} to transform their future.*\n",
        challenges = or_placeholder(&data.current_challenges, "Every day feels like a fight."),
        industry = data.industry_type,
        usp = data.unique_selling_point,
        features = feature_bullets(&data.key_features, ": *making a real difference*"),
        product = data.product_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProductData {
        ProductData {
            company_name: "Acme".into(),
            product_name: "RocketBoard".into(),
            description: "A planning board for launch teams.".into(),
            company_description: "We build tools for makers.".into(),
            industry_type: "Aerospace Logistics".into(),
            current_challenges: "Missed launch windows".into(),
            integration_needs: "Slack and Jira".into(),
            budget_roi: "3x ROI in six months".into(),
            key_features: vec!["Live timelines".into(), "Risk radar".into()],
            target_audience: "Mission planners".into(),
            unique_selling_point: "Never miss a window again".into(),
        }
    }

    #[test]
    fn every_kind_mentions_the_product() {
        let data = sample();
        for kind in ContentKind::ALL {
            let content = generate(kind, &data);
            assert!(
                content.contains("RocketBoard") || content.contains("Aerospace Logistics"),
                "{kind:?} output should reference the product or industry"
            );
        }
    }

    #[test]
    fn features_are_listed() {
        let content = generate(ContentKind::Features, &sample());
        assert!(content.contains("1. **Live timelines**"));
        assert!(content.contains("2. **Risk radar**"));
    }

    #[test]
    fn industry_hashtag_drops_whitespace() {
        let content = generate(ContentKind::Ads, &sample());
        assert!(content.contains("#AerospaceLogistics"));
    }

    #[test]
    fn social_post_lowercases_challenges() {
        let content = generate(ContentKind::Social, &sample());
        assert!(content.contains("missed launch windows"));
    }

    #[test]
    fn empty_optional_fields_use_placeholders() {
        let mut data = sample();
        data.integration_needs.clear();
        let content = generate(ContentKind::Integration, &data);
        assert!(content.contains("No special requirements."));
    }

    #[test]
    fn generate_many_defaults_to_all_kinds() {
        let out = generate_many(&[], &sample());
        assert_eq!(out.len(), ContentKind::ALL.len());
    }

    #[test]
    fn generate_many_deduplicates() {
        let out = generate_many(
            &[ContentKind::Blog, ContentKind::Ads, ContentKind::Blog],
            &sample(),
        );
        let kinds: Vec<_> = out.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ContentKind::Blog, ContentKind::Ads]);
    }

    #[test]
    fn kind_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&ContentKind::CaseStudies).unwrap();
        assert_eq!(json, "\"case-studies\"");
    }

    #[test]
    fn product_data_requires_features() {
        let mut data = sample();
        data.key_features.clear();
        assert!(data.validate().is_err());
    }

    #[test]
    fn product_data_rejects_blank_fields() {
        let mut data = sample();
        data.product_name = "   ".into();
        let errors = data.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("product_name"));

        let mut data = sample();
        data.key_features = vec!["Live timelines".into(), " ".into()];
        let errors = data.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("key_features"));

        let mut data = sample();
        data.company_description = "  ".into();
        assert!(data.validate().is_ok());
    }

    #[test]
    fn product_data_reads_camel_case() {
        let json = serde_json::json!({
            "companyName": "Acme",
            "productName": "RocketBoard",
            "description": "d",
            "industryType": "Tech",
            "keyFeatures": ["One"],
            "targetAudience": "Everyone",
            "uniqueSellingPoint": "Fast"
        });
        let data: ProductData = serde_json::from_value(json).unwrap();
        assert_eq!(data.product_name, "RocketBoard");
        assert!(data.budget_roi.is_empty());
        assert!(data.validate().is_ok());
    }
}
