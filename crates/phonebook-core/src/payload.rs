//! Response payloads returned by the lookup API, plus the size-bounded copies
//! that get written to session storage.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::format::truncate_chars;
use crate::mode::Mode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executive {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub employee_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products_services: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_markets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub competitors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_executives: Vec<Executive>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_news: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_funding: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub talking_points: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

/// One past position. The API sends either a bare company name or a
/// `{company, role}` object; both land here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExperienceRepr")]
pub struct Experience {
    pub company: String,
    pub role: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExperienceRepr {
    Name(String),
    Full {
        #[serde(default)]
        company: String,
        #[serde(default)]
        role: Option<String>,
    },
}

impl From<ExperienceRepr> for Experience {
    fn from(repr: ExperienceRepr) -> Self {
        match repr {
            ExperienceRepr::Name(company) => Experience {
                company,
                role: String::new(),
            },
            ExperienceRepr::Full { company, role } => Experience {
                company,
                role: role.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_companies: Vec<Experience>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(alias = "discussion_topics", skip_serializing_if = "Vec::is_empty")]
    pub post_topics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversation_starters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub engagement_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsDigest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub articles: Vec<Article>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<serde_json::Value>,
}

/// Images produced by the studio, already written to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBatch {
    pub model: String,
    pub files: Vec<PathBuf>,
}

/// Parsed payload of a bot message, tagged by the kind of lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Body {
    Company(CompanyProfile),
    Person(PersonProfile),
    News(NewsDigest),
    Images(ImageBatch),
}

impl Body {
    pub fn mode(&self) -> Mode {
        match self {
            Body::Company(_) => Mode::Company,
            Body::Person(_) => Mode::Person,
            Body::News(_) => Mode::News,
            Body::Images(_) => Mode::Image,
        }
    }

    /// Pretty JSON of the payload itself, used as the message's copyable text
    pub fn to_pretty_json(&self) -> String {
        let rendered = match self {
            Body::Company(data) => serde_json::to_string_pretty(data),
            Body::Person(data) => serde_json::to_string_pretty(data),
            Body::News(data) => serde_json::to_string_pretty(data),
            Body::Images(data) => serde_json::to_string_pretty(data),
        };
        rendered.unwrap_or_default()
    }

    /// Size-bounded copy for session storage
    pub fn trimmed(&self) -> Body {
        match self {
            Body::Company(data) => Body::Company(data.trimmed()),
            Body::Person(data) => Body::Person(data.trimmed()),
            Body::News(data) => Body::News(data.trimmed()),
            Body::Images(data) => Body::Images(data.trimmed()),
        }
    }
}

const LIST_LIMIT: usize = 20;

impl CompanyProfile {
    pub fn trimmed(&self) -> Self {
        Self {
            description: self.description.as_deref().map(|d| truncate_chars(d, 600)),
            products_services: take(&self.products_services, LIST_LIMIT),
            target_markets: take(&self.target_markets, LIST_LIMIT),
            competitors: take(&self.competitors, LIST_LIMIT),
            key_executives: take(&self.key_executives, LIST_LIMIT),
            recent_news: take(&self.recent_news, LIST_LIMIT),
            pain_points: take(&self.pain_points, LIST_LIMIT),
            opportunities: take(&self.opportunities, LIST_LIMIT),
            talking_points: take(&self.talking_points, LIST_LIMIT),
            ..self.clone()
        }
    }
}

impl PersonProfile {
    pub fn trimmed(&self) -> Self {
        Self {
            headline: self.headline.as_deref().map(|h| truncate_chars(h, 300)),
            bio: self.bio.as_deref().map(|b| truncate_chars(b, 800)),
            previous_companies: take(&self.previous_companies, 12),
            education: take(&self.education, 6),
            skills: take(&self.skills, 12),
            post_topics: take(&self.post_topics, 12),
            interests: take(&self.interests, 12),
            conversation_starters: take(&self.conversation_starters, 6),
            engagement_tips: take(&self.engagement_tips, 6),
            ..self.clone()
        }
    }
}

impl NewsDigest {
    pub fn trimmed(&self) -> Self {
        Self {
            articles: self
                .articles
                .iter()
                .take(8)
                .map(|a| Article {
                    summary: a.summary.as_deref().map(|s| truncate_chars(s, 600)),
                    key_points: take(&a.key_points, 6),
                    ..a.clone()
                })
                .collect(),
            citations: take(&self.citations, 10),
            ..self.clone()
        }
    }
}

impl ImageBatch {
    pub fn trimmed(&self) -> Self {
        Self {
            model: self.model.clone(),
            files: take(&self.files, 8),
        }
    }
}

fn take<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    items.iter().take(limit).cloned().collect()
}

/// Accepts a string, a number, or null
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_tolerates_missing_fields_and_numeric_headcount() {
        let company: CompanyProfile = serde_json::from_value(json!({
            "name": "Acme",
            "employee_count": 1200,
            "key_executives": [{"name": "Ada", "title": "CEO"}]
        }))
        .unwrap();

        assert_eq!(company.name, "Acme");
        assert_eq!(company.employee_count.as_deref(), Some("1200"));
        assert_eq!(company.key_executives[0].title, "CEO");
        assert!(company.products_services.is_empty());
    }

    #[test]
    fn test_previous_companies_accept_strings_and_objects() {
        let person: PersonProfile = serde_json::from_value(json!({
            "name": "Grace",
            "previous_companies": ["Initech", {"company": "Globex", "role": "CTO"}, {"company": "Hooli"}],
            "discussion_topics": ["compilers"]
        }))
        .unwrap();

        assert_eq!(
            person.previous_companies,
            vec![
                Experience { company: "Initech".into(), role: String::new() },
                Experience { company: "Globex".into(), role: "CTO".into() },
                Experience { company: "Hooli".into(), role: String::new() },
            ]
        );
        assert_eq!(person.post_topics, vec!["compilers"]);
    }

    #[test]
    fn test_body_is_tagged_by_kind() {
        let body = Body::News(NewsDigest {
            topic: Some("solar".into()),
            ..Default::default()
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["kind"], "news");
        assert_eq!(value["data"]["topic"], "solar");

        let back: Body = serde_json::from_value(value).unwrap();
        assert_eq!(back, body);
        assert_eq!(back.mode(), Mode::News);
    }

    #[test]
    fn test_company_trim_limits() {
        let company = CompanyProfile {
            name: "Acme".into(),
            description: Some("x".repeat(1000)),
            products_services: (0..30).map(|i| format!("p{}", i)).collect(),
            key_executives: vec![Executive::default(); 25],
            ..Default::default()
        };
        let trimmed = company.trimmed();

        assert_eq!(trimmed.description.unwrap().chars().count(), 600);
        assert_eq!(trimmed.products_services.len(), 20);
        assert_eq!(trimmed.products_services[19], "p19");
        assert_eq!(trimmed.key_executives.len(), 20);
        assert_eq!(trimmed.name, "Acme");
    }

    #[test]
    fn test_person_trim_limits() {
        let person = PersonProfile {
            headline: Some("h".repeat(500)),
            bio: Some("b".repeat(2000)),
            previous_companies: vec![Experience::default(); 20],
            education: vec!["school".into(); 10],
            conversation_starters: vec!["hi".into(); 9],
            ..Default::default()
        };
        let trimmed = person.trimmed();

        assert_eq!(trimmed.headline.unwrap().len(), 300);
        assert_eq!(trimmed.bio.unwrap().len(), 800);
        assert_eq!(trimmed.previous_companies.len(), 12);
        assert_eq!(trimmed.education.len(), 6);
        assert_eq!(trimmed.conversation_starters.len(), 6);
    }

    #[test]
    fn test_news_trim_limits() {
        let digest = NewsDigest {
            articles: (0..12)
                .map(|i| Article {
                    title: format!("a{}", i),
                    summary: Some("s".repeat(900)),
                    key_points: vec!["k".into(); 10],
                    ..Default::default()
                })
                .collect(),
            citations: vec![json!("c"); 15],
            ..Default::default()
        };
        let trimmed = digest.trimmed();

        assert_eq!(trimmed.articles.len(), 8);
        assert_eq!(trimmed.articles[0].title, "a0");
        assert_eq!(trimmed.articles[0].summary.as_ref().unwrap().len(), 600);
        assert_eq!(trimmed.articles[0].key_points.len(), 6);
        assert_eq!(trimmed.citations.len(), 10);
    }
}
