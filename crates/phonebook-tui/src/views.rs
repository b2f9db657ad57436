//! Message and payload rendering.
//!
//! Everything here turns core types into owned `Line`s so the screens can
//! measure and scroll them before drawing.

use phonebook_core::dashboard::{CARD_KEY_POINTS, CARD_SUMMARY_CHARS};
use phonebook_core::format::{clip, domain_of, format_date, unique_in_order};
use phonebook_core::payload::{Article, CompanyProfile, ImageBatch, NewsDigest, PersonProfile};
use phonebook_core::{Body, Message, Sender};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const HEADING: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const LABEL: Style = Style::new().fg(Color::DarkGray);
const TITLE: Style = Style::new().add_modifier(Modifier::BOLD);

/// Lines for one conversation entry, including its role header
pub fn message_lines(message: &Message, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match message.sender {
        Sender::User => {
            let mode = message.mode.map(|m| m.display_name()).unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled("You", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  [{}]", mode), LABEL),
            ]));
            if !message.text.is_empty() {
                lines.extend(message.text.lines().map(|l| Line::from(l.to_string())));
            }
            if let Some(path) = &message.attachment {
                lines.push(Line::styled(format!("attached: {}", path.display()), LABEL));
            }
        }
        Sender::Loader => {
            lines.push(bot_header(false));
            // Cycles through ".", "..", "..."
            let dots = ".".repeat(animation_frame as usize % 3 + 1);
            lines.push(Line::styled(
                format!("beep boop{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }
        Sender::Bot => {
            lines.push(bot_header(message.error));
            match &message.body {
                _ if message.error => {
                    lines.push(Line::styled(message.text.clone(), Style::default().fg(Color::Red)));
                }
                Some(body) => lines.extend(body_lines(body)),
                None => lines.extend(message.text.lines().map(|l| Line::from(l.to_string()))),
            }
        }
    }

    lines
}

fn bot_header(error: bool) -> Line<'static> {
    let color = if error { Color::Red } else { Color::Yellow };
    Line::styled("Bot", Style::default().fg(color).add_modifier(Modifier::BOLD))
}

pub fn body_lines(body: &Body) -> Vec<Line<'static>> {
    match body {
        Body::Company(company) => company_lines(company),
        Body::Person(person) => person_lines(person),
        Body::News(news) => news_lines(news),
        Body::Images(batch) => image_lines(batch),
    }
}

pub fn company_lines(company: &CompanyProfile) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(non_empty(&company.name, "Unknown company"), HEADING)];

    if let Some(description) = &company.description {
        lines.push(Line::from(description.clone()));
    }

    field(&mut lines, "Industry", company.industry.as_deref());
    field(&mut lines, "Headquarters", company.headquarters.as_deref());
    field(&mut lines, "Founded", company.founded_year.map(|y| y.to_string()).as_deref());
    field(&mut lines, "Employees", company.employee_count.as_deref());
    field(&mut lines, "Website", company.website.as_deref().map(domain_of).as_deref());

    bullets(&mut lines, "Products & services", &company.products_services, 8);
    inline_list(&mut lines, "Target markets", &company.target_markets, 10);

    if !company.key_executives.is_empty() {
        lines.push(section("Key executives"));
        for exec in company.key_executives.iter().take(8) {
            let text = if exec.title.is_empty() {
                exec.name.clone()
            } else {
                format!("{} ({})", exec.name, exec.title)
            };
            lines.push(Line::from(format!("  • {}", text)));
        }
    }

    lines
}

pub fn person_lines(person: &PersonProfile) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(non_empty(&person.name, "Unknown person"), HEADING)];

    if let Some(headline) = &person.headline {
        lines.push(Line::styled(headline.clone(), Style::default().add_modifier(Modifier::ITALIC)));
    }

    field(&mut lines, "LinkedIn", person.linkedin_url.as_deref());
    field(&mut lines, "Company", person.current_company.as_deref());
    field(&mut lines, "Role", person.current_role.as_deref());
    field(&mut lines, "Location", person.location.as_deref());
    field(&mut lines, "Duration", person.role_duration.as_deref());

    let companies = unique_in_order(person.previous_companies.iter().map(|e| e.company.as_str()));
    inline_list(&mut lines, "Companies worked", &companies, 12);

    if let Some(bio) = &person.bio {
        lines.push(section("Bio"));
        lines.extend(bio.lines().map(|l| Line::from(l.to_string())));
    }

    bullets(&mut lines, "Education", &person.education, 6);
    inline_list(&mut lines, "Skills", &person.skills, 12);
    inline_list(&mut lines, "Topics", &person.post_topics, 12);
    inline_list(&mut lines, "Interests", &person.interests, 12);
    bullets(&mut lines, "Conversation starters", &person.conversation_starters, 6);
    bullets(&mut lines, "Engagement tips", &person.engagement_tips, 6);

    lines
}

pub fn news_lines(news: &NewsDigest) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(topic) = &news.topic {
        lines.push(Line::styled(format!("News: {}", topic), HEADING));
    }
    if news.articles.is_empty() {
        lines.push(Line::styled("No articles found.", LABEL));
        return lines;
    }

    for article in news.articles.iter().take(8) {
        lines.push(Line::default());
        lines.push(source_line(article));
        lines.push(Line::styled(article.title.clone(), TITLE));
        if let Some(summary) = &article.summary {
            lines.push(Line::from(summary.clone()));
        }
    }
    lines
}

pub fn image_lines(batch: &ImageBatch) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !batch.model.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Model: ", LABEL),
            Span::raw(batch.model.clone()),
        ]));
    }
    if batch.files.is_empty() {
        lines.push(Line::styled("No images returned.", LABEL));
    }
    for file in &batch.files {
        lines.push(Line::styled(
            format!("saved {}", file.display()),
            Style::default().fg(Color::Green),
        ));
    }
    lines
}

/// Dashboard card. Collapsed cards show a clipped summary; expanded ones
/// the full summary and key points.
pub fn card_lines(article: &Article, expanded: bool) -> Vec<Line<'static>> {
    let mut lines = vec![source_line(article), Line::styled(article.title.clone(), TITLE)];

    if let Some(summary) = &article.summary {
        if expanded {
            lines.extend(summary.lines().map(|l| Line::from(l.to_string())));
        } else {
            lines.push(Line::from(clip(summary, CARD_SUMMARY_CHARS)));
        }
    }

    if expanded {
        for point in article.key_points.iter().take(CARD_KEY_POINTS) {
            lines.push(Line::from(format!("  • {}", point)));
        }
    }
    lines
}

fn source_line(article: &Article) -> Line<'static> {
    let mut spans = vec![Span::styled(domain_of(&article.url), Style::default().fg(Color::Magenta))];
    if let Some(date) = article.published_at.as_deref().map(format_date) {
        if !date.is_empty() {
            spans.push(Span::styled(format!(" · {}", date), LABEL));
        }
    }
    Line::from(spans)
}

fn non_empty(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

fn section(title: &str) -> Line<'static> {
    Line::styled(title.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn field(lines: &mut Vec<Line<'static>>, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", label), LABEL),
            Span::raw(value.to_string()),
        ]));
    }
}

fn bullets(lines: &mut Vec<Line<'static>>, title: &str, items: &[String], limit: usize) {
    if items.is_empty() {
        return;
    }
    lines.push(section(title));
    for item in items.iter().take(limit) {
        lines.push(Line::from(format!("  • {}", item)));
    }
}

fn inline_list(lines: &mut Vec<Line<'static>>, title: &str, items: &[String], limit: usize) {
    if items.is_empty() {
        return;
    }
    let joined = items
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(Line::from(vec![
        Span::styled(format!("{}: ", title), LABEL),
        Span::raw(joined),
    ]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonebook_core::payload::{Executive, Experience};
    use phonebook_core::Mode;
    use std::path::PathBuf;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_company_view_fields_and_limits() {
        let company = CompanyProfile {
            name: "Acme".into(),
            industry: Some("Anvils".into()),
            website: Some("https://www.acme.com/about".into()),
            products_services: (0..12).map(|i| format!("product {}", i)).collect(),
            key_executives: vec![
                Executive { name: "Ada".into(), title: "CEO".into() },
                Executive { name: "Bob".into(), title: String::new() },
            ],
            ..Default::default()
        };
        let rendered = text(&company_lines(&company));

        assert!(rendered.contains("Industry: Anvils"));
        assert!(rendered.contains("Website: acme.com"));
        assert!(rendered.contains("product 7"));
        assert!(!rendered.contains("product 8"));
        assert!(rendered.contains("• Ada (CEO)"));
        assert!(rendered.contains("• Bob"));
        assert!(!rendered.contains("Headquarters"));
    }

    #[test]
    fn test_person_view_dedupes_companies() {
        let person = PersonProfile {
            name: "Grace".into(),
            current_role: Some("Admiral".into()),
            previous_companies: vec![
                Experience { company: "Navy".into(), role: "Officer".into() },
                Experience { company: "Harvard".into(), role: String::new() },
                Experience { company: "Navy".into(), role: "Admiral".into() },
            ],
            skills: (0..20).map(|i| format!("s{}", i)).collect(),
            ..Default::default()
        };
        let rendered = text(&person_lines(&person));

        assert!(rendered.contains("Companies worked: Navy, Harvard"));
        assert!(rendered.contains("Role: Admiral"));
        assert!(rendered.contains("s11"));
        assert!(!rendered.contains("s12"));
    }

    #[test]
    fn test_news_view_caps_articles() {
        let news = NewsDigest {
            topic: Some("solar".into()),
            articles: (0..10)
                .map(|i| Article {
                    url: format!("https://www.example.com/{}", i),
                    title: format!("Story {}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        let rendered = text(&news_lines(&news));

        assert!(rendered.starts_with("News: solar"));
        assert!(rendered.contains("Story 7"));
        assert!(!rendered.contains("Story 8"));
        assert!(rendered.contains("example.com"));
    }

    #[test]
    fn test_card_collapsed_and_expanded() {
        let article = Article {
            url: "https://news.example.org/a".into(),
            title: "Floating solar".into(),
            summary: Some("word ".repeat(60)),
            key_points: (0..8).map(|i| format!("point {}", i)).collect(),
            published_at: Some("2024-05-01".into()),
        };

        let collapsed = card_lines(&article, false);
        let rendered = text(&collapsed);
        assert!(rendered.contains("news.example.org · 2024-05-01"));
        assert!(rendered.contains('…'));
        assert!(!rendered.contains("point 0"));

        let expanded = text(&card_lines(&article, true));
        assert!(expanded.contains("point 4"));
        assert!(!expanded.contains("point 5"));
    }

    #[test]
    fn test_loader_and_error_messages() {
        let loader = text(&message_lines(&Message::loader(), 2));
        assert!(loader.contains("beep boop..."));

        let failure = Message::failure("upstream down", Mode::Company, "Acme", None);
        let rendered = text(&message_lines(&failure, 0));
        assert!(rendered.contains("Error: upstream down"));
    }

    #[test]
    fn test_user_message_shows_mode_and_attachment() {
        let msg = Message::user("add a hat", Mode::Image, Some(PathBuf::from("/tmp/cat.png")));
        let rendered = text(&message_lines(&msg, 0));
        assert!(rendered.contains("[Studio]"));
        assert!(rendered.contains("attached: /tmp/cat.png"));
    }

    #[test]
    fn test_image_batch_lists_files() {
        let batch = ImageBatch {
            model: "img-1".into(),
            files: vec![PathBuf::from("/out/image_1_0.png")],
        };
        let rendered = text(&image_lines(&batch));
        assert!(rendered.contains("Model: img-1"));
        assert!(rendered.contains("saved /out/image_1_0.png"));
    }
}
