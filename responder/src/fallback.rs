//! Rule-based answers composed from retrieved chunks.
//!
//! Used when no chat model is configured or the model failed. Rules are
//! checked in order against the lowercased question; the first rule whose
//! trigger words appear wins, and the last rule always matches.

use rag_store::SearchResult;

pub const NO_INFORMATION: &str = "I don't have specific information about that in my records. Could you please rephrase your question or ask about my technical skills, work experience, or projects?";

pub const NO_DETAILS: &str = "I found some relevant information but couldn't extract the details. Please try asking in a different way.";

pub const APOLOGY: &str = "I apologize, but I'm having trouble processing your question right now. Please try again or rephrase your question.";

/// Retrieved text with the category it was filed under.
struct Snippet<'a> {
    text: &'a str,
    category: &'a str,
}

impl Snippet<'_> {
    fn mentions(&self, words: &[&str]) -> bool {
        let lower = self.text.to_lowercase();
        words.iter().any(|w| lower.contains(w))
    }
}

/// The first `n` `.`-separated pieces of `text`, rejoined.
fn sentences(text: &str, n: usize) -> String {
    text.split('.').take(n).collect::<Vec<_>>().join(".")
}

fn with_period(s: String) -> String {
    if s.ends_with('.') { s } else { s + "." }
}

struct Rule {
    name: &'static str,
    triggers: &'static [&'static str],
    compose: fn(&[Snippet<'_>]) -> String,
}

fn intro(contents: &[Snippet<'_>]) -> String {
    match contents.iter().find(|c| c.category == "overview") {
        Some(c) => c.text.to_string(),
        None => with_period(sentences(contents[0].text, 2)),
    }
}

fn experience(contents: &[Snippet<'_>]) -> String {
    let jobs: Vec<&Snippet<'_>> = contents
        .iter()
        .filter(|c| c.category == "experience" || c.mentions(&["experience", "years"]))
        .collect();
    if jobs.is_empty() {
        return contents
            .iter()
            .take(2)
            .map(|c| sentences(c.text, 2))
            .collect::<Vec<_>>()
            .join(" ");
    }
    let bullets = jobs
        .iter()
        .take(3)
        .map(|c| format!("• {}", with_period(sentences(c.text, 1))))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here's my professional experience:\n\n{bullets}")
}

fn skills(contents: &[Snippet<'_>]) -> String {
    match contents
        .iter()
        .find(|c| c.category == "skills" || c.mentions(&["skill", "technical"]))
    {
        Some(c) => format!("My technical skills include:\n\n{}", c.text),
        None => contents[0].text.to_string(),
    }
}

fn projects(contents: &[Snippet<'_>]) -> String {
    let found: Vec<&Snippet<'_>> = contents
        .iter()
        .filter(|c| c.category == "project" || c.category == "projects" || c.mentions(&["project"]))
        .collect();
    if found.is_empty() {
        return contents
            .iter()
            .take(2)
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("\n\n");
    }
    let bullets = found
        .iter()
        .take(3)
        .map(|c| format!("• {}", sentences(c.text, 2)))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Here are some projects I've worked on:\n\n{bullets}")
}

fn education(contents: &[Snippet<'_>]) -> String {
    match contents
        .iter()
        .find(|c| c.category == "education" || c.mentions(&["bachelor", "master", "degree"]))
    {
        Some(c) => format!("My educational background:\n\n{}", c.text),
        None => general(contents),
    }
}

fn certifications(contents: &[Snippet<'_>]) -> String {
    let found: Vec<&Snippet<'_>> = contents
        .iter()
        .filter(|c| c.category == "certifications" || c.mentions(&["certified", "certification"]))
        .collect();
    if found.is_empty() {
        return general(contents);
    }
    let bullets = found
        .iter()
        .take(3)
        .map(|c| format!("• {}", with_period(sentences(c.text, 1))))
        .collect::<Vec<_>>()
        .join("\n");
    format!("My certifications:\n\n{bullets}")
}

fn general(contents: &[Snippet<'_>]) -> String {
    contents
        .iter()
        .take(3)
        .map(|c| sentences(c.text, 3))
        .collect::<Vec<_>>()
        .join("\n\n")
}

static RULES: &[Rule] = &[
    Rule {
        name: "intro",
        triggers: &["who", "tell me about", "describe yourself"],
        compose: intro,
    },
    Rule {
        name: "experience",
        triggers: &["experience", "work", "job"],
        compose: experience,
    },
    Rule {
        name: "skills",
        triggers: &["skill", "tech", "tool"],
        compose: skills,
    },
    Rule {
        name: "projects",
        triggers: &["project", "built", "created"],
        compose: projects,
    },
    Rule {
        name: "education",
        triggers: &["education", "degree", "university", "study"],
        compose: education,
    },
    Rule {
        name: "certifications",
        triggers: &["certification", "certified"],
        compose: certifications,
    },
    Rule {
        name: "general",
        triggers: &[],
        compose: general,
    },
];

/// Name of the rule that handles `question`.
pub fn matching_rule(question: &str) -> &'static str {
    select(&question.to_lowercase()).name
}

fn select(lower: &str) -> &'static Rule {
    RULES
        .iter()
        .find(|r| r.triggers.is_empty() || r.triggers.iter().any(|t| lower.contains(t)))
        .unwrap_or(&RULES[RULES.len() - 1])
}

/// Answer for `question` built only from `sources`.
pub fn compose(question: &str, sources: &[SearchResult]) -> String {
    if sources.is_empty() {
        return NO_INFORMATION.to_string();
    }
    let contents: Vec<Snippet<'_>> = sources
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .map(|s| Snippet {
            text: s.content.as_str(),
            category: if s.metadata.category.is_empty() {
                if s.metadata.kind.is_empty() { "general" } else { s.metadata.kind.as_str() }
            } else {
                s.metadata.category.as_str()
            },
        })
        .collect();
    if contents.is_empty() {
        return NO_DETAILS.to_string();
    }
    let rule = select(&question.to_lowercase());
    (rule.compose)(&contents).trim().to_string()
}

#[cfg(test)]
mod tests {
    use rag_store::ChunkMetadata;

    use super::*;

    fn hit(category: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            id: format!("{category}:{score}"),
            score,
            content: content.into(),
            metadata: ChunkMetadata::new(category, "t"),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(matching_rule("Who are you?"), "intro");
        assert_eq!(matching_rule("Tell me about your work"), "intro");
        assert_eq!(matching_rule("What work have you done?"), "experience");
        assert_eq!(matching_rule("Which tools do you use?"), "skills");
        assert_eq!(matching_rule("What have you built?"), "projects");
        assert_eq!(matching_rule("Hobbies?"), "general");
        assert_eq!(matching_rule("Where did you study?"), "education");
        assert_eq!(matching_rule("What certifications do you have?"), "certifications");
    }

    #[test]
    fn education_and_certifications_use_their_chunks() {
        let sources = [
            hit("skills", "Rust, AWS.", 0.9),
            hit("education", "BSc Computer Science, Monash University (2016)", 0.8),
            hit("certifications", "AWS Certified Solutions Architect. Renewed 2024", 0.7),
        ];
        assert_eq!(
            compose("What degree do you hold?", &sources),
            "My educational background:\n\nBSc Computer Science, Monash University (2016)"
        );
        assert_eq!(
            compose("What certifications do you have?", &sources),
            "My certifications:\n\n• AWS Certified Solutions Architect."
        );
        assert_eq!(compose("Are you certified?", &sources[..1]), "Rust, AWS.");
    }

    #[test]
    fn no_sources_and_blank_sources() {
        assert_eq!(compose("anything", &[]), NO_INFORMATION);
        assert_eq!(compose("anything", &[hit("skills", "  ", 0.9)]), NO_DETAILS);
    }

    #[test]
    fn intro_prefers_overview_chunk() {
        let sources = [
            hit("skills", "Rust. Go. SQL.", 0.9),
            hit("overview", "Jordan is an engineer. Based in Melbourne.", 0.8),
        ];
        assert_eq!(compose("Who is Jordan?", &sources), "Jordan is an engineer. Based in Melbourne.");
        assert_eq!(compose("Who is Jordan?", &sources[..1]), "Rust. Go.");
    }

    #[test]
    fn experience_bullets_at_most_three() {
        let sources: Vec<SearchResult> = (0..5)
            .map(|i| hit("experience", &format!("Role {i}. Details"), 0.9))
            .collect();
        let answer = compose("Tell us your experience", &sources);
        // "tell me about" is not present, so the experience rule applies.
        assert!(answer.starts_with("Here's my professional experience:\n\n• Role 0."));
        assert_eq!(answer.matches('•').count(), 3);
    }

    #[test]
    fn skills_and_projects_and_default() {
        let sources = [
            hit("experience", "Shipped a project dashboard. Used React. Fast.", 0.9),
            hit("skills", "Technical Skills: Rust, AWS.", 0.8),
        ];
        assert_eq!(
            compose("What tech do you know?", &sources),
            "My technical skills include:\n\nTechnical Skills: Rust, AWS."
        );
        assert_eq!(
            compose("Any projects?", &sources),
            "Here are some projects I've worked on:\n\n• Shipped a project dashboard. Used React"
        );
        assert_eq!(
            compose("Hobbies?", &sources),
            "Shipped a project dashboard. Used React. Fast\n\nTechnical Skills: Rust, AWS."
        );
    }
}
