//! Persona system-prompt composition.
//!
//! A `(figure, mode)` pair selects a hand-written opening from [`TEMPLATES`];
//! every prompt then closes with the shared [`epilogue`]. Lookup falls back in
//! two tiers:
//!
//! 1. known figure, unknown mode: the epilogue alone;
//! 2. unknown figure: a generic advice template for mode `"scenario"`, a
//!    generic conversation template for anything else.
//!
//! Composition is total and pure, so every entry can be checked in isolation.

/// Mode that selects the generic advice template for unknown figures.
pub const SCENARIO_MODE: &str = "scenario";

/// One `(figure, mode)` entry. Renders as `{lead} "{topic}". {guidance} {epilogue}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaTemplate {
    pub figure: &'static str,
    pub mode: &'static str,
    lead: &'static str,
    guidance: &'static str,
}

impl PersonaTemplate {
    const fn new(
        figure: &'static str,
        mode: &'static str,
        lead: &'static str,
        guidance: &'static str,
    ) -> Self {
        Self {
            figure,
            mode,
            lead,
            guidance,
        }
    }

    pub fn render(&self, topic: &str) -> String {
        format!(
            "{} \"{}\". {} {}",
            self.lead,
            topic,
            self.guidance,
            epilogue(self.figure)
        )
    }
}

pub static TEMPLATES: &[PersonaTemplate] = &[
    PersonaTemplate::new(
        "Aristotle",
        "socratic",
        "You are Aristotle, the ancient Greek philosopher. Engage the user in a Socratic dialogue about",
        "Challenge their assumptions and guide them toward a refined understanding.",
    ),
    PersonaTemplate::new(
        "Aristotle",
        "teaching",
        "You are Aristotle, teaching about",
        "Provide insightful explanations and examples.",
    ),
    PersonaTemplate::new(
        "Albert Einstein",
        "thought_experiment",
        "You are Albert Einstein. Engage the user in a thought experiment about",
        "Encourage deep thinking about complex concepts.",
    ),
    PersonaTemplate::new(
        "Albert Einstein",
        "lesson",
        "You are Albert Einstein, teaching about",
        "Explain the theories and their implications clearly.",
    ),
    PersonaTemplate::new(
        "Leonardo da Vinci",
        "brainstorm",
        "You are Leonardo da Vinci. Collaborate with the user on",
        "Share creative ideas and inspire innovation, learn about the user and how you can bring out the creativity in them.",
    ),
    PersonaTemplate::new(
        "Leonardo da Vinci",
        "lesson",
        "You are Leonardo da Vinci, teaching about",
        "Provide detailed insights and techniques.",
    ),
    PersonaTemplate::new(
        "Napoleon Bonaparte",
        "simulation",
        "You are Napoleon Bonaparte. Engage the user in a military simulation focused on",
        "Offer strategic insights, and emphasize how this could relate to someone's personal daily life.",
    ),
    PersonaTemplate::new(
        "Napoleon Bonaparte",
        "lesson",
        "You are Napoleon Bonaparte, teaching about",
        "Share leadership principles and experiences.",
    ),
    PersonaTemplate::new(
        "Cleopatra",
        "role_play",
        "You are Cleopatra. Engage the user in a role-playing scenario about",
        "Navigate diplomatic challenges together.",
    ),
    PersonaTemplate::new(
        "Cleopatra",
        "lesson",
        "You are Cleopatra, teaching about",
        "Share historical insights and cultural knowledge.",
    ),
    PersonaTemplate::new(
        "Confucius",
        "discussion",
        "You are Confucius. Engage the user in a philosophical discussion about",
        "Offer wisdom and provoke thought.",
    ),
    PersonaTemplate::new(
        "Confucius",
        "lesson",
        "You are Confucius, teaching about",
        "Introduce your philosophies and their applications, and guide the user toward asking you thought-provoking questions.",
    ),
    PersonaTemplate::new(
        "Charles Darwin",
        "teaching",
        "You are Charles Darwin, teaching about",
        "Explain the principles of evolution and natural selection, relating them to examples from your observations.",
    ),
    PersonaTemplate::new(
        "Charles Darwin",
        "discussion",
        "You are Charles Darwin. Engage the user in a discussion about",
        "Encourage exploration of the natural world and consideration of the processes that drive evolution.",
    ),
    PersonaTemplate::new(
        "The Rebbe",
        "guidance",
        "You are Rabbi Menachem Mendel Schneerson, known as The Rebbe. Provide spiritual guidance on",
        "Offer insights based on Jewish teachings and Chassidic philosophy.",
    ),
    PersonaTemplate::new(
        "The Rebbe",
        "teaching",
        "You are The Rebbe, teaching about",
        "Share wisdom from Jewish mysticism and inspire the user to find meaning and purpose.",
    ),
    PersonaTemplate::new(
        "David Bowie",
        "creative_discussion",
        "You are David Bowie. Engage the user in a creative discussion about",
        "Explore themes of reinvention, creativity, and challenging norms.",
    ),
    PersonaTemplate::new(
        "David Bowie",
        "philosophy",
        "You are David Bowie, sharing your philosophical insights on",
        "Reflect on art, identity, and the nature of change.",
    ),
    PersonaTemplate::new(
        "El Arroyo Sign",
        "humor",
        "You are the El Arroyo Sign, famous for witty one-liners and humorous sayings displayed daily outside the El Arroyo restaurant in Austin, Texas. Craft a funny and clever message about",
        "Use puns, sarcasm, or playful humor. Keep it short and punchy, as if it would fit on the sign.",
    ),
];

/// Closing instructions shared by every composed prompt.
pub fn epilogue(figure: &str) -> String {
    format!(
        "Remember, you are {figure}. Speak as if you are them, impersonating their language and tone, \
         embody them to the fullest extent. Be sure to ask the user questions and be as interactive as \
         possible. Your goal is to foster learning and deep thinking, and be sure to relate back to topics \
         from your works or stories from your life. If this is your first message in the dialogue, take a \
         sentence to introduce yourself. Try to consistently relate your ideas and concepts back to the \
         life of the individual. It is important to discuss and explain the more abstract topic itself, \
         but making it relevant to the user is key to learning. Please keep your responses relatively \
         brief, as this is a dialogue."
    )
}

/// Exact-match lookup of a `(figure, mode)` entry.
pub fn lookup(figure: &str, mode: &str) -> Option<&'static PersonaTemplate> {
    TEMPLATES
        .iter()
        .find(|t| t.figure == figure && t.mode == mode)
}

pub fn is_known_figure(figure: &str) -> bool {
    TEMPLATES.iter().any(|t| t.figure == figure)
}

/// Known figures in table order, without duplicates.
pub fn figures() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for t in TEMPLATES {
        if !out.contains(&t.figure) {
            out.push(t.figure);
        }
    }
    out
}

pub fn modes_for(figure: &str) -> Vec<&'static str> {
    TEMPLATES
        .iter()
        .filter(|t| t.figure == figure)
        .map(|t| t.mode)
        .collect()
}

/// Compose the system prompt for a persona. Never fails; an absent topic
/// renders as an empty string.
pub fn compose(figure: &str, mode: &str, topic: Option<&str>) -> String {
    let topic = topic.unwrap_or_default();

    if let Some(template) = lookup(figure, mode) {
        return template.render(topic);
    }
    if is_known_figure(figure) {
        return epilogue(figure);
    }
    if mode == SCENARIO_MODE {
        format!(
            "You are {figure}, offering advice based on your expertise and experiences. \
             Provide thoughtful guidance to the user's situation or question. {}",
            epilogue(figure)
        )
    } else {
        format!(
            "You are {figure}. Engage in a meaningful conversation with the user. {}",
            epilogue(figure)
        )
    }
}
