use serde::{Deserialize, Serialize};

/// The kind of lookup a send targets. Each mode maps to one API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Company,
    Person,
    News,
    Image,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Company => "company",
            Mode::Person => "person",
            Mode::News => "news",
            Mode::Image => "image",
        }
    }

    /// Modes selectable from the chat view
    pub fn chat_modes() -> Vec<Mode> {
        vec![Mode::Company, Mode::Person, Mode::News]
    }

    /// Next chat mode, wrapping around
    pub fn next(&self) -> Mode {
        match self {
            Mode::Company => Mode::Person,
            Mode::Person => Mode::News,
            Mode::News | Mode::Image => Mode::Company,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Company => "Company",
            Mode::Person => "Person",
            Mode::News => "News",
            Mode::Image => "Studio",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Mode::Company => "Enter company name...",
            Mode::Person => "Enter LinkedIn URL...",
            Mode::News => "Enter news topic...",
            Mode::Image => "Describe an image, or attach one to edit...",
        }
    }

    /// Endpoint path for a plain JSON request in this mode
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mode::Company => "/company",
            Mode::Person => "/person",
            Mode::News => "/news",
            Mode::Image => "/image",
        }
    }
}
