use rand::prelude::IndexedRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    #[default]
    HumbleBrag,
    Inspirational,
    ThoughtLeader,
    Grind,
    Failure,
    Observation,
}

impl PostType {
    pub const ALL: [Self; 6] = [
        Self::HumbleBrag,
        Self::Inspirational,
        Self::ThoughtLeader,
        Self::Grind,
        Self::Failure,
        Self::Observation,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::HumbleBrag => "Humble Brag",
            Self::Inspirational => "Inspirational Journey",
            Self::ThoughtLeader => "Thought Leader",
            Self::Grind => "Grind Mindset",
            Self::Failure => "Failure to Success",
            Self::Observation => "Mundane Observation",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Cringe level, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(from = "u8", into = "u8")]
pub struct CringeLevel(u8);

impl CringeLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN, Self::MAX))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    pub fn decrement(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }

    /// "More cringe": two steps up, capped at the maximum
    pub fn bumped(self) -> Self {
        Self::new(self.0.saturating_add(2))
    }

    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "1 — Barely Cringe",
            2 => "2 — Mild Cringe",
            3 => "3 — Noticeable Cringe",
            4 => "4 — Solid Cringe",
            5 => "5 — Strong Cringe",
            6 => "6 — Heavy Cringe",
            7 => "7 — Intense Cringe",
            8 => "8 — Maximum Cringe",
            9 => "9 — Transcendent Cringe",
            _ => "10 — LEGENDARY",
        }
    }
}

impl Default for CringeLevel {
    fn default() -> Self {
        Self(8)
    }
}

impl From<u8> for CringeLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<CringeLevel> for u8 {
    fn from(level: CringeLevel) -> Self {
        level.0
    }
}

/// Body of `POST /generate`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub topic: String,
    pub post_type: PostType,
    pub cringe_level: CringeLevel,
}

impl GenerateRequest {
    pub fn new(topic: &str, post_type: PostType, cringe_level: CringeLevel) -> Self {
        Self {
            topic: topic.trim().to_string(),
            post_type,
            cringe_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub title: &'static str,
    pub initials: &'static str,
    pub reactions: u32,
    pub comments: u32,
    pub reposts: u32,
}

pub const PERSONAS: &[Persona] = &[
    Persona {
        name: "Chad Hustleworth",
        title: "Chief Disruption Officer | 7-Figure Entrepreneur | Speaker | Father of 3 | #Blessed",
        initials: "CH",
        reactions: 1247,
        comments: 312,
        reposts: 48,
    },
    Persona {
        name: "Brent Synergizer",
        title: "CEO & Founder | Thought Leader | Forbes 30 Under 30 | Building the Future 🚀",
        initials: "BS",
        reactions: 3821,
        comments: 501,
        reposts: 97,
    },
    Persona {
        name: "Gary Mindset",
        title: "Serial Entrepreneur | Angel Investor | Author | Keynote Speaker | Dog Dad 🐕",
        initials: "GM",
        reactions: 892,
        comments: 203,
        reposts: 31,
    },
    Persona {
        name: "Alexandra Leverage",
        title: "VP of Innovation | TEDx Speaker | Disrupting Industries | Mom | Coffee ☕",
        initials: "AL",
        reactions: 2104,
        comments: 448,
        reposts: 62,
    },
    Persona {
        name: "Derek Pivotman",
        title: "Founder & Visionary | 8-Figure Exit | Now Helping Others Scale | #Grateful",
        initials: "DP",
        reactions: 4512,
        comments: 672,
        reposts: 118,
    },
    Persona {
        name: "Melissa Authentic",
        title: "LinkedIn Top Voice | Culture Builder | EQ Evangelist | Helping Teams Thrive 💜",
        initials: "MA",
        reactions: 1688,
        comments: 389,
        reposts: 55,
    },
];

impl Persona {
    pub fn random() -> &'static Self {
        PERSONAS.choose(&mut rand::rng()).unwrap_or(&PERSONAS[0])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    /// Seconds allowed for connecting and receiving response headers
    pub request_timeout: u64,
    /// Seconds allowed between two body chunks before a session fails
    pub stream_idle_timeout: u64,
    pub default_post_type: PostType,
    pub default_cringe_level: CringeLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            request_timeout: 120,
            stream_idle_timeout: 60,
            default_post_type: PostType::default(),
            default_cringe_level: CringeLevel::default(),
        }
    }
}
