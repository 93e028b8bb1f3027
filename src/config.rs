//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    dial::{DialItem, DialSettings},
    events::View,
    guestboard::geocode::Coordinates,
    links::LinkTarget,
    reveal::RevealTimings,
};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timings of the intro text reveal.
    pub reveal: RevealTimings,
    /// Intro poem.
    pub intro: IntroCfg,
    /// Competition dial tuning and entries.
    pub dial: DialCfg,
    /// Landing page links.
    pub entrance: EntranceCfg,
    /// Remote guestboard endpoints and local flag.
    pub guestboard: GuestboardConfig,
}

/// Lines revealed by the intro view; leading spaces indent a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroCfg {
    pub lines: Vec<String>,
}

/// Dial view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialCfg {
    /// Colour of the selected item's rule.
    pub highlight_color: String,
    /// Terminal rows used by one item.
    pub item_rows: u16,
    /// Wheel delta per scroll notch.
    pub wheel_step: f64,
    pub settings: DialSettings,
    pub items: Vec<DialItem>,
}

/// Entrance view settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntranceCfg {
    pub links: Vec<LinkTarget>,
}

/// Remote store, geocoder and one-time flag settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestboardConfig {
    /// Firestore project hosting the notes.
    pub project_id: String,
    /// Web API key; may be empty for open rules.
    pub api_key: String,
    /// Collection holding one document per note.
    pub collection: String,
    pub firestore_base_url: String,
    /// Reverse geocoding service root.
    pub geocode_url: String,
    /// Sent with geocoding requests.
    pub user_agent: String,
    /// File recording that this visitor already placed a note.
    pub flag_path: String,
    pub flag_expiry_days: u32,
    /// Delay before fetched notes appear.
    pub load_reveal_ms: u64,
    /// Visitor location; without it no note can be placed.
    pub location: Option<Coordinates>,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for IntroCfg {
    fn default() -> Self {
        let indent = |n: usize, text: &str| format!("{}{text}", " ".repeat(n));
        Self {
            lines: vec![
                "I DON'T KNOW".into(),
                "WHAT HAPPENED LAST NIGHT.".into(),
                "AND I TRULY HOPE THAT EVERYTHING IS ALRIGHT.".into(),
                "I AM ONE OF THOSE WHO IS HOLDING BACK FROM JUDGING.".into(),
                "THE WORST THING IS NO MATTER HOW MUCH YOU LET ME DOWN, I CANNOT STOP CARING."
                    .into(),
                "MY HEART IS IN TATTERS.".into(),
                "AND FOR WHAT?".into(),
                "FOR SOMEONE WHO I HAVE NO CONTACT WITH.".into(),
                "I DONT UNDERSTAND.".into(),
                "THIS IS HOW MUCH I CARE.".into(),
                indent(24, "YOU CAN TURN AROUND"),
                "BREAK HUNDREDS OF HEARTS".into(),
                "A SINGLE INSTANT".into(),
                indent(20, "SOMETHING I COULD NEVER COMPREHEND"),
                "IN GENERAL".into(),
                indent(24, "MY HEART IS BROKEN."),
                "AND THE WORST PART IS".into(),
                "I FEEL RESPONSIBLE.".into(),
            ],
        }
    }
}

impl Default for DialCfg {
    fn default() -> Self {
        let items = [
            "San Francisco 2021",
            "Riot Games 2022",
            "HackDavis 2023",
            "Berkeley 2023",
            "Berkeley A.I. 2024",
            "Berkeley Skydeck 2024",
            "Santa Cruz 2024",
            "HackDavis 2024",
            "Stanford 2024",
            "GitHub 2024",
            "Design Buddies 2024",
            "Google Foobar 2024",
            "ICPC 2024",
            "Tastyhacks 2024",
            "Hyperbolic 2024",
            "Amazon Web Services 2024",
            "Cloudflare 2024",
            "Stanford VR 2024",
            "Berkeley 2024",
            "X/Twitter 2024",
            "Stanford 2025",
            "Anthropic 2025",
            "GitHub 2025",
            "Google Foobar 2025",
            "IMC Prosperity 2025",
            "Next.js 2025",
            "ACTIVATE @ GitHub 2025",
            "Y Combinator 2025",
        ]
        .into_iter()
        .map(|label| DialItem {
            color: Some("gray".into()),
            ..DialItem::new(label)
        })
        .collect();

        Self {
            highlight_color: "#fc3d39".into(),
            item_rows: 3,
            wheel_step: 120.0,
            settings: DialSettings::default(),
            items,
        }
    }
}

impl Default for EntranceCfg {
    fn default() -> Self {
        let link = |label: &str, view| LinkTarget {
            label: label.into(),
            view,
        };
        Self {
            links: vec![
                link("about", View::About),
                link("works", View::Works),
                link("designs", View::Designs),
                link("competitions", View::Competitions),
                link("philosophy", View::Philosophy),
                link("products", View::Products),
                link("guestboard", View::Guestboard),
            ],
        }
    }
}

impl Default for GuestboardConfig {
    fn default() -> Self {
        Self {
            project_id: "portfolio-guestboard".into(),
            api_key: "".into(),
            collection: "guests".into(),
            firestore_base_url: "https://firestore.googleapis.com/v1".into(),
            geocode_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: concat!("portfolio_tui/", env!("CARGO_PKG_VERSION")).into(),
            flag_path: "guestboard_signed.json".into(),
            flag_expiry_days: 365,
            load_reveal_ms: 800,
            location: None,
        }
    }
}
