use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Families of generated commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Movement,
    Examine,
    Manipulation,
    Inventory,
    Look,
    Meta,
}

impl CommandType {
    pub const ALL: [CommandType; 6] = [
        CommandType::Movement,
        CommandType::Examine,
        CommandType::Manipulation,
        CommandType::Inventory,
        CommandType::Look,
        CommandType::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Movement => "movement",
            CommandType::Examine => "examine",
            CommandType::Manipulation => "manipulation",
            CommandType::Inventory => "inventory",
            CommandType::Look => "look",
            CommandType::Meta => "meta",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim().to_lowercase();
        CommandType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown command type {s:?} (expected one of: movement, examine, manipulation, inventory, look, meta)"
                )
            })
    }
}

const DIRECTIONS: &[&str] = &[
    "north", "south", "east", "west", "northeast", "northwest", "southeast", "southwest", "up",
    "down", "n", "s", "e", "w",
];

const OBJECTS: &[&str] = &[
    "lamp", "mailbox", "leaflet", "sword", "door", "window", "tree", "house", "rug", "bottle",
    "sack", "rope", "knife",
];

const MANIPULATIONS: &[&str] = &["take", "drop", "open", "close", "read", "move", "push", "pull"];

const META: &[&str] = &["score", "wait", "verbose", "brief"];

/// Deterministic command sequences: the same seed and settings always yield
/// the same commands.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    seed: u64,
    types: Vec<CommandType>,
    focus_areas: Vec<String>,
}

impl CommandGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            types: CommandType::ALL.to_vec(),
            focus_areas: Vec::new(),
        }
    }

    /// Restrict generation to these types. Empty means all.
    pub fn with_types(mut self, types: &[CommandType]) -> Self {
        if !types.is_empty() {
            self.types = types.to_vec();
        }
        self
    }

    /// Object keywords to exercise instead of the built-in vocabulary.
    pub fn with_focus_areas(mut self, focus: &[String]) -> Self {
        self.focus_areas = focus
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }

    pub fn generate(&self, count: usize) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..count).map(|_| self.one(&mut rng)).collect()
    }

    fn object(&self, rng: &mut StdRng) -> String {
        if self.focus_areas.is_empty() {
            pick(OBJECTS, rng).to_string()
        } else {
            self.focus_areas
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| OBJECTS[0].to_string())
        }
    }

    fn one(&self, rng: &mut StdRng) -> String {
        let kind = self.types.choose(rng).copied().unwrap_or(CommandType::Look);
        match kind {
            CommandType::Movement => pick(DIRECTIONS, rng).to_string(),
            CommandType::Examine => format!("examine {}", self.object(rng)),
            CommandType::Manipulation => {
                let verb = pick(MANIPULATIONS, rng);
                format!("{verb} {}", self.object(rng))
            }
            CommandType::Inventory => "inventory".into(),
            CommandType::Look => "look".into(),
            CommandType::Meta => pick(META, rng).to_string(),
        }
    }
}

fn pick<'a>(items: &[&'a str], rng: &mut StdRng) -> &'a str {
    items.choose(rng).copied().unwrap_or("look")
}
