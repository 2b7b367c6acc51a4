use std::collections::HashMap;
use std::time::Duration;

/// Text produced by one engine step and the turn counter after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub turn: u32,
}

/// An in-process game engine. Calls block; the recorder moves them onto the
/// blocking pool.
pub trait GameEngine: Send {
    /// Output shown before the first command.
    fn initial_output(&mut self) -> CommandOutput;

    fn execute(&mut self, command: &str) -> CommandOutput;
}

/// Creates a fresh engine per recording.
pub trait EngineFactory: Send + Sync {
    fn create(&self, seed: Option<u64>) -> anyhow::Result<Box<dyn GameEngine>>;

    /// Stored as the transcript label.
    fn describe(&self) -> String {
        "in-process engine".into()
    }
}

/// Table-driven engine: fixed responses per command, a fallback for anything
/// else, one turn per command.
#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    intro: String,
    responses: HashMap<String, String>,
    fallback: String,
    delay: Option<Duration>,
    turn: u32,
}

impl ScriptedEngine {
    pub fn new(intro: impl Into<String>) -> Self {
        Self {
            intro: intro.into(),
            responses: HashMap::new(),
            fallback: "I don't know the word.".into(),
            delay: None,
            turn: 0,
        }
    }

    pub fn respond(mut self, command: &str, output: impl Into<String>) -> Self {
        self.responses
            .insert(command.trim().to_lowercase(), output.into());
        self
    }

    pub fn with_fallback(mut self, output: impl Into<String>) -> Self {
        self.fallback = output.into();
        self
    }

    /// Sleep before answering each command.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl GameEngine for ScriptedEngine {
    fn initial_output(&mut self) -> CommandOutput {
        CommandOutput {
            text: self.intro.clone(),
            turn: self.turn,
        }
    }

    fn execute(&mut self, command: &str) -> CommandOutput {
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        self.turn += 1;
        let text = self
            .responses
            .get(&command.trim().to_lowercase())
            .unwrap_or(&self.fallback)
            .clone();
        CommandOutput {
            text,
            turn: self.turn,
        }
    }
}

impl EngineFactory for ScriptedEngine {
    fn create(&self, _seed: Option<u64>) -> anyhow::Result<Box<dyn GameEngine>> {
        Ok(Box::new(self.clone()))
    }

    fn describe(&self) -> String {
        "scripted engine".into()
    }
}
