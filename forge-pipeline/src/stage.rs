use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ProjectArchitect,
    FileGenerator,
    CodeValidator,
    ExecutionAgent,
}

impl Stage {
    pub const ORDER: [Stage; 4] =
        [Self::ProjectArchitect, Self::FileGenerator, Self::CodeValidator, Self::ExecutionAgent];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ProjectArchitect => "project-architect",
            Self::FileGenerator => "file-generator",
            Self::CodeValidator => "code-validator",
            Self::ExecutionAgent => "execution-agent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
