use std::collections::HashSet;
use std::fmt;

// Persistence scope for a saved level (one graph per space and session).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelScope {
    pub space_id: String,
    pub session_id: String,
}

impl LevelScope {
    pub fn new(space_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for LevelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.space_id, self.session_id)
    }
}

// Opaque caller identity handed in by the session/user collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHandle {
    pub id: u64,
    pub display_name: String,
    pub roles: HashSet<String>,
}

impl UserHandle {
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            roles: HashSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// Mutating operations that callers must be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeAction {
    EditGraph,
    RunGame,
    ManageLevels,
}

impl fmt::Display for RangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeAction::EditGraph => "edit graph",
            RangeAction::RunGame => "run game",
            RangeAction::ManageLevels => "manage levels",
        };
        f.write_str(name)
    }
}
