use serde::Serialize;

/// Whether the camera tracks the live position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Disabled,
    Enabled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FollowTransition {
    Enabled,
    Disabled,
    Unchanged,
}

/// Follow-mode state machine.
///
/// `manual_override` records that the user took the camera away; while it is
/// set, new position samples do not re-enable following. Only an explicit
/// locate-me clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowMode {
    state: FollowState,
    manual_override: bool,
    position_known: bool,
}

impl Default for FollowMode {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowMode {
    pub fn new() -> Self {
        Self {
            state: FollowState::Disabled,
            manual_override: false,
            position_known: false,
        }
    }

    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == FollowState::Enabled
    }

    pub fn manual_override(&self) -> bool {
        self.manual_override
    }

    pub fn on_position_available(&mut self) -> FollowTransition {
        self.position_known = true;
        if self.manual_override {
            return FollowTransition::Unchanged;
        }
        self.set(FollowState::Enabled)
    }

    pub fn on_manual_gesture(&mut self) -> FollowTransition {
        self.manual_override = true;
        self.set(FollowState::Disabled)
    }

    pub fn on_center_on_point(&mut self) -> FollowTransition {
        self.manual_override = true;
        self.set(FollowState::Disabled)
    }

    /// Clears the override; enables following only once a position is known.
    pub fn on_locate_me(&mut self) -> FollowTransition {
        self.manual_override = false;
        if self.position_known {
            self.set(FollowState::Enabled)
        } else {
            FollowTransition::Unchanged
        }
    }

    /// The one-shot fix failed; there is nothing to follow.
    pub fn on_position_lost(&mut self) -> FollowTransition {
        self.position_known = false;
        self.set(FollowState::Disabled)
    }

    fn set(&mut self, next: FollowState) -> FollowTransition {
        if self.state == next {
            return FollowTransition::Unchanged;
        }
        self.state = next;
        match next {
            FollowState::Enabled => FollowTransition::Enabled,
            FollowState::Disabled => FollowTransition::Disabled,
        }
    }
}
