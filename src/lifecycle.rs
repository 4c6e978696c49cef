/// A guarded two-state lifecycle.
///
/// Both the engine (stopped/started) and the overlay visibility
/// (hidden/shown) go through one of these. A transition only reports `true`
/// when the state actually changed, so callers run their side effects
/// exactly once no matter how often they are asked to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Lifecycle {
    active: bool,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self { active: false }
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Inactive to active. Returns `false` when already active.
    #[must_use]
    pub const fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    /// Active to inactive. Returns `false` when already inactive.
    #[must_use]
    pub const fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Lifecycle;

    #[test]
    fn transitions_fire_once() {
        let mut lifecycle = Lifecycle::new();
        assert!(!lifecycle.deactivate());
        assert!(lifecycle.activate());
        assert!(!lifecycle.activate());
        assert!(lifecycle.is_active());
        assert!(lifecycle.deactivate());
        assert!(!lifecycle.deactivate());
        assert!(lifecycle.activate());
    }
}
