use crate::manager::Manager;

/// Process names that must never be signalled.
pub const DEFAULT_PROTECTED: &[&str] = &[
    "systemd", "init", "kthreadd", "sshd", "dbus-daemon", "Xorg", "gnome-shell",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionPolicy {
    protected: Vec<String>,
}

impl Default for ProtectionPolicy {
    fn default() -> Self {
        ProtectionPolicy::new(DEFAULT_PROTECTED.iter().map(|s| s.to_string()).collect())
    }
}

impl ProtectionPolicy {
    pub fn new(protected: Vec<String>) -> Self {
        ProtectionPolicy { protected }
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.iter().any(|p| p == name)
    }
}

//Checks the name against the manager's policy (Done before any signal is sent)
pub fn check_not_protected(manager: &Manager, name: &str) -> Result<(), String> {
    if manager.protection.is_protected(name) {
        Err(format!("Permission denied: '{}' is a protected process.", name))
    } else {
        Ok(())
    }
}
