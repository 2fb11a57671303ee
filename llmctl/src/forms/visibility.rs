use crate::types::ApiKeyId;
use std::collections::HashSet;

const MASK: char = '•';

/// Which API key secrets are currently shown in full.
///
/// Pure view state held next to the store: it is never saved with the keys and toggling it
/// never touches a secret. Every key starts masked.
#[derive(Debug, Clone, Default)]
pub struct SecretVisibility {
    revealed: HashSet<ApiKeyId>,
}

impl SecretVisibility {
    /// Replace every character of `secret` with a bullet.
    pub fn mask(secret: &str) -> String {
        secret.chars().map(|_| MASK).collect()
    }

    /// Flip the visibility of one key, returning whether it is now revealed.
    pub fn toggle(&mut self, id: ApiKeyId) -> bool {
        if self.revealed.remove(&id) {
            false
        } else {
            self.revealed.insert(id);
            true
        }
    }

    pub fn is_revealed(&self, id: &ApiKeyId) -> bool {
        self.revealed.contains(id)
    }

    /// The text to show for a key's secret.
    pub fn display(&self, id: &ApiKeyId, secret: &str) -> String {
        if self.is_revealed(id) {
            secret.to_string()
        } else {
            Self::mask(secret)
        }
    }

    /// Drop the state of a deleted key.
    pub fn forget(&mut self, id: &ApiKeyId) {
        self.revealed.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_masked_by_default() {
        let visibility = SecretVisibility::default();
        let id = Uuid::new_v4();
        assert!(!visibility.is_revealed(&id));
        assert_eq!(visibility.display(&id, "sk-ant-123"), "••••••••••");
    }

    #[test]
    fn test_toggle_twice_restores_mask_and_keeps_secret() {
        let mut visibility = SecretVisibility::default();
        let id = Uuid::new_v4();
        let secret = String::from("AIza-secret");

        assert!(visibility.toggle(id));
        assert_eq!(visibility.display(&id, &secret), "AIza-secret");

        assert!(!visibility.toggle(id));
        assert_eq!(visibility.display(&id, &secret), SecretVisibility::mask(&secret));
        assert_eq!(secret, "AIza-secret");
    }

    #[test]
    fn test_visibility_is_per_key() {
        let mut visibility = SecretVisibility::default();
        let shown = Uuid::new_v4();
        let hidden = Uuid::new_v4();
        visibility.toggle(shown);

        assert!(visibility.is_revealed(&shown));
        assert!(!visibility.is_revealed(&hidden));

        visibility.forget(&shown);
        assert!(!visibility.is_revealed(&shown));
    }
}
