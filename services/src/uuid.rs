use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Stable chunk id for free-form content: the same text always yields the same id.
pub fn content_id(prefix: &str, content: &str) -> String {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, normalized.as_bytes());
    format!("{prefix}:{}", digest.simple())
}

/// Random id for ephemeral records (log entries, request ids).
pub fn random_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_uuid_is_deterministic() {
        assert_eq!(stable_uuid("experience:acme:result"), stable_uuid("experience:acme:result"));
        assert_ne!(stable_uuid("a"), stable_uuid("b"));
    }

    #[test]
    fn content_id_ignores_whitespace_layout() {
        let a = content_id("doc", "React  skills\nand components");
        let b = content_id("doc", "React skills and components");
        assert_eq!(a, b);
        assert!(a.starts_with("doc:"));
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(random_id("log"), random_id("log"));
    }
}
