//! Typed ID definitions.

use crate::{define_id, define_snowflake};

// =============================================================================
// System-generated
// =============================================================================

define_id!(EntryId, "ent");

// =============================================================================
// Platform-assigned
// =============================================================================

define_snowflake!(ParticipantId);
define_snowflake!(CommunityId);
define_snowflake!(LocationId);
define_snowflake!(DisplayId);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_roundtrip() {
        let id = EntryId::new();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!(id.to_string().starts_with("ent_"));
    }

    #[test]
    fn test_entry_id_invalid_prefix() {
        let result: Result<EntryId, _> = "org_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(result.unwrap_err().is_prefix_error());
    }

    #[test]
    fn test_entry_id_missing_separator() {
        let result: Result<EntryId, _> = "ent01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(
            result.unwrap_err(),
            crate::IdError::MissingSeparator
        ));
    }

    #[test]
    fn test_entry_id_empty() {
        let result: Result<EntryId, _> = "".parse();
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_entry_id_invalid_ulid() {
        let result: Result<EntryId, _> = "ent_invalid".parse();
        assert!(matches!(result.unwrap_err(), crate::IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_entry_id_json_is_string() {
        let id = EntryId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entry_ids_sortable() {
        let id1 = EntryId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = EntryId::new();
        assert!(id1 < id2);
    }

    #[test]
    fn test_snowflake_parse_and_display() {
        let id: ParticipantId = "175928847299117063".parse().unwrap();
        assert_eq!(id.get(), 175_928_847_299_117_063);
        assert_eq!(id.to_string(), "175928847299117063");
    }

    #[test]
    fn test_snowflake_rejects_garbage() {
        let result: Result<CommunityId, _> = "-12".parse();
        assert!(matches!(
            result.unwrap_err(),
            crate::IdError::InvalidSnowflake(_)
        ));
        let result: Result<CommunityId, _> = "".parse();
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_snowflake_json_is_number() {
        let id = LocationId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let parsed: LocationId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }
}
