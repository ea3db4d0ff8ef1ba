//! Handle-based storage used by the GPU backends

pub use slotmap::{DefaultKey, Key, KeyData, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Pack a slot map key into the opaque `u64` carried by API handles
pub fn key_to_raw(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

/// Recover a slot map key from an opaque `u64` handle
pub fn raw_to_key(raw: u64) -> DefaultKey {
    DefaultKey::from(KeyData::from_ffi(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip_resolves_same_slot() {
        let mut map: HandleMap<&str> = HandleMap::new();
        let key = map.insert("atlas");
        let raw = key_to_raw(key);
        assert_eq!(map.get(raw_to_key(raw)), Some(&"atlas"));
    }

    #[test]
    fn stale_raw_handle_misses_after_removal() {
        let mut map: HandleMap<u32> = HandleMap::new();
        let raw = key_to_raw(map.insert(7));
        map.remove(raw_to_key(raw));
        map.insert(8);
        assert!(map.get(raw_to_key(raw)).is_none());
    }
}
