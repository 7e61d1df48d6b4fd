//! The total order over bundle entities used to pick a preferred
//! candidate, per spec.md §4.1: channel ascending by name, then version
//! descending, with entity id as a final tie-break to make the order
//! total even when two entities otherwise compare equal.

use crate::entity::Entity;
use std::cmp::Ordering;

/// Orders entities by `(channel name asc, version desc, id asc)`.
/// Entities missing a channel or version sort after ones that have them,
/// so malformed catalog data never wins a tie silently.
pub struct ByChannelAndVersion;

impl ByChannelAndVersion {
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let channel_a = a.channel().map(|c| c.name.clone());
        let channel_b = b.channel().map(|c| c.name.clone());
        let by_channel = match (channel_a, channel_b) {
            (Some(ca), Some(cb)) => ca.cmp(&cb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if by_channel != Ordering::Equal {
            return by_channel;
        }

        let version_a = a.version().ok();
        let version_b = b.version().ok();
        let by_version = match (version_a, version_b) {
            (Some(va), Some(vb)) => vb.cmp(&va),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if by_version != Ordering::Equal {
            return by_version;
        }

        a.id().cmp(b.id())
    }

    pub fn sort(&self, entities: &mut [Entity]) {
        entities.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{keys, Channel, PropertyValue};
    use std::collections::BTreeMap;

    fn bundle(id: &str, channel: &str, version: &str) -> Entity {
        let mut props = BTreeMap::new();
        props.insert(
            keys::PACKAGE_CHANNEL.to_string(),
            PropertyValue::Channel(Channel {
                name: channel.to_string(),
                replaces: None,
            }),
        );
        props.insert(
            keys::PACKAGE_VERSION.to_string(),
            PropertyValue::String(version.to_string()),
        );
        Entity::new(id, props)
    }

    #[test]
    fn prefers_higher_version_within_same_channel() {
        let mut entities = vec![
            bundle("a", "stable", "1.0.0"),
            bundle("b", "stable", "2.0.0"),
        ];
        ByChannelAndVersion.sort(&mut entities);
        assert_eq!(entities[0].id().to_string(), "b");
    }

    #[test]
    fn channel_name_breaks_ties_before_version() {
        let mut entities = vec![
            bundle("a", "stable", "1.0.0"),
            bundle("b", "alpha", "9.0.0"),
        ];
        ByChannelAndVersion.sort(&mut entities);
        assert_eq!(entities[0].id().to_string(), "b");
    }
}
