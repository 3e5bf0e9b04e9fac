//! Per-member event index

use std::collections::BTreeMap;

use famcal_core::Event;

/// Events grouped by the members involved in them.
///
/// Each member's list keeps the order in which events were added. An event
/// appears at most once per member even if its creator is also an attendee.
#[derive(Debug, Default)]
pub struct MemberIndex<'a> {
    members: BTreeMap<&'a str, Vec<&'a Event>>,
}

impl<'a> MemberIndex<'a> {
    pub fn build(events: &'a [Event]) -> Self {
        let mut index = Self::default();
        for event in events {
            index.insert(event);
        }
        index
    }

    /// Add an event under its creator and every attendee
    pub fn insert(&mut self, event: &'a Event) {
        for member in event.involved_members() {
            self.members.entry(member).or_default().push(event);
        }
    }

    /// Iterate members in identifier order with their events
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &[&'a Event])> + '_ {
        self.members.iter().map(|(member, events)| (*member, events.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
