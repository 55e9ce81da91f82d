//! Hint selection
//!
//! Spends one hint credit per call on a random progression or useful item
//! that sits in one of our own still-missing locations.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::client::events::SessionEvent;
use crate::client::session::Session;
use crate::protocol::{NetworkItem, OutboundPacket};

/// Items a hint could reveal
pub fn hint_candidates(session: &Session) -> Vec<&NetworkItem> {
    session
        .network_items
        .iter()
        .filter(|item| {
            item.item_type.is_hintable()
                && session.missing_locations.contains(&item.location_id)
                && item.player_id == session.slot_id
        })
        .collect()
}

/// Queue a hinting scout if a credit is available.
///
/// Returns the chosen location. With no candidates the credit is kept for
/// a later tick.
pub fn request_hint<R: Rng + ?Sized>(session: &mut Session, rng: &mut R) -> Option<i64> {
    if !session.is_connected() || session.hint_credits == 0 {
        return None;
    }

    let location = hint_candidates(session).choose(rng)?.location_id;

    session.enqueue(OutboundPacket::LocationScouts {
        locations: vec![location],
        create_as_hint: 1,
    });
    session.hint_credits -= 1;
    info!("requesting hint for location {} ({} credits left)", location, session.hint_credits);
    session.emit(SessionEvent::HintRequested { location });
    Some(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::{ClientConfig, Identity};
    use crate::protocol::{ConnectionState, ItemType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const OWN_SLOT: i64 = 2;

    fn item(location_id: i64, player_id: i64, item_type: ItemType) -> NetworkItem {
        NetworkItem {
            item_id: 1000 + location_id,
            location_id,
            player_id,
            item_type,
            is_owned_by_receiver: true,
        }
    }

    fn connected_session(items: Vec<NetworkItem>, missing: &[i64]) -> Session {
        let mut session = Session::new(Identity::new(&ClientConfig::new("localhost", 1, "Runner")));
        session.set_status(ConnectionState::SocketConnecting);
        session.set_status(ConnectionState::Connecting);
        session.set_status(ConnectionState::Connected);
        session.slot_id = OWN_SLOT;
        session.missing_locations = missing.iter().copied().collect();
        session.network_items = items;
        session
    }

    #[test]
    fn test_no_credit_no_request() {
        let mut session = connected_session(vec![item(10, OWN_SLOT, ItemType::Progression)], &[10]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(request_hint(&mut session, &mut rng), None);
        assert_eq!(session.queue_len(), 0);
    }

    #[test]
    fn test_requires_authenticated_session() {
        let mut session = connected_session(vec![item(10, OWN_SLOT, ItemType::Progression)], &[10]);
        session.disconnect("test");
        session.hint_credits = 1;
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(request_hint(&mut session, &mut rng), None);
        assert_eq!(session.hint_credits, 1);
    }

    #[test]
    fn test_spends_exactly_one_credit() {
        let mut session = connected_session(vec![item(10, OWN_SLOT, ItemType::Useful)], &[10]);
        session.hint_credits = 3;
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(request_hint(&mut session, &mut rng), Some(10));
        assert_eq!(session.hint_credits, 2);
        assert_eq!(
            session.dequeue(),
            Some(OutboundPacket::LocationScouts { locations: vec![10], create_as_hint: 1 })
        );
        assert_eq!(session.drain_events(), vec![SessionEvent::HintRequested { location: 10 }]);
    }

    #[test]
    fn test_filler_and_traps_keep_credit() {
        let items = vec![
            item(10, OWN_SLOT, ItemType::Filler),
            item(11, OWN_SLOT, ItemType::Trap),
            item(12, OWN_SLOT, ItemType::ProgressionSkipBalancing),
        ];
        let mut session = connected_session(items, &[10, 11, 12]);
        session.hint_credits = 1;
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(request_hint(&mut session, &mut rng), None);
        assert_eq!(session.hint_credits, 1);
        assert_eq!(session.queue_len(), 0);
    }

    #[test]
    fn test_only_own_missing_locations() {
        let items = vec![
            item(10, OWN_SLOT, ItemType::Progression), // already checked
            item(11, 7, ItemType::Progression),        // another world
            item(12, OWN_SLOT, ItemType::Progression),
            item(13, OWN_SLOT, ItemType::Useful),
        ];
        let mut session = connected_session(items, &[11, 12, 13]);
        session.hint_credits = 50;
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let location = request_hint(&mut session, &mut rng).unwrap();
            assert!(location == 12 || location == 13);
        }
        assert_eq!(session.hint_credits, 0);
        assert_eq!(session.queue_len(), 50);
    }
}
