//! The pairing state machine, as pure data transitions.
//!
//! A session is `Unbound` (no heart code) or `Bound` (code set, subscribed
//! to the registry). `needs_repairing` is a sub-flag of `Unbound` that
//! distinguishes "was paired, user explicitly unpaired" from "never
//! paired". All transitions here are synchronous and side-effect free; the
//! actor in `actor.rs` drives persistence and projection around them.

use tandem_shared::{HeartCode, HeartRecord, PairingSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub snapshot: PairingSnapshot,
}

impl SessionState {
    pub fn from_snapshot(snapshot: PairingSnapshot) -> Self {
        Self { snapshot }
    }

    /// Bound means a heart code is set and the registry subscription should
    /// be open.
    pub fn is_bound(&self) -> bool {
        self.snapshot.heart_code.is_some()
    }

    /// `Unbound -> Bound`: adopt a heart after create or join.
    pub fn bind(
        &mut self,
        heart_name: &str,
        code: HeartCode,
        user_name: &str,
        is_creator: bool,
    ) {
        self.snapshot.heart_name = heart_name.to_string();
        self.snapshot.heart_code = Some(code);
        self.snapshot.current_user_name = user_name.to_string();
        self.snapshot.is_creator = is_creator;
        self.snapshot.needs_repairing = false;
    }

    /// Merge a registry snapshot into local state.
    ///
    /// Takes the heart name and paired flag, plus the counterpart's name
    /// for this device's role. Idempotent: applying the same record twice
    /// reports no change the second time.
    pub fn apply(&mut self, record: &HeartRecord) -> bool {
        let partner_name = record.counterpart_name(self.snapshot.is_creator);

        let changed = self.snapshot.heart_name != record.name
            || self.snapshot.is_paired != record.is_paired
            || self.snapshot.partner_name != partner_name;

        self.snapshot.heart_name = record.name.clone();
        self.snapshot.is_paired = record.is_paired;
        self.snapshot.partner_name = partner_name.to_string();

        changed
    }

    /// Optimistic local rename; the registry's own record is updated by a
    /// separate direct call.
    pub fn rename(&mut self, name: &str) {
        self.snapshot.heart_name = name.to_string();
    }

    /// `Bound -> Unbound`, remembering that this was an explicit unpair.
    ///
    /// The user's own display name survives; everything tied to the heart
    /// is cleared.
    pub fn unpair(&mut self) {
        self.snapshot.heart_name.clear();
        self.snapshot.heart_code = None;
        self.snapshot.partner_name.clear();
        self.snapshot.is_paired = false;
        self.snapshot.is_creator = false;
        self.snapshot.needs_repairing = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_shared::UserId;

    fn record(name: &str, paired: bool, partner: &str) -> HeartRecord {
        let mut record = HeartRecord::new(
            HeartCode::parse("A1B2C3").unwrap(),
            name,
            UserId::from("alex-id"),
            "Alex",
        );
        record.is_paired = paired;
        record.partner_name = partner.to_string();
        record
    }

    fn bound_creator() -> SessionState {
        let mut state = SessionState::default();
        state.bind("Us", HeartCode::parse("A1B2C3").unwrap(), "Alex", true);
        state
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut state = bound_creator();
        let update = record("Us", true, "Sam");

        assert!(state.apply(&update));
        let after_first = state.clone();

        assert!(!state.apply(&update));
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_apply_picks_counterpart_by_role() {
        // Creator sees the partner's name.
        let mut creator = bound_creator();
        creator.apply(&record("Us", true, "Sam"));
        assert_eq!(creator.snapshot.partner_name, "Sam");

        // Partner sees the creator's name.
        let mut partner = SessionState::default();
        partner.bind("Us", HeartCode::parse("A1B2C3").unwrap(), "Sam", false);
        partner.apply(&record("Us", true, "Sam"));
        assert_eq!(partner.snapshot.partner_name, "Alex");
    }

    #[test]
    fn test_bind_clears_needs_repairing() {
        let mut state = bound_creator();
        state.unpair();
        assert!(state.snapshot.needs_repairing);
        assert!(!state.is_bound());

        state.bind("Again", HeartCode::parse("X9Y8Z7").unwrap(), "Alex", true);
        assert!(!state.snapshot.needs_repairing);
        assert!(state.is_bound());
    }

    #[test]
    fn test_unpair_keeps_own_name() {
        let mut state = bound_creator();
        state.apply(&record("Us", true, "Sam"));

        state.unpair();

        assert_eq!(state.snapshot.current_user_name, "Alex");
        assert!(state.snapshot.heart_name.is_empty());
        assert!(state.snapshot.partner_name.is_empty());
        assert!(!state.snapshot.is_paired);
        assert!(state.snapshot.needs_repairing);
    }
}
