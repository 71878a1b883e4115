//! Authority split for online matches.
//!
//! Each client simulates exactly one combatant slot. The other slot is
//! remote-authoritative: local AI, abilities, and physics never advance it,
//! and whatever the peer last sent overwrites it wholesale. Inbound traffic
//! lands in latest-wins buffers with no backpressure; the tick drains them
//! at its end so fresh data survives any same-tick local write.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::game::combatant::Combatant;
use crate::game::input::InputIntent;
use crate::game::PlayerSlot;
use crate::sync::protocol::{CombatantUpdate, PeerMsg, RemoteInput};
use crate::util::time::unix_millis;

#[derive(Default)]
struct RemoteShared {
    state: Mutex<Option<(u64, CombatantUpdate)>>,
    input: Mutex<Option<(u64, RemoteInput)>>,
}

/// Cloneable inbox handle for the network side. Safe to push from another
/// thread; an unconsumed message is simply replaced by a newer one.
#[derive(Clone, Default)]
pub struct RemoteHandle {
    shared: Arc<RemoteShared>,
}

impl RemoteHandle {
    pub fn push(&self, msg: PeerMsg) {
        match msg {
            PeerMsg::State { seq, update, .. } => self.push_state(seq, update),
            PeerMsg::Input { seq, input } => self.push_input(seq, input),
            PeerMsg::Hello { ref display_name, .. } => {
                debug!(peer = %display_name, "peer session opened")
            }
            PeerMsg::Bye => debug!("peer session closed"),
        }
    }

    pub fn push_state(&self, seq: u64, update: CombatantUpdate) {
        let mut slot = self.shared.state.lock();
        if slot.as_ref().is_some_and(|(buffered, _)| *buffered >= seq) {
            trace!(seq, "stale snapshot dropped at inbox");
            return;
        }
        *slot = Some((seq, update));
    }

    pub fn push_input(&self, seq: u64, input: RemoteInput) {
        let mut slot = self.shared.input.lock();
        if slot.as_ref().is_some_and(|(buffered, _)| *buffered >= seq) {
            return;
        }
        *slot = Some((seq, input));
    }

    fn take_state(&self) -> Option<(u64, CombatantUpdate)> {
        self.shared.state.lock().take()
    }

    fn take_input(&self) -> Option<(u64, RemoteInput)> {
        self.shared.input.lock().take()
    }
}

/// Owns the local/remote slot assignment and the inbound merge
pub struct Reconciler {
    local_slot: PlayerSlot,
    inbox: RemoteHandle,
    state_seq_out: u64,
    input_seq_out: u64,
    last_state_seq_in: u64,
    last_input_seq_in: u64,
    latest_remote_input: RemoteInput,
}

impl Reconciler {
    pub fn new(local_slot: PlayerSlot) -> Self {
        Self {
            local_slot,
            inbox: RemoteHandle::default(),
            state_seq_out: 0,
            input_seq_out: 0,
            last_state_seq_in: 0,
            last_input_seq_in: 0,
            latest_remote_input: RemoteInput::default(),
        }
    }

    pub fn local_slot(&self) -> PlayerSlot {
        self.local_slot
    }

    pub fn remote_slot(&self) -> PlayerSlot {
        self.local_slot.other()
    }

    pub fn is_remote(&self, slot: PlayerSlot) -> bool {
        slot == self.remote_slot()
    }

    /// Inbox handle for the transport to push into
    pub fn handle(&self) -> RemoteHandle {
        self.inbox.clone()
    }

    /// Outbound: full state of the locally-simulated combatant
    pub fn extract_local_state(&mut self, combatants: &[Combatant]) -> Option<PeerMsg> {
        let c = combatants.get(self.local_slot.index())?;
        self.state_seq_out += 1;
        Some(PeerMsg::State {
            seq: self.state_seq_out,
            sent_at: unix_millis(),
            update: CombatantUpdate::of(c),
        })
    }

    /// Outbound: the local player's steering and triggers
    pub fn extract_local_input(&mut self, intent: &InputIntent) -> PeerMsg {
        self.input_seq_out += 1;
        PeerMsg::Input {
            seq: self.input_seq_out,
            input: RemoteInput {
                dir_x: intent.direction.x,
                dir_y: intent.direction.y,
                triggers: intent.triggers,
            },
        }
    }

    /// The peer's most recent steering, for cosmetic prediction only
    pub fn remote_input(&self) -> RemoteInput {
        self.latest_remote_input
    }

    /// Drain the inbox into the remote combatant. Returns true when a state
    /// update was applied.
    pub fn apply_inbound(&mut self, combatants: &mut [Combatant], now: f32) -> bool {
        if let Some((seq, input)) = self.inbox.take_input() {
            if seq > self.last_input_seq_in {
                self.last_input_seq_in = seq;
                self.latest_remote_input = input;
            }
        }

        let Some((seq, update)) = self.inbox.take_state() else {
            return false;
        };
        if seq <= self.last_state_seq_in {
            trace!(seq, "stale snapshot dropped at merge");
            return false;
        }
        // missing combatant is a no-op for this tick
        let Some(remote) = combatants.get_mut(self.remote_slot().index()) else {
            return false;
        };
        update.apply_to(remote, now);
        remote.last_network_update = Some(unix_millis());
        self.last_state_seq_in = seq;
        true
    }
}
