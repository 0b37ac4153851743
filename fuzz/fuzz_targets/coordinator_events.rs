//! Event-sequence fuzzer for the pairing state machine
//!
//! Each input byte pair becomes one coordinator input over a pool of four
//! endpoints. After every step the coordinator must hold at most one peer,
//! and that peer may only change by passing through Idle or Searching.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use skirmish_core::{
    coordinator::{Coordinator, CoordinatorInput},
    transport::{EndpointId, TransferStatus, TransportEvent},
};

const ENDPOINTS: [&str; 4] = ["a", "b", "c", "d"];

fn input(op: u8, arg: u8) -> CoordinatorInput {
    let endpoint = EndpointId::from(ENDPOINTS[usize::from(arg) % ENDPOINTS.len()]);
    let name = format!("name-{arg}");

    match op % 10 {
        0 => CoordinatorInput::FindOpponent,
        1 => CoordinatorInput::Disconnect,
        2 => CoordinatorInput::Shutdown,
        3 => CoordinatorInput::Event(TransportEvent::EndpointFound { endpoint, name }),
        4 => CoordinatorInput::Event(TransportEvent::EndpointLost { endpoint }),
        5 => CoordinatorInput::Event(TransportEvent::ConnectionInitiated { endpoint, name }),
        6 => CoordinatorInput::Event(TransportEvent::ConnectionResult {
            endpoint,
            success: arg & 0x80 != 0,
        }),
        7 => CoordinatorInput::Event(TransportEvent::Disconnected { endpoint }),
        8 => CoordinatorInput::Event(TransportEvent::PayloadReceived {
            endpoint,
            payload: Bytes::copy_from_slice(&[arg]),
        }),
        _ => CoordinatorInput::Event(TransportEvent::PayloadTransferUpdate {
            endpoint,
            status: TransferStatus::Success,
        }),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut coordinator = Coordinator::new();

    for pair in data.chunks_exact(2) {
        let before = coordinator.state().peer().map(|peer| peer.endpoint_id.clone());
        coordinator.apply(&input(pair[0], pair[1]));
        let after = coordinator.state().peer().map(|peer| peer.endpoint_id.clone());

        if let (Some(before), Some(after)) = (before, after) {
            assert_eq!(before, after, "peer swapped without leaving the pairing states");
        }
    }
});
