//! Telnet option filtering.
//!
//! Switch consoles open with a burst of option negotiation. We stay in plain
//! line mode: every `DO` is answered `WONT`, every `WILL` is answered `DONT`,
//! and negotiation bytes never reach the text buffer.

/// Interpret As Command.
const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
/// Subnegotiation begin.
const SB: u8 = 250;
/// Subnegotiation end.
const SE: u8 = 240;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Data,
    Iac,
    Negotiate(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Streaming Telnet filter; keeps state across reads.
#[derive(Debug, Default)]
pub struct TelnetFilter {
    state: State,
}

/// Output of one [`TelnetFilter::feed`] call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Filtered {
    /// Application data with negotiation removed.
    pub data: Vec<u8>,
    /// Refusals to send back to the device.
    pub replies: Vec<u8>,
}

impl TelnetFilter {
    /// Creates a filter in the data state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters a chunk read from the socket.
    pub fn feed(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered::default();

        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, 0) => State::Data,
                (State::Data, b) => {
                    out.data.push(b);
                    State::Data
                }
                (State::Iac, IAC) => {
                    out.data.push(IAC);
                    State::Data
                }
                (State::Iac, DO | DONT | WILL | WONT) => State::Negotiate(byte),
                (State::Iac, SB) => State::Subnegotiation,
                (State::Iac, _) => State::Data,
                (State::Negotiate(verb), option) => {
                    match verb {
                        DO => out.replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => out.replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    State::Data
                }
                (State::Subnegotiation, IAC) => State::SubnegotiationIac,
                (State::Subnegotiation, _) => State::Subnegotiation,
                (State::SubnegotiationIac, SE) => State::Data,
                (State::SubnegotiationIac, _) => State::Subnegotiation,
            };
        }

        out
    }
}
