//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use crate::consts;
use bytes::{BufMut, BytesMut};
use tracing::warn;

/// The four negotiation verbs a peer (or this side) can put on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NegotiationCommand {
    /// `IAC DO <option>`: please perform the option.
    Do,
    /// `IAC DONT <option>`: stop performing the option.
    Dont,
    /// `IAC WILL <option>`: I will perform the option.
    Will,
    /// `IAC WONT <option>`: I refuse to perform the option.
    Wont,
}

impl NegotiationCommand {
    /// The wire byte for this verb.
    pub fn byte(self) -> u8 {
        match self {
            NegotiationCommand::Do => consts::DO,
            NegotiationCommand::Dont => consts::DONT,
            NegotiationCommand::Will => consts::WILL,
            NegotiationCommand::Wont => consts::WONT,
        }
    }

    /// Maps a wire byte back to a verb, if it is one.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            consts::DO => Some(NegotiationCommand::Do),
            consts::DONT => Some(NegotiationCommand::Dont),
            consts::WILL => Some(NegotiationCommand::Will),
            consts::WONT => Some(NegotiationCommand::Wont),
            _ => None,
        }
    }
}

impl std::fmt::Display for NegotiationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationCommand::Do => write!(f, "DO"),
            NegotiationCommand::Dont => write!(f, "DONT"),
            NegotiationCommand::Will => write!(f, "WILL"),
            NegotiationCommand::Wont => write!(f, "WONT"),
        }
    }
}

/// A fully parsed protocol sequence lifted out of the byte stream.
///
/// Single-byte commands (GA, NOP, AYT, ...) carry no information the engine
/// acts on and are discarded during parsing without producing an event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolEvent {
    /// `IAC <verb> <option>`.
    Negotiate {
        /// The negotiation verb.
        command: NegotiationCommand,
        /// The option code the verb applies to.
        option: u8,
    },
    /// `IAC SB <option> <payload...> IAC SE`, payload IAC-unescaped.
    Subnegotiation {
        /// The option code the payload belongs to.
        option: u8,
        /// The collected payload bytes.
        payload: BytesMut,
    },
}

/// Where the parser stands between bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ParsePhase {
    /// Plain application text.
    Text,
    /// Saw IAC, awaiting the command byte.
    Command,
    /// Saw IAC + negotiation verb, awaiting the option byte.
    NegotiateOption(u8),
    /// Saw IAC SB, awaiting the option byte.
    Subnegotiate,
    /// Collecting subnegotiation payload for the option.
    SubnegotiateArgument(u8),
    /// Saw IAC inside a subnegotiation payload.
    SubnegotiateArgumentIac(u8),
}

/// Streaming parser state for one direction of one connection.
///
/// `advance` may be called with an arbitrary split of the byte stream; a
/// sequence cut off mid-delivery is retained (phase plus any partial
/// subnegotiation payload) and resumed on the next call. Application text is
/// compacted out as the protocol sequences are removed, so the text the
/// caller sees is an order-preserving subsequence of the wire bytes.
#[derive(Debug)]
pub struct ByteCursor {
    phase: ParsePhase,
    subneg: BytesMut,
    max_subnegotiation: usize,
}

impl ByteCursor {
    /// Creates a cursor enforcing the given subnegotiation payload limit.
    pub fn new(max_subnegotiation: usize) -> Self {
        Self {
            phase: ParsePhase::Text,
            subneg: BytesMut::new(),
            max_subnegotiation,
        }
    }

    /// True when the cursor sits between sequences with nothing buffered.
    pub fn is_idle(&self) -> bool {
        self.phase == ParsePhase::Text && self.subneg.is_empty()
    }

    /// Scans `input` once, appending application text to `clean` and
    /// completed protocol sequences to `events`. Returns the number of bytes
    /// scanned, which is always the full input; an unfinished tail lives on
    /// inside the cursor rather than being handed back.
    pub fn advance(
        &mut self,
        input: &[u8],
        events: &mut Vec<ProtocolEvent>,
        clean: &mut BytesMut,
    ) -> usize {
        for &byte in input {
            match (self.phase, byte) {
                (ParsePhase::Text, consts::IAC) => {
                    self.phase = ParsePhase::Command;
                }
                (ParsePhase::Text, _) => {
                    clean.put_u8(byte);
                }
                (ParsePhase::Command, consts::IAC) => {
                    // Escaped literal 0xFF data byte.
                    self.phase = ParsePhase::Text;
                    clean.put_u8(consts::IAC);
                }
                (
                    ParsePhase::Command,
                    consts::DO | consts::DONT | consts::WILL | consts::WONT,
                ) => {
                    self.phase = ParsePhase::NegotiateOption(byte);
                }
                (ParsePhase::Command, consts::SB) => {
                    self.phase = ParsePhase::Subnegotiate;
                }
                (
                    ParsePhase::Command,
                    consts::GA
                    | consts::NOP
                    | consts::DM
                    | consts::BRK
                    | consts::IP
                    | consts::AO
                    | consts::AYT
                    | consts::EC
                    | consts::EL
                    | consts::EOR
                    | consts::ABORT
                    | consts::SUSP
                    | consts::EOF,
                ) => {
                    self.phase = ParsePhase::Text;
                }
                (ParsePhase::Command, _) => {
                    warn!("received unknown command {:#04X}, dropping", byte);
                    self.phase = ParsePhase::Text;
                }
                (ParsePhase::NegotiateOption(_), consts::IAC) => {
                    warn!("negotiation with option byte 255, dropping");
                    self.phase = ParsePhase::Text;
                }
                (ParsePhase::NegotiateOption(command), _) => {
                    self.phase = ParsePhase::Text;
                    // from_byte cannot miss: only the four verbs reach this phase.
                    if let Some(command) = NegotiationCommand::from_byte(command) {
                        events.push(ProtocolEvent::Negotiate {
                            command,
                            option: byte,
                        });
                    }
                }
                (ParsePhase::Subnegotiate, consts::IAC) => {
                    warn!("subnegotiation missing option byte, dropping");
                    self.phase = ParsePhase::Command;
                }
                (ParsePhase::Subnegotiate, _) => {
                    self.phase = ParsePhase::SubnegotiateArgument(byte);
                }
                (ParsePhase::SubnegotiateArgument(option), consts::IAC) => {
                    self.phase = ParsePhase::SubnegotiateArgumentIac(option);
                }
                (ParsePhase::SubnegotiateArgument(option), _) => {
                    self.collect_subneg(option, byte);
                }
                (ParsePhase::SubnegotiateArgumentIac(option), consts::IAC) => {
                    self.phase = ParsePhase::SubnegotiateArgument(option);
                    self.collect_subneg(option, consts::IAC);
                }
                (ParsePhase::SubnegotiateArgumentIac(option), consts::SE) => {
                    self.phase = ParsePhase::Text;
                    events.push(ProtocolEvent::Subnegotiation {
                        option,
                        payload: self.subneg.split(),
                    });
                }
                (ParsePhase::SubnegotiateArgumentIac(option), _) => {
                    warn!(
                        option,
                        "invalid command {:#04X} during subnegotiation, aborting", byte
                    );
                    self.phase = ParsePhase::Text;
                    self.subneg.clear();
                }
            }
        }
        input.len()
    }

    fn collect_subneg(&mut self, option: u8, byte: u8) {
        if self.subneg.len() >= self.max_subnegotiation {
            warn!(
                option,
                limit = self.max_subnegotiation,
                "subnegotiation exceeded buffer limit, discarding"
            );
            self.subneg.clear();
            self.phase = ParsePhase::Text;
            return;
        }
        self.subneg.put_u8(byte);
    }
}
