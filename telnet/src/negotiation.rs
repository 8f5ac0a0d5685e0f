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

//! Per-option negotiation state following the Q-method (RFC 1143).
//!
//! Each option carries two independent triads: `local` tracks whether *we*
//! perform the option (WILL/WONT from us, DO/DONT from the peer), `remote`
//! tracks whether the peer performs it (DO/DONT from us, WILL/WONT from the
//! peer). The table is pure state; queuing and transmitting the resulting
//! commands is the engine's job.

use crate::cursor::NegotiationCommand;
use std::collections::HashMap;
use std::fmt::Formatter;
use tracing::debug;

/// Which end of the connection a triad (or a completed negotiation) is about.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    /// This side performs the option.
    Local,
    /// The peer performs the option.
    Remote,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Local => write!(f, "Local"),
            Side::Remote => write!(f, "Remote"),
        }
    }
}

/// The agreed state of one direction of one option.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum QValue {
    /// Disabled, nothing outstanding.
    #[default]
    No,
    /// Enabled, nothing outstanding.
    Yes,
    /// Disable requested, awaiting the peer's answer.
    WantNo,
    /// Enable requested, awaiting the peer's answer.
    WantYes,
}

impl std::fmt::Display for QValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QValue::No => write!(f, "No"),
            QValue::Yes => write!(f, "Yes"),
            QValue::WantNo => write!(f, "WantNo"),
            QValue::WantYes => write!(f, "WantYes"),
        }
    }
}

/// Whether a reversal is queued behind the outstanding request.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum QueueState {
    /// No queued follow-up.
    #[default]
    Empty,
    /// Once the outstanding request resolves, negotiate the opposite.
    Opposite,
}

/// One direction's negotiation state: the agreed value plus the queue bit.
///
/// Invariant: `queue` is `Opposite` only while `value` is `WantNo` or
/// `WantYes`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Triad {
    /// The agreed state.
    pub value: QValue,
    /// The queued reversal, if any.
    pub queue: QueueState,
}

impl Triad {
    /// True once negotiation has settled on enabled.
    pub fn enabled(&self) -> bool {
        self.value == QValue::Yes
    }
}

/// What a locally-initiated request asks the engine to do.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Intent {
    /// Queue this command for transmission.
    Send(NegotiationCommand),
    /// Withdraw this command if it is still queued unsent; the engine reports
    /// back through [`NegotiationEntry::apply_revoke`].
    Revoke(NegotiationCommand),
    /// Nothing to transmit.
    Nothing,
}

/// Negotiation state for a single option on a single connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NegotiationEntry {
    /// Whether this side performs the option.
    pub local: Triad,
    /// Whether the peer performs the option.
    pub remote: Triad,
}

impl NegotiationEntry {
    /// The triad for the given side.
    pub fn side(&self, side: Side) -> &Triad {
        match side {
            Side::Local => &self.local,
            Side::Remote => &self.remote,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Triad {
        match side {
            Side::Local => &mut self.local,
            Side::Remote => &mut self.remote,
        }
    }

    // #### Incoming processing (peer sent us DO/DONT/WILL/WONT) ##############

    /// Peer asks us to perform the option. Returns the reply to queue.
    pub(crate) fn recv_do(&mut self, permitted: bool) -> Option<NegotiationCommand> {
        if !permitted {
            return Some(NegotiationCommand::Wont);
        }
        match (self.local.value, self.local.queue) {
            (QValue::No, _) => {
                self.local.value = QValue::Yes;
                Some(NegotiationCommand::Will)
            }
            (QValue::Yes, _) => None,
            (QValue::WantNo, QueueState::Empty) => {
                // DO answering our WONT: protocol error, ignore.
                debug!("peer answered WONT with DO, ignoring");
                None
            }
            (QValue::WantNo, QueueState::Opposite) => {
                self.local.value = QValue::Yes;
                self.local.queue = QueueState::Empty;
                None
            }
            (QValue::WantYes, QueueState::Empty) => {
                self.local.value = QValue::Yes;
                None
            }
            (QValue::WantYes, QueueState::Opposite) => {
                self.local.value = QValue::WantNo;
                self.local.queue = QueueState::Empty;
                Some(NegotiationCommand::Wont)
            }
        }
    }

    /// Peer asks us to stop performing the option. Returns the reply to queue.
    pub(crate) fn recv_dont(&mut self) -> Option<NegotiationCommand> {
        match (self.local.value, self.local.queue) {
            (QValue::No, _) => None,
            (QValue::Yes, _) => {
                self.local.value = QValue::No;
                Some(NegotiationCommand::Wont)
            }
            (QValue::WantNo, QueueState::Empty) => {
                self.local.value = QValue::No;
                None
            }
            (QValue::WantNo, QueueState::Opposite) => {
                self.local.value = QValue::WantYes;
                self.local.queue = QueueState::Empty;
                Some(NegotiationCommand::Will)
            }
            (QValue::WantYes, QueueState::Empty) => {
                self.local.value = QValue::No;
                None
            }
            (QValue::WantYes, QueueState::Opposite) => {
                self.local.value = QValue::No;
                self.local.queue = QueueState::Empty;
                None
            }
        }
    }

    /// Peer offers to perform the option. Returns the reply to queue.
    pub(crate) fn recv_will(&mut self, permitted: bool) -> Option<NegotiationCommand> {
        if !permitted {
            return Some(NegotiationCommand::Dont);
        }
        match (self.remote.value, self.remote.queue) {
            (QValue::No, _) => {
                self.remote.value = QValue::Yes;
                Some(NegotiationCommand::Do)
            }
            (QValue::Yes, _) => None,
            (QValue::WantNo, QueueState::Empty) => {
                debug!("peer answered DONT with WILL, ignoring");
                None
            }
            (QValue::WantNo, QueueState::Opposite) => {
                self.remote.value = QValue::Yes;
                self.remote.queue = QueueState::Empty;
                None
            }
            (QValue::WantYes, QueueState::Empty) => {
                self.remote.value = QValue::Yes;
                None
            }
            (QValue::WantYes, QueueState::Opposite) => {
                self.remote.value = QValue::WantNo;
                self.remote.queue = QueueState::Empty;
                Some(NegotiationCommand::Dont)
            }
        }
    }

    /// Peer refuses (or stops) performing the option. Returns the reply.
    pub(crate) fn recv_wont(&mut self) -> Option<NegotiationCommand> {
        match (self.remote.value, self.remote.queue) {
            (QValue::No, _) => None,
            (QValue::Yes, _) => {
                self.remote.value = QValue::No;
                Some(NegotiationCommand::Dont)
            }
            (QValue::WantNo, QueueState::Empty) => {
                self.remote.value = QValue::No;
                None
            }
            (QValue::WantNo, QueueState::Opposite) => {
                self.remote.value = QValue::WantYes;
                self.remote.queue = QueueState::Empty;
                Some(NegotiationCommand::Do)
            }
            (QValue::WantYes, QueueState::Empty) => {
                self.remote.value = QValue::No;
                None
            }
            (QValue::WantYes, QueueState::Opposite) => {
                self.remote.value = QValue::No;
                self.remote.queue = QueueState::Empty;
                None
            }
        }
    }

    // #### Outgoing requests (what we initiate) ##############################

    /// We want to start performing the option.
    pub(crate) fn request_local_enable(&mut self) -> Intent {
        match (self.local.value, self.local.queue) {
            (QValue::No, _) => {
                self.local.value = QValue::WantYes;
                Intent::Send(NegotiationCommand::Will)
            }
            (QValue::Yes, _) => Intent::Nothing,
            (QValue::WantYes, QueueState::Empty) => Intent::Nothing,
            (QValue::WantYes, QueueState::Opposite) => {
                self.local.queue = QueueState::Empty;
                Intent::Nothing
            }
            (QValue::WantNo, QueueState::Empty) => Intent::Revoke(NegotiationCommand::Wont),
            (QValue::WantNo, QueueState::Opposite) => Intent::Nothing,
        }
    }

    /// We want to stop performing the option.
    pub(crate) fn request_local_disable(&mut self) -> Intent {
        match (self.local.value, self.local.queue) {
            (QValue::No, _) => Intent::Nothing,
            (QValue::Yes, _) => {
                self.local.value = QValue::WantNo;
                Intent::Send(NegotiationCommand::Wont)
            }
            (QValue::WantNo, QueueState::Empty) => Intent::Nothing,
            (QValue::WantNo, QueueState::Opposite) => {
                self.local.queue = QueueState::Empty;
                Intent::Nothing
            }
            (QValue::WantYes, QueueState::Empty) => Intent::Revoke(NegotiationCommand::Will),
            (QValue::WantYes, QueueState::Opposite) => Intent::Nothing,
        }
    }

    /// We want the peer to start performing the option.
    pub(crate) fn request_remote_enable(&mut self) -> Intent {
        match (self.remote.value, self.remote.queue) {
            (QValue::No, _) => {
                self.remote.value = QValue::WantYes;
                Intent::Send(NegotiationCommand::Do)
            }
            (QValue::Yes, _) => Intent::Nothing,
            (QValue::WantYes, QueueState::Empty) => Intent::Nothing,
            (QValue::WantYes, QueueState::Opposite) => {
                self.remote.queue = QueueState::Empty;
                Intent::Nothing
            }
            (QValue::WantNo, QueueState::Empty) => Intent::Revoke(NegotiationCommand::Dont),
            (QValue::WantNo, QueueState::Opposite) => Intent::Nothing,
        }
    }

    /// We want the peer to stop performing the option.
    pub(crate) fn request_remote_disable(&mut self) -> Intent {
        match (self.remote.value, self.remote.queue) {
            (QValue::No, _) => Intent::Nothing,
            (QValue::Yes, _) => {
                self.remote.value = QValue::WantNo;
                Intent::Send(NegotiationCommand::Dont)
            }
            (QValue::WantNo, QueueState::Empty) => Intent::Nothing,
            (QValue::WantNo, QueueState::Opposite) => {
                self.remote.queue = QueueState::Empty;
                Intent::Nothing
            }
            (QValue::WantYes, QueueState::Empty) => Intent::Revoke(NegotiationCommand::Do),
            (QValue::WantYes, QueueState::Opposite) => Intent::Nothing,
        }
    }

    /// Settles a [`Intent::Revoke`]: `cancelled` means the unsent command was
    /// pulled back out of the queue and the triad rolls back to where it
    /// stood; otherwise the command is already on the wire and the reversal
    /// is deferred behind the peer's answer.
    pub(crate) fn apply_revoke(&mut self, side: Side, enable: bool, cancelled: bool) {
        let triad = self.side_mut(side);
        if cancelled {
            triad.value = if enable { QValue::Yes } else { QValue::No };
            triad.queue = QueueState::Empty;
        } else {
            triad.queue = QueueState::Opposite;
        }
    }

    /// Bookkeeping for a negotiation command this side put on the wire
    /// outside the request path (extension-originated or hand-rolled bytes).
    /// Never produces a reply; only records the outstanding request.
    pub(crate) fn record_sent(&mut self, command: NegotiationCommand) {
        match command {
            NegotiationCommand::Will => {
                if self.local.value == QValue::No {
                    self.local.value = QValue::WantYes;
                }
            }
            NegotiationCommand::Wont => {
                if self.local.value == QValue::Yes {
                    self.local.value = QValue::WantNo;
                }
            }
            NegotiationCommand::Do => {
                if self.remote.value == QValue::No {
                    self.remote.value = QValue::WantYes;
                }
            }
            NegotiationCommand::Dont => {
                if self.remote.value == QValue::Yes {
                    self.remote.value = QValue::WantNo;
                }
            }
        }
    }
}

/// All negotiation entries for one connection, keyed by option code and
/// created lazily the first time an option is referenced.
#[derive(Debug, Default)]
pub struct NegotiationTable {
    entries: HashMap<u8, NegotiationEntry>,
}

impl NegotiationTable {
    /// The entry for the option, created in its default (all-`No`) state.
    pub fn entry(&mut self, option: u8) -> &mut NegotiationEntry {
        self.entries.entry(option).or_default()
    }

    /// The entry for the option, if it has been referenced.
    pub fn get(&self, option: u8) -> Option<&NegotiationEntry> {
        self.entries.get(&option)
    }

    /// Number of options referenced so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no option has been referenced.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once we have agreed to perform the option.
    pub fn local_enabled(&self, option: u8) -> bool {
        self.get(option).is_some_and(|e| e.local.enabled())
    }

    /// True once the peer has agreed to perform the option.
    pub fn remote_enabled(&self, option: u8) -> bool {
        self.get(option).is_some_and(|e| e.remote.enabled())
    }
}
