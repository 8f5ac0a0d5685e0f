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

//! Telnet wire byte values (RFC 854/855).

/// Interpret As Command: introduces every protocol sequence.
pub const IAC: u8 = 255;
/// You are not to use option.
pub const DONT: u8 = 254;
/// Please, you use option.
pub const DO: u8 = 253;
/// I won't use option.
pub const WONT: u8 = 252;
/// I will use option.
pub const WILL: u8 = 251;
/// Begin subnegotiation.
pub const SB: u8 = 250;
/// Go ahead: you may reverse the line.
pub const GA: u8 = 249;
/// Erase the current line.
pub const EL: u8 = 248;
/// Erase the current character.
pub const EC: u8 = 247;
/// Are you there.
pub const AYT: u8 = 246;
/// Abort output, but let the program finish.
pub const AO: u8 = 245;
/// Interrupt process.
pub const IP: u8 = 244;
/// Break.
pub const BRK: u8 = 243;
/// Data mark, for connection cleaning.
pub const DM: u8 = 242;
/// No operation.
pub const NOP: u8 = 241;
/// End subnegotiation.
pub const SE: u8 = 240;
/// End of record (transparent mode).
pub const EOR: u8 = 239;
/// Abort process.
pub const ABORT: u8 = 238;
/// Suspend process.
pub const SUSP: u8 = 237;
/// End of file.
pub const EOF: u8 = 236;

///
/// Negotiable option codes used by this engine. Any `u8` except
/// [`IAC`](super::consts::IAC) is a valid option code on the wire; these are
/// the ones the engine or its built-in extensions reference by name.
///
pub mod option {
    /// Echo [RFC857](https://tools.ietf.org/html/rfc857).
    pub const ECHO: u8 = 1;
    /// Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858).
    pub const SGA: u8 = 3;
    /// End of Record [RFC885](https://tools.ietf.org/html/rfc885).
    pub const EOR: u8 = 25;
    /// Generic Mud Communication Protocol
    /// [GMCP](https://www.gammon.com.au/gmcp).
    pub const GMCP: u8 = 201;
}
