//! # Covert Channel Codec
//!
//! Encodes text into a bit sequence smuggled through voltage
//! micro-fluctuations in periodic meter reports, and re-derives the text on
//! the receiving side.
//!
//! Bits are MSB-first, eight per byte of the message. On the sender a `1`
//! bit nudges the reported voltage up by a small delta; a `0` leaves the
//! base value untouched. The receiver classifies each reported voltage
//! against a midpoint threshold, accumulates the recovered bits, and
//! regroups them into bytes; a trailing group of fewer than eight bits
//! stays invisible until completed.

/// Sender-side line parameters.
#[derive(Debug, Clone, Copy)]
pub struct VoltageChannel {
    /// Nominal line voltage reported for a `0` bit.
    pub base_volts: f64,
    /// Upward nudge applied for a `1` bit.
    pub delta_volts: f64,
}

impl Default for VoltageChannel {
    fn default() -> Self {
        Self {
            base_volts: 220.0,
            delta_volts: 0.5,
        }
    }
}

impl VoltageChannel {
    /// Receiver threshold: the midpoint between the two symbol levels.
    pub fn threshold(&self) -> f64 {
        self.base_volts + self.delta_volts / 2.0
    }
}

/// Encode text as MSB-first bits, eight per byte.
pub fn encode_bits(text: &str) -> Vec<bool> {
    let mut bits = Vec::with_capacity(text.len() * 8);
    for byte in text.bytes() {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1 == 1);
        }
    }
    bits
}

/// The reported voltage carrying one bit.
pub fn voltage_for_bit(bit: bool, channel: &VoltageChannel) -> f64 {
    if bit {
        channel.base_volts + channel.delta_volts
    } else {
        channel.base_volts
    }
}

/// Receiver-side accumulator. Bits only ever grow; the decoded text is
/// re-derived from the full sequence on each push, so a re-read always
/// agrees with the bits seen so far.
#[derive(Debug, Default)]
pub struct BitDecoder {
    bits: Vec<bool>,
}

impl BitDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a reported voltage against the channel threshold and
    /// accumulate the recovered bit. Returns the bit.
    pub fn push_voltage(&mut self, volts: f64, channel: &VoltageChannel) -> bool {
        let bit = volts > channel.threshold();
        self.push(bit);
        bit
    }

    /// Accumulate one already-classified bit.
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Bits accumulated so far.
    pub fn bit_count(&self) -> usize {
        self.bits.len()
    }

    /// The text recovered so far. Complete 8-bit groups only; a partial
    /// trailing group contributes nothing until its eighth bit arrives.
    pub fn decoded_text(&self) -> String {
        self.bits
            .chunks_exact(8)
            .map(|group| {
                let byte = group
                    .iter()
                    .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit));
                char::from(byte)
            })
            .collect()
    }
}
