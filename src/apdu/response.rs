//! Captured APDU exchange log
//!
//! A log written by the NFC test device looks like:
//!
//! ```text
//! Filetype: APDU Runner Response
//! Version: 1
//! Response:
//! In: 00A404000E325041592E5359532E444446303100
//! Out: 6F2C840E325041592E5359532E4444463031A51ABF0C...9000
//! ```
//!
//! Header lines up to the `Response:` marker are skipped. Every `In: ` line
//! is a command sent and every `Out: ` line a response received.

/// Which side of the exchange a value was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Commands sent to the card (`I[n]`)
    Input,
    /// Responses received from the card (`O[n]`)
    Output,
}

impl Direction {
    /// Map the template selector letter (`I` or `O`)
    pub fn from_selector(selector: char) -> Option<Self> {
        match selector {
            'I' => Some(Direction::Input),
            'O' => Some(Direction::Output),
            _ => None,
        }
    }

    pub fn selector(&self) -> char {
        match self {
            Direction::Input => 'I',
            Direction::Output => 'O',
        }
    }
}

/// Commands and responses of one captured session, as hex strings
///
/// The two sequences are indexed independently; the Nth `In:` line
/// normally pairs with the Nth `Out:` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseLog {
    /// Commands sent (`In:` lines)
    pub inputs: Vec<String>,
    /// Responses received (`Out:` lines)
    pub outputs: Vec<String>,
}

impl ResponseLog {
    const MARKER: &'static str = "Response:";
    const INPUT_PREFIX: &'static str = "In: ";
    const OUTPUT_PREFIX: &'static str = "Out: ";

    /// Parse the text of a captured log
    ///
    /// A log without the `Response:` marker yields empty sequences.
    pub fn parse(text: &str) -> Self {
        let mut log = Self::default();
        let mut lines = text.lines().map(str::trim_end);

        // Skip file header
        if !lines.by_ref().any(|line| line == Self::MARKER) {
            return log;
        }

        for line in lines {
            if let Some(hex) = line.strip_prefix(Self::INPUT_PREFIX) {
                log.inputs.push(hex.to_string());
            } else if let Some(hex) = line.strip_prefix(Self::OUTPUT_PREFIX) {
                log.outputs.push(hex.to_string());
            }
        }

        log
    }

    /// The sequence for one side of the exchange
    pub fn entries(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    /// Number of command/response pairs (the shorter of the two sequences)
    pub fn len(&self) -> usize {
        self.inputs.len().min(self.outputs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}
