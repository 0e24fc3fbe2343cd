use rand::rngs::OsRng;
use rand::RngCore;

/// Challenge bytes of the original deployment: `byte[i] = 2 * (24 + i)`.
pub(crate) const FIXED_CHALLENGE: [u8; 8] = [0x30, 0x32, 0x34, 0x36, 0x38, 0x3a, 0x3c, 0x3e];

/// Where the 8-byte server challenge of a Type 2 message comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChallengeSource {
    /// The fixed, position-derived pattern `30 32 34 36 38 3a 3c 3e`.
    ///
    /// Predictable on purpose: the Type 3 response is never verified against
    /// the issued challenge, so an unpredictable nonce buys nothing here and
    /// the fixed pattern keeps challenge emission deterministic.
    #[default]
    Fixed,
    /// 8 fresh bytes from the operating system RNG per challenge.
    Random,
}

impl ChallengeSource {
    pub fn next(&self) -> [u8; 8] {
        match self {
            Self::Fixed => FIXED_CHALLENGE,
            Self::Random => {
                let mut challenge = [0u8; 8];
                OsRng.fill_bytes(&mut challenge);
                challenge
            }
        }
    }
}

/// Startup configuration for [`crate::NtlmFilter`].
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub challenge_source: ChallengeSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_is_deterministic() {
        let source = ChallengeSource::Fixed;
        assert_eq!(source.next(), FIXED_CHALLENGE);
        assert_eq!(source.next(), source.next());
    }

    #[test]
    fn fixed_pattern_is_position_derived() {
        for (i, byte) in FIXED_CHALLENGE.iter().enumerate() {
            assert_eq!(*byte as usize, 2 * (24 + i));
        }
    }
}
