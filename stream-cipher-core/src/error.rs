use core::fmt;

/// Error taxonomy shared by every subsystem in the workspace (spec §7).
///
/// Every fallible operation in this workspace returns one of these
/// variants; none are swallowed internally. On any of the `*Failed` /
/// `*Mismatch` variants the emitting subsystem has already zeroized its
/// secret state before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// Size mismatch, empty passphrase, malformed curve point, or another
    /// argument rejected before any state change took place.
    InvalidArgument,
    /// An engine, session or mux was used before its `init`/constructor
    /// finished successfully.
    NotInitialised,
    /// An input or output buffer was smaller than the declared length.
    BufferTooShort,
    /// A J-PAKE zero-knowledge proof failed to verify. Fatal for the
    /// session.
    ZkpInvalid,
    /// A J-PAKE round-3 key-confirmation MAC tag mismatched. Fatal for
    /// the session; callers should treat this as a possible MITM.
    KeyConfirmationFailed,
    /// A mux item's Encrypt-then-MAC tag mismatched on finish. Fatal for
    /// the item and the session; the caller MUST discard plaintext
    /// produced so far for that item.
    AuthenticationFailed,
    /// The soft byte-counter for a (key, nonce) pair reached its
    /// nonce-reuse-imminent threshold (~2^70 bytes, Salsa/ChaCha family).
    MaxBytesExceeded,
    /// An invalid protocol-state transition was attempted (e.g.
    /// `CreateRound2` before `ValidateRound1`). Non-recoverable for the
    /// session object, but not itself a security failure.
    StateMisuse,
    /// Declared vs. actual cipher input/output length differed on
    /// finish. Fatal for the session.
    LengthMismatch,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CoreError::InvalidArgument => "invalid argument",
            CoreError::NotInitialised => "engine used before initialisation",
            CoreError::BufferTooShort => "buffer shorter than declared length",
            CoreError::ZkpInvalid => "zero-knowledge proof verification failed",
            CoreError::KeyConfirmationFailed => "key confirmation tag mismatch",
            CoreError::AuthenticationFailed => "encrypt-then-mac tag mismatch",
            CoreError::MaxBytesExceeded => "nonce reuse imminent: byte counter exceeded",
            CoreError::StateMisuse => "invalid protocol state transition",
            CoreError::LengthMismatch => "declared and actual lengths differ",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
