//! Exit code constants for the deckexplain CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `INVALID_INPUT` | Deck unreadable or contains no usable text |
//! | 4 | `TOPIC_RESOLUTION` | Presentation topic could not be resolved |
//! | 5 | `NOT_FOUND` | Status lookup found no matching upload |
//! | 70 | `LLM_FAILURE` | LLM backend failed outside topic resolution |

/// Process exit code.
///
/// The numeric values are part of the CLI contract and will not change in
/// 1.x releases.
///
/// ```rust
/// use deckexplain_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(4), ExitCode::TOPIC_RESOLUTION);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    pub const INTERNAL: ExitCode = ExitCode(1);

    pub const CLI_ARGS: ExitCode = ExitCode(2);

    pub const INVALID_INPUT: ExitCode = ExitCode(3);

    pub const TOPIC_RESOLUTION: ExitCode = ExitCode(4);

    pub const NOT_FOUND: ExitCode = ExitCode(5);

    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    /// Numeric value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
