//! CLI Exit Code Registry
//!
//! Every exit status `mbgolden` can return is defined here. CI jobs branch on
//! them, so a code never changes meaning once released.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Every case passed                                         |
//! | 1    | Events differ from the expected fixture                   |
//! | 2    | Usage error (bad args, unreadable or invalid suite file)  |
//! | 3    | Fixture error (missing, unreadable, undecodable, unwritable) |
//! | 4    | Fetch error (stub, transport or payload fault)            |
//!
//! When cases fail at different stages the most severe code wins:
//! fixture (3) over fetch (4) over mismatch (1).

use mbgolden_harness::CaseStage;

/// Every case passed.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - stdout closed, report could not be encoded.
/// Shares its value with [`EXIT_MISMATCH`]; both mean "not a pass."
pub const EXIT_ERROR: u8 = 1;

/// Produced events differ from the expected fixture.
/// Like `diff(1)`, exit 1 means "outputs differ."
pub const EXIT_MISMATCH: u8 = 1;

/// Bad arguments, or a suite manifest that cannot be read or validated.
pub const EXIT_USAGE: u8 = 2;

/// A raw or expected fixture could not be loaded, decoded or written.
pub const EXIT_FIXTURE: u8 = 3;

/// The collection cycle reported errors, or the stub could not start.
pub const EXIT_FETCH: u8 = 4;

/// Map the stage a case failed at to its exit code.
pub fn stage_exit_code(stage: CaseStage) -> u8 {
    match stage {
        CaseStage::LoadRaw | CaseStage::Regenerate | CaseStage::LoadExpected => EXIT_FIXTURE,
        CaseStage::Serve | CaseStage::Fetch => EXIT_FETCH,
        CaseStage::Compare => EXIT_MISMATCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        // EXIT_ERROR deliberately aliases EXIT_MISMATCH
        let codes = [EXIT_SUCCESS, EXIT_MISMATCH, EXIT_USAGE, EXIT_FIXTURE, EXIT_FETCH];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn stage_mapping() {
        assert_eq!(stage_exit_code(CaseStage::LoadRaw), EXIT_FIXTURE);
        assert_eq!(stage_exit_code(CaseStage::LoadExpected), EXIT_FIXTURE);
        assert_eq!(stage_exit_code(CaseStage::Regenerate), EXIT_FIXTURE);
        assert_eq!(stage_exit_code(CaseStage::Fetch), EXIT_FETCH);
        assert_eq!(stage_exit_code(CaseStage::Serve), EXIT_FETCH);
        assert_eq!(stage_exit_code(CaseStage::Compare), EXIT_MISMATCH);
    }
}
