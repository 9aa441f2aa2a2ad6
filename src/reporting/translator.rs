//! Local status to remote verdict translation

use crate::models::{LocalStatus, Verdict};

/// Translate a local execution status into a TestRail verdict
pub fn translate(status: LocalStatus) -> Verdict {
    match status {
        LocalStatus::Success => Verdict::Passed,
        LocalStatus::Failure => Verdict::Failed,
        LocalStatus::Other => Verdict::Retest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(translate(LocalStatus::Success), Verdict::Passed);
        assert_eq!(translate(LocalStatus::Failure), Verdict::Failed);
        assert_eq!(translate(LocalStatus::Other), Verdict::Retest);
    }

    #[test]
    fn test_translate_is_stable() {
        for status in [LocalStatus::Success, LocalStatus::Failure, LocalStatus::Other] {
            assert_eq!(translate(status), translate(status));
        }
    }
}
