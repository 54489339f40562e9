//! Custom test assertions

use toolgate_rs::core::client::ErrorType;
use toolgate_rs::core::health::{CheckPath, DualCheckResult, OverallStatus};

/// Assertions for DualCheckResult
pub trait DualResultAssertions {
    fn assert_status(&self, expected: OverallStatus);

    /// Assert exactly these paths are available, in any order
    fn assert_paths(&self, expected: &[CheckPath]);

    fn assert_protocol_error(&self, expected: ErrorType);

    fn assert_endpoint_error(&self, expected: ErrorType);
}

impl DualResultAssertions for DualCheckResult {
    fn assert_status(&self, expected: OverallStatus) {
        assert_eq!(
            self.overall_status, expected,
            "server '{}' scored {:.3}: {:?}",
            self.server_name, self.health_score, self
        );
    }

    fn assert_paths(&self, expected: &[CheckPath]) {
        let mut actual = self.available_paths.clone();
        actual.sort();
        let mut expected = expected.to_vec();
        expected.sort();
        assert_eq!(actual, expected, "available paths of '{}'", self.server_name);
    }

    fn assert_protocol_error(&self, expected: ErrorType) {
        let protocol = self
            .protocol
            .as_ref()
            .unwrap_or_else(|| panic!("'{}' has no protocol result", self.server_name));
        assert_eq!(protocol.error_type(), Some(expected), "{:?}", protocol);
    }

    fn assert_endpoint_error(&self, expected: ErrorType) {
        let endpoint = self
            .endpoint
            .as_ref()
            .unwrap_or_else(|| panic!("'{}' has no endpoint result", self.server_name));
        assert_eq!(endpoint.error_type(), Some(expected), "{:?}", endpoint);
    }
}

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        assert_approx_eq!($left, $right, 1e-6_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`",
            left_val,
            right_val,
            diff
        );
    };
}
