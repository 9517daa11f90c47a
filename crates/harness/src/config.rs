/// Compile-execute harness settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Replace the caller's source with [`HarnessConfig::FIXED_TEST_SOURCE`].
    pub use_fixed_test_source: bool,
    /// Log each pipeline stage to the environment's stderr.
    pub verbose: bool,
}

impl HarnessConfig {
    pub const FIXED_TEST_SOURCE: &'static [u8] = b"int main(int argc, char** argv) { return 0; }\n";
    /// Output region the no-OS guest reserves.
    pub const DEFAULT_OUTPUT_CAPACITY: usize = 40_000;
    /// Largest region whose every `jal` target stays reachable.
    pub const MAX_OUTPUT_CAPACITY: usize = 1 << 20;

    /// Settings selected by cargo features at build time.
    pub const fn from_features() -> Self {
        Self {
            use_fixed_test_source: cfg!(feature = "fixed_test_source"),
            verbose: false,
        }
    }

    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::from_features()
    }
}
