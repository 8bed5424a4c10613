//! Bridge configuration.

/// Shape of the diagnostic value the bridge writes for its own errors.
///
/// Exceptions raised by callees are always forwarded unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionStyle {
    /// A string such as `"TypeError: x is not a function"`
    #[default]
    String,
    /// A host-native object with `name` and `message` properties
    ErrorObject,
}

/// Configuration for a [`Bridge`](crate::Bridge).
///
/// # Example
///
/// ```
/// use var_bridge::{BridgeConfig, ExceptionStyle};
///
/// let config = BridgeConfig {
///     heap_budget: Some(64 * 1024),
///     ..BridgeConfig::default()
/// };
/// assert_eq!(config.exception_style, ExceptionStyle::String);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Live bytes allowed for strings and value arrays; `None` is unbounded
    pub heap_budget: Option<usize>,
    /// Longest string accepted by `var_from_utf8`
    pub max_string_len: usize,
    /// Diagnostic shape for bridge-detected errors
    pub exception_style: ExceptionStyle,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            heap_budget: None,
            // string lengths cross the boundary as u32
            max_string_len: u32::MAX as usize,
            exception_style: ExceptionStyle::String,
        }
    }
}

impl BridgeConfig {
    /// Sets the heap budget.
    pub fn with_heap_budget(mut self, budget: usize) -> Self {
        self.heap_budget = Some(budget);
        self
    }

    /// Sets the maximum string length.
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Sets the exception style.
    pub fn with_exception_style(mut self, style: ExceptionStyle) -> Self {
        self.exception_style = style;
        self
    }
}
