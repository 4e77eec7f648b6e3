//! Discovery configuration.

/// How the default display name of a test case is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodDisplay {
    /// `Namespace.Class.Method`
    #[default]
    ClassAndMethod,
    /// `Method`
    Method,
}

/// Rewrites applied to the default display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodDisplayOptions {
    pub replace_underscore_with_space: bool,
    pub replace_period_with_comma: bool,
}

impl MethodDisplayOptions {
    pub fn apply(&self, name: &str) -> String {
        let mut name = name.to_string();
        if self.replace_underscore_with_space {
            name = name.replace('_', " ");
        }
        if self.replace_period_with_comma {
            name = name.replace('.', ", ");
        }
        name
    }
}

/// Options for one discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Expand theories at discovery time when their data allows it.
    pub pre_enumerate_theories: bool,
    pub method_display: MethodDisplay,
    pub method_display_options: MethodDisplayOptions,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            pre_enumerate_theories: true,
            method_display: MethodDisplay::ClassAndMethod,
            method_display_options: MethodDisplayOptions::default(),
        }
    }
}

impl DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre_enumerate_theories(mut self, enabled: bool) -> Self {
        self.pre_enumerate_theories = enabled;
        self
    }

    pub fn with_method_display(mut self, display: MethodDisplay) -> Self {
        self.method_display = display;
        self
    }

    pub fn with_method_display_options(mut self, options: MethodDisplayOptions) -> Self {
        self.method_display_options = options;
        self
    }
}
