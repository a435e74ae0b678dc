//! Binder configuration.

/// Default request body limit, 64 KiB.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024;

/// Knobs that change how raw request values are found and split.
///
/// Built once, handed to [`Binder::with_config`](crate::Binder::with_config).
///
/// ```rust
/// use astor_bind::{BindConfig, Binder};
///
/// let binder = Binder::with_config(
///     BindConfig::default()
///         .list_separator(';')
///         .form_body(false),
/// );
/// # let _ = binder;
/// ```
#[derive(Clone, Debug)]
pub struct BindConfig {
    pub(crate) list_separator: char,
    pub(crate) form_body: bool,
    pub(crate) colon_params: bool,
    pub(crate) max_body: usize,
}

impl BindConfig {
    /// Delimiter used when binding a single value into a `Vec<T>`. Default `,`.
    pub fn list_separator(mut self, separator: char) -> Self {
        self.list_separator = separator;
        self
    }

    /// Read `application/x-www-form-urlencoded` bodies as the lowest-priority
    /// value source. Default `true`.
    pub fn form_body(mut self, enabled: bool) -> Self {
        self.form_body = enabled;
        self
    }

    /// Treat a query key written as `:name` as a path variable for `name`,
    /// ranking it above a plain `name` key. Default `true`.
    pub fn colon_params(mut self, enabled: bool) -> Self {
        self.colon_params = enabled;
        self
    }

    /// Largest request body [`HandlerService`](crate::HandlerService) buffers
    /// before answering `413 Payload Too Large`. Default 64 KiB.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self { list_separator: ',', form_body: true, colon_params: true, max_body: DEFAULT_MAX_BODY }
    }
}
