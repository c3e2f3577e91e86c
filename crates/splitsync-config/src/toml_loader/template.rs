//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# SplitSync Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[sync]
# Used only until the extension has stored a choice of its own.
# url_sync_default = true
# scroll_sync_default = true

[scroll]
# Per-window agents that settle page scroll reports before mirroring.
# debounce_ms = 50        # 10-500
# guard_ms = 150          # 20-1000

[host]
# call_timeout_ms = 5000  # 100-60000

[logging]
# level = "INFO"          # DEBUG | INFO | WARNING | ERROR
"##
    .to_string()
}
