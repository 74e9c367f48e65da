//! UI context for detecting interactive vs CI environments

use std::io::IsTerminal;

/// UI context that determines output behavior
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether running in an interactive terminal
    interactive: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
        }
    }

    /// Create a non-interactive context (for testing or explicit CI mode)
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    /// Check if we should use fancy output (symbols, dimmed keys)
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }

    /// Detect if running in an interactive environment
    fn detect_interactive() -> bool {
        // All UI output goes to stderr; stdout is often piped to a parser
        Self::interactive_for(std::io::stderr().is_terminal(), |var| {
            std::env::var_os(var).is_some()
        })
    }

    fn interactive_for(stderr_is_terminal: bool, env_set: impl Fn(&str) -> bool) -> bool {
        if !stderr_is_terminal {
            return false;
        }

        // Common CI environment indicators
        let ci_vars = [
            "CI",
            "GITHUB_ACTIONS",
            "GITLAB_CI",
            "CIRCLECI",
            "TRAVIS",
            "JENKINS_URL",
            "BUILDKITE",
            "TEAMCITY_VERSION",
            "TF_BUILD",
            "BUILDBOT_WORKER",
        ];

        !ci_vars.iter().any(|var| env_set(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.use_fancy_output());
    }

    #[test]
    fn piped_stderr_is_never_interactive() {
        assert!(!UiContext::interactive_for(false, |_| false));
    }

    #[test]
    fn terminal_stderr_is_interactive_outside_ci() {
        assert!(UiContext::interactive_for(true, |_| false));
        assert!(!UiContext::interactive_for(true, |var| var == "CI"));
        assert!(!UiContext::interactive_for(true, |var| var == "TEAMCITY_VERSION"));
    }
}
