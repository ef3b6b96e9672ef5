//! Prompt construction helpers.
//!
//! Every instruction sent to Gemini is rendered from a fixed `minijinja`
//! template and the caller's parameters, so the builders stay pure functions
//! of their inputs and optional parameters are never silently dropped.

use minijinja::Environment;
use serde::Serialize;

/// Renders a prompt from a template string and a serializable context.
///
/// This is the underlying function for the `prompt!` macro.
pub fn render_prompt<T: Serialize>(template: &str, context: T) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("prompt", template)?;
    let tmpl = env.get_template("prompt")?;
    tmpl.render(context)
}

/// Creates a prompt string from a template and key-value pairs.
///
/// Provides a `println!`-like experience for building prompts, backed by
/// `minijinja` so templates can use conditionals for optional parameters.
///
/// # Example
///
/// ```
/// use led_scout::prompt;
///
/// let p = prompt!(
///     "Scout {{ url }} for {{ goal }}.",
///     url = "https://asset.led.go.th",
///     goal = "auction lots",
/// )
/// .unwrap();
///
/// assert_eq!(p, "Scout https://asset.led.go.th for auction lots.");
/// ```
#[macro_export]
macro_rules! prompt {
    ($template:expr, $($key:ident = $value:expr),* $(,)?) => {
        $crate::prompt::render_prompt($template, minijinja::context!($($key => $value),*))
    };
}
