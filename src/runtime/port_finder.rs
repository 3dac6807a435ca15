//! Port selection snippet embedded into start commands
//!
//! Probes each preferred port with a bash `/dev/tcp` connection and takes the
//! first one that refuses. If all are taken it draws random ports from the
//! fallback range until one is free. The result is exported as `PORT`.
//!
//! There is a window between the probe and the application binding the port;
//! two starts racing on one host can pick the same fallback port.

use crate::command::Step;
use crate::config::{ScriptSettings, MAX_FALLBACK_SPAN};
use tracing::warn;

/// Name of the shell variable the snippet exports
pub const PORT_VAR: &str = "PORT";

/// Renders the snippet, or `None` when there is nothing to probe
pub fn port_finder_snippet(preferred_ports: &[u16], settings: &ScriptSettings) -> Option<String> {
    if preferred_ports.is_empty() {
        return None;
    }

    let ports = preferred_ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let (min, span) = fallback_range(settings);

    Some(format!(
        r#"port_in_use() {{
  (echo > /dev/tcp/127.0.0.1/"$1") >/dev/null 2>&1
}}
{var}=""
for candidate in {ports}; do
  if ! port_in_use "$candidate"; then
    {var}="$candidate"
    break
  fi
done
if [ -z "${var}" ]; then
  while true; do
    candidate=$(( RANDOM % {span} + {min} ))
    if ! port_in_use "$candidate"; then
      {var}="$candidate"
      break
    fi
  done
fi
export {var}
echo "Selected port: ${var}"
"#,
        var = PORT_VAR,
        ports = ports,
        span = span,
        min = min,
    ))
}

/// `(min, span)` of the random fallback, or the default range when the
/// configured one is empty, inverted or wider than `$RANDOM` reaches
fn fallback_range(settings: &ScriptSettings) -> (u16, u32) {
    let span = settings
        .fallback_port_max
        .checked_sub(settings.fallback_port_min)
        .map(u32::from)
        .filter(|span| (1..=MAX_FALLBACK_SPAN).contains(span));

    match span {
        Some(span) => (settings.fallback_port_min, span),
        None => {
            warn!(
                min = settings.fallback_port_min,
                max = settings.fallback_port_max,
                "Unusable fallback port range, using the default range"
            );
            let defaults = ScriptSettings::default();
            (
                defaults.fallback_port_min,
                u32::from(defaults.fallback_port_max - defaults.fallback_port_min),
            )
        }
    }
}

/// The snippet as a script step
pub fn port_finder_step(preferred_ports: &[u16], settings: &ScriptSettings) -> Option<Step> {
    port_finder_snippet(preferred_ports, settings).map(Step::Snippet)
}
