//! Where schedule and departures pages live.

use ferry_core::RouteKey;
use url::Url;

use crate::types::{FailureKind, RenderError};

pub const DEFAULT_SCHEDULE_TEMPLATE: &str =
    "https://www.bcferries.com/routes-fares/schedules/seasonal/{from}-{to}";
pub const DEFAULT_DEPARTURES_TEMPLATE: &str =
    "https://www.bcferries.com/current-conditions/departures?terminalCode={terminal}";

/// URL templates with `{from}`, `{to}` and `{terminal}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrls {
    pub schedule_template: String,
    pub departures_template: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            schedule_template: DEFAULT_SCHEDULE_TEMPLATE.to_string(),
            departures_template: DEFAULT_DEPARTURES_TEMPLATE.to_string(),
        }
    }
}

impl SourceUrls {
    pub fn schedule_url(&self, route: &RouteKey) -> Result<Url, RenderError> {
        fill(
            &self.schedule_template,
            &[("{from}", route.from.as_str()), ("{to}", route.to.as_str())],
        )
    }

    pub fn departures_url(&self, terminal_code: &str) -> Result<Url, RenderError> {
        fill(&self.departures_template, &[("{terminal}", terminal_code)])
    }
}

fn fill(template: &str, values: &[(&str, &str)]) -> Result<Url, RenderError> {
    let filled = values
        .iter()
        .fold(template.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        });
    Url::parse(&filled)
        .map_err(|err| RenderError::new(FailureKind::InvalidUrl, format!("{filled}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_default_templates() {
        let urls = SourceUrls::default();
        assert_eq!(
            urls.schedule_url(&RouteKey::new("TSA", "PSB")).unwrap().as_str(),
            "https://www.bcferries.com/routes-fares/schedules/seasonal/TSA-PSB"
        );
        assert_eq!(
            urls.departures_url("SWB").unwrap().as_str(),
            "https://www.bcferries.com/current-conditions/departures?terminalCode=SWB"
        );
    }

    #[test]
    fn rejects_templates_that_are_not_urls() {
        let urls = SourceUrls {
            schedule_template: "seasonal/{from}-{to}".into(),
            ..SourceUrls::default()
        };
        let err = urls.schedule_url(&RouteKey::new("TSA", "PSB")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
