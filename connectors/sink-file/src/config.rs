use serde::Deserialize;

/// File sink config from pipeline YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Indent the written JSON.
    #[serde(default)]
    pub pretty: bool,
}

pub const SAMPLE_CONFIG: &str = "pretty: false\n";
