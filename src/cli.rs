use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    script: Option<String>,
    steps: Option<u32>,
    dt: Option<f32>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --script/--steps/--dt with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "script" => {
                    overrides.script = Some(value);
                }
                "steps" => {
                    overrides.steps =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid steps '{value}'"))?);
                }
                "dt" => {
                    let dt = value.parse::<f32>().with_context(|| format!("Invalid dt '{value}'"))?;
                    if !(dt > 0.0) {
                        bail!("Invalid dt '{value}'. Must be positive.");
                    }
                    overrides.dt = Some(dt);
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: --script, --steps, --dt."),
            }
        }
        Ok(overrides)
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides { script: self.script, steps: self.steps, dt: self.dt }
    }

    #[cfg(test)]
    pub fn as_tuple(&self) -> (Option<&str>, Option<u32>, Option<f32>) {
        (self.script.as_deref(), self.steps, self.dt)
    }
}
