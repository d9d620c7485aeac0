//! Scripted input for headless simulation runs.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct SimScript {
    #[serde(default = "default_start")]
    pub start: [f32; 3],
    #[serde(default = "default_floor_half_extent")]
    pub floor_half_extent: f32,
    #[serde(default = "default_half_height")]
    pub half_height: f32,
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ScriptStep {
    pub ticks: u32,
    #[serde(default, rename = "move")]
    pub move_axis: [f32; 2],
    #[serde(default)]
    pub run: bool,
    #[serde(default)]
    pub jump: bool,
}

fn default_start() -> [f32; 3] {
    [0.0, default_half_height(), 0.0]
}

fn default_floor_half_extent() -> f32 {
    50.0
}

fn default_half_height() -> f32 {
    0.9
}

impl Default for SimScript {
    fn default() -> Self {
        Self {
            start: default_start(),
            floor_half_extent: default_floor_half_extent(),
            half_height: default_half_height(),
            steps: Vec::new(),
        }
    }
}

impl SimScript {
    pub fn parse_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    /// Idle for `ticks` when no script is given.
    pub fn idle(ticks: u32) -> Self {
        Self {
            steps: vec![ScriptStep {
                ticks,
                move_axis: [0.0, 0.0],
                run: false,
                jump: false,
            }],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.start.iter().all(|v| v.is_finite()) {
            errors.push("start must be finite".to_string());
        }
        if !self.floor_half_extent.is_finite() || self.floor_half_extent <= 0.0 {
            errors.push("floor_half_extent must be > 0".to_string());
        }
        if !self.half_height.is_finite() || self.half_height <= 0.0 {
            errors.push("half_height must be > 0".to_string());
        }
        for (index, step) in self.steps.iter().enumerate() {
            if !step.move_axis.iter().all(|v| v.is_finite() && v.abs() <= 1.0) {
                errors.push(format!("step {} move must be within [-1, 1]", index));
            }
        }
        errors
    }

    pub fn total_ticks(&self) -> u32 {
        self.steps.iter().map(|step| step.ticks).sum()
    }

    /// Expands steps into one entry per tick.
    pub fn ticks(&self) -> impl Iterator<Item = ScriptStep> + '_ {
        self.steps
            .iter()
            .flat_map(|step| std::iter::repeat(*step).take(step.ticks as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_with_defaults() {
        let script = SimScript::parse_toml(
            r#"
            start = [0.0, 3.0, 0.0]

            [[step]]
            ticks = 10
            move = [0.0, 1.0]

            [[step]]
            ticks = 5
            jump = true
            "#,
        )
        .expect("parse");
        assert_eq!(script.start, [0.0, 3.0, 0.0]);
        assert_eq!(script.floor_half_extent, 50.0);
        assert_eq!(script.steps.len(), 2);
        assert_eq!(script.total_ticks(), 15);
        assert!(script.steps[1].jump);
        assert_eq!(script.steps[1].move_axis, [0.0, 0.0]);
        assert!(script.validate().is_empty());
    }

    #[test]
    fn expands_ticks_in_order() {
        let script = SimScript::parse_toml(
            r#"
            [[step]]
            ticks = 2
            run = true
            [[step]]
            ticks = 1
            "#,
        )
        .expect("parse");
        let runs: Vec<bool> = script.ticks().map(|step| step.run).collect();
        assert_eq!(runs, vec![true, true, false]);
    }

    #[test]
    fn rejects_out_of_range_axis() {
        let script = SimScript::parse_toml(
            r#"
            [[step]]
            ticks = 1
            move = [2.0, 0.0]
            "#,
        )
        .expect("parse");
        assert_eq!(script.validate().len(), 1);
    }
}
