//! Outbound controller commands and the operator forms that produce them.
//!
//! Every numeric field travels as the operator typed it (leading and trailing
//! whitespace removed). Nothing here parses or rounds operator input.

use std::fmt;

use crate::error::{DashboardError, Result};

pub const VERB_PID_TUNE: &str = "pid_tune";
pub const VERB_FAN_TUNE: &str = "fan_tune";
pub const VERB_GET_STATUS: &str = "get_status";

// ─────────────────────────────────────────────────────────────────────────────
// Control mode
// ─────────────────────────────────────────────────────────────────────────────

/// Control law the gain form is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Full PID on the heater.
    #[default]
    Heating,
    /// PI on the fan; has no derivative term.
    Cooling,
}

impl ControlMode {
    pub const ALL: [ControlMode; 2] = [ControlMode::Heating, ControlMode::Cooling];

    pub const fn token(self) -> &'static str {
        match self {
            ControlMode::Heating => "heat",
            ControlMode::Cooling => "cool",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.token() == token)
    }

    #[inline]
    pub const fn supports_derivative(self) -> bool {
        matches!(self, ControlMode::Heating)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ControlMode::Heating => "Heating (PID)",
            ControlMode::Cooling => "Cooling (PI)",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command
// ─────────────────────────────────────────────────────────────────────────────

/// One outbound text command: `<verb> [<subcommand>] <args...>`.
///
/// ```
/// # use chamberscope::data::commands::Command;
/// let cmd = Command::parse("pid_tune heat -p 1.0").unwrap();
/// assert_eq!(cmd.subcommand.as_deref(), Some("heat"));
/// assert_eq!(cmd.to_string(), "pid_tune heat -p 1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: String,
    pub subcommand: Option<String>,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            subcommand: None,
            args: Vec::new(),
        }
    }

    pub fn with_subcommand(mut self, sub: impl Into<String>) -> Self {
        self.subcommand = Some(sub.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `flag value`.
    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// True when the command carries no arguments (a query).
    pub fn is_query(&self) -> bool {
        self.args.is_empty()
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Split a command line on whitespace. The second token is a subcommand
    /// unless it is a flag.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| DashboardError::Command("empty command".into()))?;
        let mut cmd = Command::new(verb);
        let mut rest = tokens.peekable();
        if let Some(next) = rest.peek() {
            if !next.starts_with('-') {
                cmd.subcommand = rest.next().map(str::to_string);
            }
        }
        cmd.args = rest.map(str::to_string).collect();
        Ok(cmd)
    }

    pub fn status_query() -> Self {
        Command::new(VERB_GET_STATUS)
    }

    pub fn feedforward_query() -> Self {
        Command::new(VERB_PID_TUNE).arg("-ff")
    }

    pub fn fan_query() -> Self {
        Command::new(VERB_FAN_TUNE)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        if let Some(sub) = &self.subcommand {
            write!(f, " {sub}")?;
        }
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

/// One operator input field after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry<'a> {
    Empty,
    Value(&'a str),
    /// Whitespace inside the value; would split into several tokens.
    Invalid,
}

impl<'a> Entry<'a> {
    fn read(input: &'a str) -> Self {
        let t = input.trim();
        if t.is_empty() {
            Entry::Empty
        } else if t.contains(char::is_whitespace) {
            Entry::Invalid
        } else {
            Entry::Value(t)
        }
    }

    fn value(self) -> Option<&'a str> {
        match self {
            Entry::Value(v) => Some(v),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forms
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetpointForm {
    pub target: String,
}

impl SetpointForm {
    /// `pid_tune -t <target>`, or nothing when the field is empty.
    pub fn encode(&self) -> Option<Command> {
        Entry::read(&self.target)
            .value()
            .map(|t| Command::new(VERB_PID_TUNE).flag("-t", t))
    }

    pub fn prefill(&mut self, target: f64) {
        self.target = format!("{target:.1}");
    }
}

/// Gain terms for one control mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GainForm {
    mode: ControlMode,
    pub kp: String,
    pub ki: String,
    pub kd: String,
}

impl GainForm {
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Switch mode. Entering a mode without a derivative clears `kd`.
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
        if !mode.supports_derivative() {
            self.kd.clear();
        }
    }

    /// Whether the derivative input should accept text.
    pub fn derivative_enabled(&self) -> bool {
        self.mode.supports_derivative()
    }

    /// One batched command with every populated term, or nothing if none is
    /// or any term is invalid. `-d` is never emitted for a mode without a
    /// derivative term.
    pub fn encode(&self) -> Option<Command> {
        let mut fields = vec![("-p", &self.kp), ("-i", &self.ki)];
        if self.mode.supports_derivative() {
            fields.push(("-d", &self.kd));
        }
        let mut terms: Vec<(&str, &str)> = Vec::with_capacity(3);
        for (flag, text) in fields {
            match Entry::read(text) {
                Entry::Empty => {}
                Entry::Value(v) => terms.push((flag, v)),
                Entry::Invalid => return None,
            }
        }
        if terms.is_empty() {
            return None;
        }
        let cmd = Command::new(VERB_PID_TUNE).with_subcommand(self.mode.token());
        Some(terms.into_iter().fold(cmd, |c, (f, v)| c.flag(f, v)))
    }

    pub fn prefill(&mut self, kp: Option<f64>, ki: Option<f64>, kd: Option<f64>) {
        if let Some(v) = kp {
            self.kp = format!("{v:.6}");
        }
        if let Some(v) = ki {
            self.ki = format!("{v:.6}");
        }
        if let Some(v) = kd.filter(|_| self.mode.supports_derivative()) {
            self.kd = format!("{v:.6}");
        }
    }
}

/// One editable row of the feed-forward table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedforwardRow {
    pub index: usize,
    pub input: String,
    pub output: String,
}

impl FeedforwardRow {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// `pid_tune -ff_set <index> <input> <output>` when both values are filled.
    pub fn encode(&self) -> Option<Command> {
        let input = Entry::read(&self.input).value()?;
        let output = Entry::read(&self.output).value()?;
        Some(
            Command::new(VERB_PID_TUNE)
                .arg("-ff_set")
                .arg(self.index.to_string())
                .arg(input)
                .arg(output),
        )
    }
}

/// Independently applied groups of auxiliary parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxGroup {
    Hysteresis,
    Bias,
    FanCurve,
    Smoothing,
}

impl AuxGroup {
    pub const ALL: [AuxGroup; 4] = [
        AuxGroup::Hysteresis,
        AuxGroup::Bias,
        AuxGroup::FanCurve,
        AuxGroup::Smoothing,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AuxGroup::Hysteresis => "Hysteresis",
            AuxGroup::Bias => "Bias",
            AuxGroup::FanCurve => "Fan curve",
            AuxGroup::Smoothing => "Smoothing",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryForm {
    pub hysteresis: String,
    pub warm_bias: String,
    pub heat_bias: String,
    pub fan_min: String,
    pub fan_max: String,
    pub alpha: String,
}

impl AuxiliaryForm {
    fn group_fields(&self, group: AuxGroup) -> Vec<(&'static str, &str)> {
        match group {
            AuxGroup::Hysteresis => vec![("-hys", self.hysteresis.as_str())],
            AuxGroup::Bias => vec![
                ("-warmbias", self.warm_bias.as_str()),
                ("-heatbias", self.heat_bias.as_str()),
            ],
            AuxGroup::FanCurve => vec![
                ("-min", self.fan_min.as_str()),
                ("-max", self.fan_max.as_str()),
            ],
            AuxGroup::Smoothing => vec![("-alpha", self.alpha.as_str())],
        }
    }

    fn build<'a, I>(fields: I) -> Option<Command>
    where
        I: IntoIterator<Item = (&'static str, &'a str)>,
    {
        let mut cmd = Command::fan_query();
        for (flag, text) in fields {
            match Entry::read(text) {
                Entry::Empty => {}
                Entry::Value(v) => cmd = cmd.flag(flag, v),
                Entry::Invalid => return None,
            }
        }
        Some(cmd)
    }

    /// Apply one group. Empty fields degrade to the `fan_tune` query; an
    /// invalid field sends nothing.
    pub fn encode_group(&self, group: AuxGroup) -> Option<Command> {
        Self::build(self.group_fields(group))
    }

    /// Apply every populated field at once, or query when none is.
    pub fn encode_all(&self) -> Option<Command> {
        Self::build(
            AuxGroup::ALL
                .into_iter()
                .flat_map(|g| self.group_fields(g)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_trims_and_skips_empty() {
        let mut f = SetpointForm::default();
        assert_eq!(f.encode(), None);
        f.target = "   ".into();
        assert_eq!(f.encode(), None);
        f.target = " 42.50 ".into();
        assert_eq!(f.encode().unwrap().to_string(), "pid_tune -t 42.50");
    }

    #[test]
    fn cooling_never_sends_derivative() {
        let mut g = GainForm::default();
        g.kp = "1.0".into();
        g.kd = "0.5".into();
        g.set_mode(ControlMode::Cooling);
        assert!(g.kd.is_empty());
        g.kd = "0.5".into();
        let cmd = g.encode().unwrap();
        assert_eq!(cmd.to_string(), "pid_tune cool -p 1.0");
        assert!(!cmd.has_flag("-d"));
    }

    #[test]
    fn heating_batches_all_terms() {
        let g = GainForm {
            kp: "2".into(),
            ki: "0.1".into(),
            kd: "1e-3".into(),
            ..GainForm::default()
        };
        assert_eq!(
            g.encode().unwrap().to_string(),
            "pid_tune heat -p 2 -i 0.1 -d 1e-3"
        );
        assert_eq!(GainForm::default().encode(), None);
    }

    #[test]
    fn feedforward_row_needs_both_values() {
        let mut row = FeedforwardRow::new(3);
        row.input = "30".into();
        assert_eq!(row.encode(), None);
        row.output = "0.45".into();
        assert_eq!(row.encode().unwrap().to_string(), "pid_tune -ff_set 3 30 0.45");
    }

    #[test]
    fn empty_aux_group_becomes_query() {
        let f = AuxiliaryForm::default();
        for g in AuxGroup::ALL {
            assert_eq!(f.encode_group(g).unwrap().to_string(), "fan_tune");
        }
        assert!(f.encode_all().unwrap().is_query());
    }

    #[test]
    fn aux_group_only_sends_its_fields() {
        let f = AuxiliaryForm {
            hysteresis: "0.5".into(),
            fan_max: "0.9".into(),
            ..AuxiliaryForm::default()
        };
        assert_eq!(
            f.encode_group(AuxGroup::Hysteresis).unwrap().to_string(),
            "fan_tune -hys 0.5"
        );
        assert_eq!(
            f.encode_group(AuxGroup::FanCurve).unwrap().to_string(),
            "fan_tune -max 0.9"
        );
        assert_eq!(f.encode_all().unwrap().to_string(), "fan_tune -hys 0.5 -max 0.9");
    }

    #[test]
    fn inner_whitespace_suppresses_the_command() {
        let mut g = GainForm {
            kp: "1.0 -d 0.5".into(),
            ..GainForm::default()
        };
        g.set_mode(ControlMode::Cooling);
        assert_eq!(g.encode(), None);
        g.kp = "1.0".into();
        g.ki = "0.1\t0.2".into();
        assert_eq!(g.encode(), None);

        let s = SetpointForm {
            target: "40 50".into(),
        };
        assert_eq!(s.encode(), None);

        let mut row = FeedforwardRow::new(1);
        row.input = "30".into();
        row.output = "0.4 0.5".into();
        assert_eq!(row.encode(), None);

        let f = AuxiliaryForm {
            warm_bias: "0.5 -min 0".into(),
            heat_bias: "1.0".into(),
            ..AuxiliaryForm::default()
        };
        assert_eq!(f.encode_group(AuxGroup::Bias), None);
        assert_eq!(f.encode_all(), None);
        assert!(f.encode_group(AuxGroup::Smoothing).is_some());
    }

    #[test]
    fn parse_splits_subcommand_and_flags() {
        let c = Command::parse("  pid_tune -ff_set 1 20 0.3 ").unwrap();
        assert_eq!(c.verb, "pid_tune");
        assert_eq!(c.subcommand, None);
        assert_eq!(c.args, vec!["-ff_set", "1", "20", "0.3"]);
        assert_eq!(c.flag_value("-ff_set"), Some("1"));
        assert!(Command::parse("   ").is_err());
    }

    #[test]
    fn prefill_uses_fixed_decimals() {
        let mut s = SetpointForm::default();
        s.prefill(37.26);
        assert_eq!(s.target, "37.3");
        let mut g = GainForm::default();
        g.prefill(Some(1.5), None, Some(0.25));
        assert_eq!(g.kp, "1.500000");
        assert_eq!(g.ki, "");
        assert_eq!(g.kd, "0.250000");
    }
}
