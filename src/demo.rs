//! Simulated chamber for running the dashboard without hardware.
//!
//! A crude thermal plant with a PTC heater, a fan and an ambient pull, driven
//! by a gain-scheduled PID loop plus a feed-forward table. It emits the same
//! JSON the controller does and understands the same `pid_tune`, `fan_tune`
//! and `get_status` commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::data::commands::{Command, ControlMode, VERB_FAN_TUNE, VERB_GET_STATUS, VERB_PID_TUNE};
use crate::sink::TelemetrySink;

/// Gains at a given set-point; interpolated between rows.
#[derive(Debug, Clone, Copy)]
struct GainRow {
    temperature: f64,
    kp: f64,
    ki: f64,
    kd: f64,
}

const GAIN_SCHEDULE: [GainRow; 5] = [
    GainRow { temperature: 20.0, kp: 0.05, ki: 0.010, kd: 0.005 },
    GainRow { temperature: 30.0, kp: 0.06, ki: 0.012, kd: 0.006 },
    GainRow { temperature: 40.0, kp: 0.07, ki: 0.015, kd: 0.007 },
    GainRow { temperature: 50.0, kp: 0.08, ki: 0.018, kd: 0.008 },
    GainRow { temperature: 60.0, kp: 0.09, ki: 0.020, kd: 0.009 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedforwardEntry {
    pub temperature: f64,
    pub base_speed: f64,
}

/// Linear interpolation over rows sorted by key, clamped at both ends.
fn interpolate<T, K, V>(rows: &[T], x: f64, key: K, value: V) -> f64
where
    K: Fn(&T) -> f64,
    V: Fn(&T) -> f64,
{
    let Some(first) = rows.first() else {
        return 0.0;
    };
    let lower = rows.iter().rev().find(|r| key(r) <= x);
    let upper = rows.iter().find(|r| key(r) >= x);
    match (lower, upper) {
        (None, _) => value(first),
        (Some(lo), None) => value(lo),
        (Some(lo), Some(hi)) => {
            let span = key(hi) - key(lo);
            if span == 0.0 {
                value(lo)
            } else {
                let t = (x - key(lo)) / span;
                value(lo) + t * (value(hi) - value(lo))
            }
        }
    }
}

fn scheduled_gains(target: f64) -> (f64, f64, f64) {
    (
        interpolate(&GAIN_SCHEDULE, target, |r| r.temperature, |r| r.kp),
        interpolate(&GAIN_SCHEDULE, target, |r| r.temperature, |r| r.ki),
        interpolate(&GAIN_SCHEDULE, target, |r| r.temperature, |r| r.kd),
    )
}

/// What the simulator wants to send back after a command.
#[derive(Debug, Default, PartialEq)]
pub struct Reply {
    pub console: Vec<String>,
    pub send_status: bool,
}

impl Reply {
    fn line(s: impl Into<String>) -> Self {
        Self::line_vec(vec![s.into()])
    }

    fn line_vec(console: Vec<String>) -> Self {
        Self {
            console,
            send_status: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChamberSim {
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub humidity: f64,
    pub env_temperature: f64,
    pub ptc_on: bool,
    pub btm_ptc_on: bool,
    pub control_state: &'static str,

    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub cool_kp: f64,
    pub cool_ki: f64,
    pub integral_error: f64,
    pub previous_error: f64,
    pub pid_output: f64,
    pub feedforward_speed: f64,
    pub fan_speed: f64,
    pub feedforward: Vec<FeedforwardEntry>,

    pub hysteresis_band: f64,
    pub warming_bias: f64,
    pub heating_bias: f64,
    pub fan_min: f64,
    pub fan_max: f64,
    pub fan_smooth_alpha: f64,

    elapsed: f64,
}

impl Default for ChamberSim {
    fn default() -> Self {
        let target = 37.0;
        let (kp, ki, kd) = scheduled_gains(target);
        let feedforward: Vec<_> = [20.0, 30.0, 40.0, 50.0, 60.0]
            .into_iter()
            .map(|temperature| FeedforwardEntry {
                temperature,
                base_speed: 0.10,
            })
            .collect();
        let mut sim = Self {
            current_temperature: 25.0,
            target_temperature: target,
            humidity: 50.0,
            env_temperature: 22.0,
            ptc_on: false,
            btm_ptc_on: false,
            control_state: "IDLE",
            kp,
            ki,
            kd,
            cool_kp: 0.08,
            cool_ki: 0.01,
            integral_error: 0.0,
            previous_error: 0.0,
            pid_output: 0.0,
            feedforward_speed: 0.0,
            fan_speed: 0.0,
            feedforward,
            hysteresis_band: 0.5,
            warming_bias: 10.0,
            heating_bias: 25.0,
            fan_min: 0.0,
            fan_max: 1.0,
            fan_smooth_alpha: 0.3,
            elapsed: 0.0,
        };
        sim.feedforward_speed = sim.feedforward_at(target);
        sim
    }
}

impl ChamberSim {
    fn feedforward_at(&self, target: f64) -> f64 {
        interpolate(&self.feedforward, target, |e| e.temperature, |e| e.base_speed).clamp(0.0, 1.0)
    }

    /// Advance the plant by `dt` seconds. `noise` yields values in `[0, 1)`.
    pub fn step<N: FnMut() -> f64>(&mut self, dt: f64, mut noise: N) {
        let dt = dt.max(1e-3);
        self.elapsed += dt;
        self.humidity = (self.humidity + (noise() - 0.5) * 0.05).clamp(0.0, 100.0);
        self.env_temperature += (noise() - 0.5) * 0.02;

        let error = self.target_temperature - self.current_temperature;
        if error > self.hysteresis_band {
            self.ptc_on = true;
            self.control_state = "HEATING";
        } else if error < -self.hysteresis_band {
            self.ptc_on = false;
            self.control_state = "COOLING";
        } else {
            self.control_state = "IDLE";
        }
        self.btm_ptc_on = (self.elapsed as u64) % 30 < 10;

        self.integral_error = (self.integral_error + error * dt).clamp(-200.0, 200.0);
        let derivative = (error - self.previous_error) / dt;
        let raw = if self.ptc_on {
            self.kp * error + self.ki * self.integral_error + self.kd * derivative
        } else {
            -(self.cool_kp * error + self.cool_ki * self.integral_error)
        };
        self.pid_output = raw.clamp(-0.5, 0.5);
        self.previous_error = error;

        self.feedforward_speed = self.feedforward_at(self.target_temperature);
        let (lo, hi) = (self.fan_min.min(self.fan_max), self.fan_min.max(self.fan_max));
        let wanted = (self.feedforward_speed + self.pid_output).clamp(lo, hi);
        let a = self.fan_smooth_alpha.clamp(0.0, 1.0);
        self.fan_speed = (a * wanted + (1.0 - a) * self.fan_speed).clamp(0.0, 1.0);

        let heater = if self.ptc_on { 0.12 } else { -0.05 };
        let fan = -0.15 * self.fan_speed;
        let ambient = (self.env_temperature - self.current_temperature) * 0.02;
        let jitter = (noise() - 0.5) * 0.04;
        self.current_temperature += (heater + fan + ambient + jitter) * dt;
        self.current_temperature += (error * 0.08).clamp(-0.25, 0.25) * dt;
        self.current_temperature = self.current_temperature.clamp(-10.0, 120.0);
    }

    fn heater_duty(&self) -> f64 {
        if self.ptc_on {
            self.pid_output.clamp(0.0, 1.0).max(0.2)
        } else {
            0.0
        }
    }

    /// Status object in the controller's wire format.
    pub fn status(&self) -> Value {
        let on_off = |b: bool| if b { "ON" } else { "OFF" };
        json!({
            "current_temperature": round(self.current_temperature, 2),
            "target_temperature": round(self.target_temperature, 2),
            "current_humidity": round(self.humidity, 1),
            "env_temperature": round(self.env_temperature, 2),
            "ptc_state": on_off(self.ptc_on),
            "btm_ptc_state": on_off(self.btm_ptc_on),
            "control_state": self.control_state,
            "fan_speed": round(self.fan_speed, 4),
            "fan_speed_percent": round(self.fan_speed * 100.0, 2),
            "final_pwm_duty": round(self.heater_duty(), 4),
            "feedforward_speed": round(self.feedforward_speed, 4),
            "pid_output": round(self.pid_output, 4),
            "pid_kp": round(self.kp, 6),
            "pid_ki": round(self.ki, 6),
            "pid_kd": round(self.kd, 6),
            "integral_error": round(self.integral_error, 4),
            "previous_error": round(self.previous_error, 4),
            "hysteresis_band": round(self.hysteresis_band, 4),
            "warming_bias": round(self.warming_bias, 2),
            "heating_bias": round(self.heating_bias, 2),
            "fan_min": round(self.fan_min, 4),
            "fan_max": round(self.fan_max, 4),
            "fan_smooth_alpha": round(self.fan_smooth_alpha, 4),
        })
    }

    fn feedforward_table(&self) -> Vec<String> {
        let mut lines = vec![
            "--- Feedforward Table ---".to_string(),
            "Idx | Temp (C) | Base Speed".to_string(),
        ];
        for (i, e) in self.feedforward.iter().enumerate() {
            lines.push(format!("{i:>3} | {:<8.1} | {:.4}", e.temperature, e.base_speed));
        }
        lines
    }

    fn fan_settings(&self) -> Vec<String> {
        vec![
            format!("hysteresis {:.2} C", self.hysteresis_band),
            format!("warm bias {:.2} C, heat bias {:.2} C", self.warming_bias, self.heating_bias),
            format!("fan min {:.4}, max {:.4}", self.fan_min, self.fan_max),
            format!("fan alpha {:.4}", self.fan_smooth_alpha),
        ]
    }

    /// Apply one command line.
    pub fn apply(&mut self, cmd: &Command) -> Reply {
        match cmd.verb.as_str() {
            VERB_GET_STATUS => Reply {
                console: Vec::new(),
                send_status: true,
            },
            VERB_PID_TUNE => self.pid_tune(cmd),
            VERB_FAN_TUNE => self.fan_tune(cmd),
            other => Reply::line(format!("Error: Unknown command '{other}'")),
        }
    }

    fn pid_tune(&mut self, cmd: &Command) -> Reply {
        let args = &cmd.args;
        if cmd.subcommand.is_none() && args.is_empty() {
            return Reply {
                console: vec![
                    "--- Usage ---".into(),
                    "pid_tune -t <val>".into(),
                    "pid_tune <heat|cool> -p <val> -i <val> [-d <val>]".into(),
                    "pid_tune -ff".into(),
                    "pid_tune -ff_set <idx> <temp> <spd>".into(),
                ],
                send_status: true,
            };
        }
        match args.first().map(String::as_str) {
            Some("-ff") => return Reply::line_vec(self.feedforward_table()),
            Some("-ff_set") => return self.ff_set(&args[1..]),
            _ => {}
        }

        let mode = match cmd.subcommand.as_deref() {
            None => None,
            Some(token) => match ControlMode::from_token(token) {
                Some(m) => Some(m),
                None => return Reply::line(format!("Error: Unknown mode '{token}'")),
            },
        };
        let pairs = match parse_pairs(args) {
            Ok(p) => p,
            Err(e) => return Reply::line(e),
        };

        let mut lines = Vec::new();
        for (flag, v) in pairs {
            match (flag, mode) {
                ("-t", _) => {
                    self.target_temperature = v;
                    (self.kp, self.ki, self.kd) = scheduled_gains(v);
                    lines.push("Target temperature changed. Re-scheduling PID gains...".into());
                }
                ("-p", Some(ControlMode::Cooling)) => self.cool_kp = v,
                ("-i", Some(ControlMode::Cooling)) => self.cool_ki = v,
                ("-d", Some(ControlMode::Cooling)) => {
                    return Reply::line("Error: cooling loop has no derivative term")
                }
                ("-p", _) => self.kp = v,
                ("-i", _) => self.ki = v,
                ("-d", _) => self.kd = v,
                (other, _) => return Reply::line(format!("Error: Unknown option {other}")),
            }
        }
        lines.push("Parameters updated. Current status:".into());
        Reply {
            console: lines,
            send_status: true,
        }
    }

    fn ff_set(&mut self, args: &[String]) -> Reply {
        let [idx, temp, speed] = args else {
            return Reply::line("Error: Usage pid_tune -ff_set <idx> <temp> <spd>");
        };
        let (Ok(i), Ok(t), Ok(s)) = (idx.parse::<usize>(), temp.parse::<f64>(), speed.parse::<f64>())
        else {
            return Reply::line("Error: Invalid numeric value in -ff_set");
        };
        let len = self.feedforward.len();
        let Some(entry) = self.feedforward.get_mut(i) else {
            return Reply::line(format!("Error: Index {i} out of bounds (0-{}).", len.saturating_sub(1)));
        };
        entry.temperature = t;
        entry.base_speed = s.clamp(0.0, 1.0);
        Reply::line(format!("FF table entry {i} updated: Temp={t:.1}C, Speed={s:.4}"))
    }

    fn fan_tune(&mut self, cmd: &Command) -> Reply {
        if cmd.args.is_empty() {
            return Reply::line_vec(self.fan_settings());
        }
        let pairs = match parse_pairs(&cmd.args) {
            Ok(p) => p,
            Err(e) => return Reply::line(e),
        };
        for (flag, v) in pairs {
            match flag {
                "-hys" => self.hysteresis_band = v.max(0.0),
                "-warmbias" => self.warming_bias = v,
                "-heatbias" => self.heating_bias = v,
                "-min" => self.fan_min = v.clamp(0.0, 1.0),
                "-max" => self.fan_max = v.clamp(0.0, 1.0),
                "-alpha" => self.fan_smooth_alpha = v.clamp(0.0, 1.0),
                other => return Reply::line(format!("Error: Unknown option {other}")),
            }
        }
        Reply {
            console: vec!["Fan parameters updated.".into()],
            send_status: true,
        }
    }
}

fn parse_pairs(args: &[String]) -> Result<Vec<(&str, f64)>, String> {
    if args.len() % 2 != 0 {
        return Err("Error: Expected option/value pairs.".into());
    }
    args.chunks(2)
        .map(|pair| {
            pair[1]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| (pair[0].as_str(), v))
                .ok_or(())
                .map_err(|_| format!("Error: Invalid value for {}: {}", pair[0], pair[1]))
        })
        .collect()
}

fn round(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

/// Handle to a running simulator thread.
pub struct SimulatorHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn join(self) {
        self.stop();
        let _ = self.thread.join();
    }
}

/// Run a simulated chamber on a background thread, emitting one status every
/// `interval` and answering commands from `commands`.
pub fn spawn_simulator(
    sink: TelemetrySink,
    commands: Receiver<Command>,
    interval: Duration,
) -> std::io::Result<SimulatorHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let thread = std::thread::Builder::new()
        .name("chamberscope-sim".into())
        .spawn(move || {
            info!(?interval, "demo chamber running");
            let mut sim = ChamberSim::default();
            let mut last = Instant::now();
            if sink.opened().is_err() {
                return;
            }
            while !stop_flag.load(Ordering::Relaxed) {
                while let Ok(cmd) = commands.try_recv() {
                    debug!(command = %cmd, "demo chamber received command");
                    let reply = sim.apply(&cmd);
                    if !reply.console.is_empty() {
                        let _ = sink.message(json!({ "console": reply.console }).to_string());
                    }
                    if reply.send_status {
                        let _ = sink.message(sim.status().to_string());
                    }
                }

                let now = Instant::now();
                sim.step(now.duration_since(last).as_secs_f64(), rand::random::<f64>);
                last = now;
                if sink.message(sim.status().to_string()).is_err() {
                    return;
                }
                std::thread::sleep(interval);
            }
            let _ = sink.closed();
        })?;
    Ok(SimulatorHandle { stop, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::snapshot::{Field, Snapshot};

    fn cmd(line: &str) -> Command {
        Command::parse(line).unwrap()
    }

    #[test]
    fn status_parses_as_snapshot() {
        let sim = ChamberSim::default();
        let snap = Snapshot::from_value(sim.status()).unwrap();
        assert_eq!(snap.target_temperature(), Some(37.0));
        assert_eq!(snap.text(Field::PtcState), Some("OFF"));
        assert!(snap.extra.contains_key("final_pwm_duty"));
    }

    #[test]
    fn heater_warms_cold_chamber() {
        let mut sim = ChamberSim::default();
        let start = sim.current_temperature;
        for _ in 0..20 {
            sim.step(0.5, || 0.5);
        }
        assert!(sim.current_temperature > start);
        assert_eq!(sim.control_state, "HEATING");
    }

    #[test]
    fn random_noise_keeps_humidity_in_bounds() {
        let mut sim = ChamberSim::default();
        for _ in 0..200 {
            sim.step(0.5, rand::random::<f64>);
            assert!((0.0..=100.0).contains(&sim.humidity));
            assert!(sim.current_temperature.is_finite());
        }
    }

    #[test]
    fn cooling_gains_reject_derivative() {
        let mut sim = ChamberSim::default();
        let reply = sim.apply(&cmd("pid_tune cool -p 0.2 -i 0.03"));
        assert!(reply.send_status);
        assert_eq!((sim.cool_kp, sim.cool_ki), (0.2, 0.03));
        let reply = sim.apply(&cmd("pid_tune cool -d 0.1"));
        assert!(reply.console[0].starts_with("Error"));
    }

    #[test]
    fn setpoint_reschedules_gains() {
        let mut sim = ChamberSim::default();
        sim.apply(&cmd("pid_tune -t 50"));
        assert_eq!(sim.target_temperature, 50.0);
        assert!((sim.kp - 0.08).abs() < 1e-12);
    }

    #[test]
    fn ff_set_and_fan_tune() {
        let mut sim = ChamberSim::default();
        sim.apply(&cmd("pid_tune -ff_set 2 42 0.35"));
        assert_eq!(
            sim.feedforward[2],
            FeedforwardEntry {
                temperature: 42.0,
                base_speed: 0.35
            }
        );
        assert!(sim.apply(&cmd("pid_tune -ff_set 9 1 1")).console[0].contains("out of bounds"));

        sim.apply(&cmd("fan_tune -hys 1.5 -alpha 2"));
        assert_eq!(sim.hysteresis_band, 1.5);
        assert_eq!(sim.fan_smooth_alpha, 1.0);
        assert_eq!(sim.apply(&cmd("fan_tune")).console.len(), 4);
    }

    #[test]
    fn interpolation_clamps_at_ends() {
        assert_eq!(scheduled_gains(0.0).0, 0.05);
        assert_eq!(scheduled_gains(100.0).0, 0.09);
        assert!((scheduled_gains(45.0).0 - 0.075).abs() < 1e-12);
    }
}
