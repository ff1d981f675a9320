//! Terminal telemetry dashboard.
//!
//! Runs on its own thread, fed by the bounded telemetry channel: it renders
//! whatever frame arrives and simply misses the frames the audio thread
//! dropped while the terminal was busy.  Rendering therefore never
//! interacts with the real-time loop.
//!
//! Styling goes through the `colored` crate; the cursor addressing (home,
//! clear-to-end-of-line, hide/show) stays raw ANSI — the dashboard redraws
//! in place every frame, clearing each row's tail so shrinking values leave
//! no residue.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::mpsc::Receiver;

use colored::{Color, Colorize};

use crate::pipeline::TelemetrySnapshot;
use crate::protect::ProtectionZone;

/// Clear from the cursor to end of line.
const EOL: &str = "\x1b[K";

const BAR_WIDTH: usize = 30;

/// Hide the cursor and clear the screen before the first frame.
pub fn enter_dashboard() {
    print!("\x1b[2J\x1b[?25l");
    let _ = io::stdout().flush();
}

/// Restore the cursor when the dashboard exits.
pub fn leave_dashboard() {
    print!("\x1b[?25h");
    let _ = io::stdout().flush();
}

/// Render frames until the telemetry channel closes (pipeline shut down).
pub fn run(rx: Receiver<TelemetrySnapshot>) {
    while let Ok(snapshot) = rx.recv() {
        let frame = render(&snapshot);
        let mut stdout = io::stdout();
        let _ = stdout.write_all(frame.as_bytes());
        let _ = stdout.flush();
    }
    log::debug!("telemetry channel closed, renderer exiting");
}

/// Build one dashboard frame as a string (separated from I/O for tests).
pub fn render(s: &TelemetrySnapshot) -> String {
    let zone_color = zone_color(s.zone);
    let uplink = if s.is_speech {
        "UPLINK ACTIVE".green()
    } else {
        "UPLINK STANDBY".white()
    };

    let mut f = String::with_capacity(512);
    let _ = write!(f, "\x1b[H");
    let _ = writeln!(f, "{}{EOL}", "\nAUDIO PROTECTION SYSTEM".cyan().bold());
    let _ = writeln!(f, "{EOL}");

    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "ACOUSTIC LOAD:     ".white(),
        format!("{:05.1} dB SPL", s.spl_db).color(zone_color)
    );
    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "PROTECTION MODE:   ".white(),
        s.zone.label().color(zone_color)
    );
    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "EXPOSURE DOSE:     ".white(),
        format!("{:>6.2}% OSHA Capacity", s.dose_pct).color(dose_color(s.dose_pct))
    );
    let _ = writeln!(f, "{EOL}");

    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "SUPPRESSION:       ".white(),
        format!(
            "{:02}% Intensity",
            (s.suppression_intensity * 100.0).round() as u32
        )
        .magenta()
    );
    let _ = writeln!(f, "{}{uplink}{EOL}", "COMMS STATUS:      ".white());
    let _ = writeln!(f, "{EOL}");

    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "PEAK AMPLITUDE:    ".white(),
        format!("{:.4}", s.output_peak).cyan()
    );
    let _ = writeln!(
        f,
        "{}{}{EOL}",
        "SIGNAL ANALYZE:    ".white(),
        level_bar(s.rms, BAR_WIDTH).cyan()
    );
    let _ = writeln!(f, "{EOL}");

    let _ = writeln!(
        f,
        "{}{EOL}",
        format!(
            "LOST: {} relay / {} frames | CTRL+C TO TERMINATE",
            s.dropped_sends, s.dropped_renders
        )
        .dimmed()
    );
    f
}

/// Colour for the dose readout: green under 50 %, yellow under 85 %, red at
/// and past the danger band.
pub fn dose_color(dose_pct: f64) -> Color {
    if dose_pct < 50.0 {
        Color::Green
    } else if dose_pct < 85.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Colour matching the zone's severity.
pub fn zone_color(zone: ProtectionZone) -> Color {
    match zone {
        ProtectionZone::Transparency => Color::Green,
        ProtectionZone::ActiveReduction => Color::Yellow,
        ProtectionZone::CriticalProtection => Color::Red,
    }
}

/// Signal bar: RMS scaled so nominal speech fills a visible fraction.
pub fn level_bar(rms: f32, width: usize) -> String {
    let fill = ((rms * 15.0).clamp(0.0, 1.0) * width as f32) as usize;
    let mut bar = String::with_capacity(width * 3);
    for _ in 0..fill {
        bar.push('█');
    }
    for _ in fill..width {
        bar.push(' ');
    }
    bar
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            spl_db: 91.5,
            rms: 0.5,
            zone: ProtectionZone::CriticalProtection,
            suppression_intensity: 0.98,
            dose_pct: 12.34,
            is_speech: true,
            output_peak: 0.25,
            dropped_sends: 3,
            dropped_renders: 1,
        }
    }

    #[test]
    fn frame_carries_the_key_readouts() {
        let frame = render(&snapshot());
        assert!(frame.contains("091.5 dB SPL"));
        assert!(frame.contains("CRITICAL PROTECTION"));
        assert!(frame.contains("12.34% OSHA Capacity"));
        assert!(frame.contains("98% Intensity"));
        assert!(frame.contains("UPLINK ACTIVE"));
        assert!(frame.contains("0.2500"));
    }

    #[test]
    fn quiet_frame_shows_standby() {
        let mut s = snapshot();
        s.is_speech = false;
        assert!(render(&s).contains("UPLINK STANDBY"));
    }

    #[test]
    fn dose_colour_bands() {
        assert_eq!(dose_color(0.0), Color::Green);
        assert_eq!(dose_color(49.9), Color::Green);
        assert_eq!(dose_color(50.0), Color::Yellow);
        assert_eq!(dose_color(84.9), Color::Yellow);
        assert_eq!(dose_color(85.0), Color::Red);
        assert_eq!(dose_color(250.0), Color::Red);
    }

    #[test]
    fn zone_colours_match_severity() {
        assert_eq!(zone_color(ProtectionZone::Transparency), Color::Green);
        assert_eq!(zone_color(ProtectionZone::ActiveReduction), Color::Yellow);
        assert_eq!(zone_color(ProtectionZone::CriticalProtection), Color::Red);
    }

    #[test]
    fn level_bar_is_fixed_width() {
        for rms in [0.0_f32, 0.01, 0.05, 0.5, 10.0] {
            assert_eq!(level_bar(rms, 30).chars().count(), 30);
        }
    }

    #[test]
    fn level_bar_fill_grows_with_level() {
        let quiet = level_bar(0.01, 30).matches('█').count();
        let loud = level_bar(0.06, 30).matches('█').count();
        assert!(loud > quiet);
    }

    #[test]
    fn level_bar_saturates() {
        assert_eq!(level_bar(100.0, 30).matches('█').count(), 30);
    }
}
