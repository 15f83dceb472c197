use crate::board::Outcome;
use crate::error::LearnError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Sliding-window outcome rates, one entry per window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateCurves {
    pub agent_a: Vec<f64>,
    pub agent_b: Vec<f64>,
    pub draw: Vec<f64>,
}

impl RateCurves {
    pub fn len(&self) -> usize {
        self.agent_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agent_a.is_empty()
    }

    /// Writes the curves as JSON for an external charting tool.
    pub fn to_disk_json(&self, path: &Path) -> Result<(), LearnError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        log::info!("{:<32}{:<32}", "saving rate curves", path.display());
        Ok(())
    }
}

/// Window `i` covers games `[step * i, step * i + duration)`; only full windows are produced.
pub fn win_rates(
    record: &[Outcome],
    step: usize,
    duration: usize,
) -> Result<RateCurves, LearnError> {
    if step == 0 {
        return Err(LearnError::ZeroStep);
    }
    if duration == 0 {
        return Err(LearnError::ZeroDuration);
    }
    if duration > record.len() {
        return Err(LearnError::WindowTooLong {
            duration,
            total: record.len(),
        });
    }
    let num_windows = (record.len() - duration) / step + 1;
    let mut curves = RateCurves {
        agent_a: Vec::with_capacity(num_windows),
        agent_b: Vec::with_capacity(num_windows),
        draw: Vec::with_capacity(num_windows),
    };
    for i in 0..num_windows {
        let window = &record[step * i..step * i + duration];
        let counts = window.iter().copied().counts();
        let rate = |outcome: Outcome| {
            counts.get(&outcome).copied().unwrap_or(0) as f64 / duration as f64
        };
        curves.agent_a.push(rate(Outcome::AgentAWin));
        curves.agent_b.push(rate(Outcome::AgentBWin));
        curves.draw.push(rate(Outcome::Draw));
    }
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLE: [Outcome; 4] = [
        Outcome::AgentAWin,
        Outcome::AgentBWin,
        Outcome::Draw,
        Outcome::Draw,
    ];

    #[test]
    fn windows_over_thousand_games() {
        let record: Vec<Outcome> = CYCLE.iter().copied().cycle().take(1000).collect();
        let curves = win_rates(&record, 250, 500).unwrap();
        assert_eq!(curves.len(), 3);
        assert_eq!(curves.agent_b.len(), 3);
        assert_eq!(curves.draw.len(), 3);
        for i in 0..curves.len() {
            assert_eq!(curves.agent_a[i], 0.25);
            assert_eq!(curves.agent_b[i], 0.25);
            assert_eq!(curves.draw[i], 0.5);
            assert_eq!(curves.agent_a[i] + curves.agent_b[i] + curves.draw[i], 1.0);
        }
    }

    #[test]
    fn windows_follow_the_record() {
        let mut record = vec![Outcome::AgentAWin; 4];
        record.extend([Outcome::Draw; 4]);
        let curves = win_rates(&record, 2, 4).unwrap();
        assert_eq!(curves.agent_a, vec![1.0, 0.5, 0.0]);
        assert_eq!(curves.draw, vec![0.0, 0.5, 1.0]);
        assert_eq!(curves.agent_b, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn trailing_partial_window_is_dropped() {
        let record = vec![Outcome::AgentBWin; 10];
        let curves = win_rates(&record, 3, 4).unwrap();
        assert_eq!(curves.len(), 3);
    }

    #[test]
    fn rejects_bad_windows() {
        let record = vec![Outcome::Draw; 10];
        assert!(matches!(
            win_rates(&record, 1, 11),
            Err(LearnError::WindowTooLong { duration: 11, total: 10 })
        ));
        assert!(matches!(win_rates(&record, 0, 5), Err(LearnError::ZeroStep)));
        assert!(matches!(win_rates(&record, 5, 0), Err(LearnError::ZeroDuration)));
        assert!(win_rates(&[], 1, 1).is_err());
    }
}
