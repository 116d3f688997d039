use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;

use crate::models::Rating;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap());

// "X/10" is scaled by ten, anything else keeps the leading number.
pub fn parse_rating_value(value: &str) -> f64 {
    let head = value.split('/').next().unwrap_or_default();
    let number = leading_number(head).unwrap_or(0.0);
    if value.contains("/10") && !value.contains("/100") {
        number * 10.0
    } else {
        number
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let m = LEADING_NUMBER.find(s)?;
    m.as_str().trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl RatingChart {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let (labels, values): (Vec<String>, Vec<f64>) = ratings
            .iter()
            .map(|r| (r.source.clone(), parse_rating_value(&r.value)))
            .unzip();
        Self { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn render(&self, width: usize) -> String {
        let scale = self.values.iter().copied().fold(100.0_f64, f64::max);
        let label_width = self.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut out = String::new();
        for (label, value) in self.labels.iter().zip(&self.values) {
            let cells = ((value.max(0.0) / scale) * width as f64).round() as usize;
            let _ = writeln!(
                out,
                "{label:<label_width$} | {} {value:.1}",
                "#".repeat(cells)
            );
        }
        out
    }
}
