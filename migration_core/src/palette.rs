//! Color Assigner - Deterministic per-individual colors
//!
//! Colors come from an in-process copy of the 10-color qualitative "tab10"
//! table, so output never depends on a plotting library's palette ordering.
//!
//! # Rule
//!
//! For `N` individuals and a palette of size `P`:
//! - `N <= P`: pick evenly spaced palette slots,
//!   `min(floor(i * P / (N - 1)), P - 1)` (slot 0 when `N == 1`)
//! - `N > P`: cycle, slot `i mod P`

use serde::{Deserialize, Serialize};

/// Bumped whenever the table or the picking rule changes.
pub const PALETTE_VERSION: &str = "tab10-v1";

/// The tab10 qualitative palette.
pub const TAB10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
    "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

/// A discrete palette of `#rrggbb` colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: &'static [&'static str],
}

impl Default for Palette {
    fn default() -> Self {
        Self::tab10()
    }
}

impl Palette {
    pub fn tab10() -> Self {
        Self { colors: &TAB10 }
    }

    /// Wraps a custom table. Returns `None` for an empty table.
    pub fn custom(colors: &'static [&'static str]) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Palette slot for the `i`-th of `n` individuals.
    pub fn slot(&self, i: usize, n: usize) -> usize {
        let p = self.colors.len();
        if n > p {
            i % p
        } else if n <= 1 {
            0
        } else {
            (i * p / (n - 1)).min(p - 1)
        }
    }

    /// Assigns a color to every id, in order.
    ///
    /// Duplicate ids keep the color of their first occurrence.
    pub fn assign<I, S>(&self, individual_ids: I) -> ColorAssignment
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in individual_ids {
            let id = id.as_ref();
            if !unique.iter().any(|u| u == id) {
                unique.push(id.to_string());
            }
        }

        let n = unique.len();
        let entries = unique
            .into_iter()
            .enumerate()
            .map(|(i, id)| ColorEntry {
                individual_id: id,
                color: self.colors[self.slot(i, n)].to_string(),
            })
            .collect();

        ColorAssignment {
            palette_version: PALETTE_VERSION.to_string(),
            entries,
        }
    }
}

/// One individual → color pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub individual_id: String,
    pub color: String,
}

/// Mapping from every individual in a dataset to exactly one color.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorAssignment {
    pub palette_version: String,
    pub entries: Vec<ColorEntry>,
}

impl ColorAssignment {
    pub fn color_of(&self, individual_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.individual_id == individual_id)
            .map(|e| e.color.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries restricted to the given ids, in assignment order.
    pub fn legend<'a>(&'a self, individual_ids: &[&str]) -> Vec<&'a ColorEntry> {
        self.entries
            .iter()
            .filter(|e| individual_ids.contains(&e.individual_id.as_str()))
            .collect()
    }
}

/// Assigns tab10 colors to `individual_ids`.
pub fn assign_colors<I, S>(individual_ids: I) -> ColorAssignment
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Palette::tab10().assign(individual_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("animal-{}", i)).collect()
    }

    #[test]
    fn test_single_individual_gets_first_color() {
        let colors = assign_colors(["solo"]);
        assert_eq!(colors.color_of("solo"), Some("#1f77b4"));
    }

    #[test]
    fn test_evenly_spaced_when_fits() {
        let colors = assign_colors(["a", "b", "c"]);
        assert_eq!(colors.color_of("a"), Some(TAB10[0]));
        assert_eq!(colors.color_of("b"), Some(TAB10[5]));
        assert_eq!(colors.color_of("c"), Some(TAB10[9]));
    }

    #[test]
    fn test_full_palette_all_distinct() {
        let colors = assign_colors(ids(10));
        let mut seen: Vec<&str> = colors.entries.iter().map(|e| e.color.as_str()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_cycles_past_palette_size() {
        let colors = assign_colors(ids(23));
        for i in 0..23 {
            let expected = TAB10[i % 10];
            assert_eq!(colors.color_of(&format!("animal-{}", i)), Some(expected));
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(assign_colors(ids(7)), assign_colors(ids(7)));
    }

    #[test]
    fn test_duplicates_collapse() {
        let colors = assign_colors(["a", "b", "a"]);
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn test_colors_are_hex() {
        for entry in assign_colors(ids(12)).entries {
            assert_eq!(entry.color.len(), 7);
            assert!(entry.color.starts_with('#'));
            assert!(entry.color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_legend_filters() {
        let colors = assign_colors(["a", "b", "c"]);
        let legend = colors.legend(&["c", "a"]);
        let names: Vec<&str> = legend.iter().map(|e| e.individual_id.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_custom_palette() {
        static TWO: [&str; 2] = ["#000000", "#ffffff"];
        let palette = Palette::custom(&TWO).unwrap();
        let colors = palette.assign(["a", "b", "c"]);
        assert_eq!(colors.color_of("c"), Some("#000000"));
        assert!(Palette::custom(&[]).is_none());
    }
}
